// Strata - Secure Document Structure Extraction
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Token dispatch engine and data model for Strata.
//!
//! A tokenizer produces a flat, materialized stream of [`Token`]s with
//! explicit [`Nesting`]. The [`DispatchEngine`] walks that stream exactly
//! once, maintaining a stack of open ancestors, and routes each token to the
//! [`Collector`]s whose [`Interest`] matches it. Candidate lookup goes
//! through a precomputed [`Registry`], so the cost per token depends on the
//! number of interested collectors rather than the number registered.
//!
//! Collectors are isolated from each other: an error or a panic in one is
//! captured as a [`CollectorError`] and never prevents the others from
//! seeing the remaining tokens.
//!
//! Security limits live in [`SecurityProfile`]; findings raised by the
//! security layer are [`Finding`]s.

mod collector;
mod context;
pub mod dispatch;
mod error;
mod finding;
mod profile;
mod registry;
mod token;
mod tokenize;

pub use collector::{Collector, ExtractedReference, Fragment, Interest, TokenPredicate};
pub use context::{DispatchContext, RAW_MARKUP_KINDS};
pub use dispatch::{
    AbortReason, DispatchEngine, DispatchOutcome, FinalizeOutcome, NoInspection, TokenInspector,
    DEFAULT_DEADLINE_CHECK_INTERVAL,
};
pub use error::{
    CollectorError, CollectorFailure, CollectorPhase, CollectorResult, ProfileError,
    ProfileResult, RegistryError, RegistryResult,
};
pub use finding::{Finding, FindingCategory, FindingLocation, Severity};
pub use profile::{
    BlockPolicy, Feature, ProfileName, SecurityProfile, DEFAULT_ALLOWED_SCHEMES,
};
pub use registry::Registry;
pub use token::{LineSpan, Nesting, Token};
pub use tokenize::{TokenizeError, Tokenizer};
