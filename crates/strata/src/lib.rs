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

//! Strata: single-pass, security-hardened document structure extraction.
//!
//! Strata takes untrusted markdown-like content, a [`Tokenizer`] and a list
//! of [`Collector`]s, and produces one [`ParseResult`]:
//!
//! 1. The **gate** checks raw size, line count and encoding against the
//!    [`SecurityProfile`]. Failing content is `Rejected` before the
//!    tokenizer ever runs.
//! 2. The admitted text is scanned for **injection** patterns.
//! 3. The **dispatch engine** walks the token stream once, routing each
//!    token to interested collectors with failure isolation, while runtime
//!    checks look for bidi controls, invisible characters, confusables and
//!    disallowed features.
//! 4. Collectors are **finalized** in registration order, extracted
//!    references are validated against the scheme allow-list, and the
//!    profile's block policy decides `blocked`.
//!
//! # Example
//!
//! ```
//! use strata::{parse, Collector, ParseOptions, ParseStatus, Token, TokenizeError};
//!
//! fn tokenize(text: &str) -> Result<Vec<Token>, TokenizeError> {
//!     Ok(text
//!         .lines()
//!         .enumerate()
//!         .flat_map(|(i, line)| {
//!             [
//!                 Token::open("paragraph").with_lines(i, i + 1),
//!                 Token::text(line).with_lines(i, i + 1),
//!                 Token::close("paragraph").with_lines(i, i + 1),
//!             ]
//!         })
//!         .collect())
//! }
//!
//! let mut collectors: Vec<Box<dyn Collector>> = Vec::new();
//! let result = parse("one\ntwo\n", &tokenize, &mut collectors, &ParseOptions::default()).unwrap();
//!
//! assert_eq!(result.status, ParseStatus::Completed);
//! assert_eq!(result.diagnostics.tokens_visited, 6);
//! assert!(!result.is_blocked());
//! ```

mod assembler;
mod error;
mod pipeline;

pub use assembler::{Diagnostics, ParseResult, ParseStatus, SecuritySummary, Structure};
pub use error::{StrataError, StrataResult};
pub use pipeline::{parse, parse_with_registry, ParseOptions, ParseOptionsBuilder, ParseStage};

pub use strata_core::{
    AbortReason, BlockPolicy, Collector, CollectorError, CollectorFailure, CollectorPhase,
    CollectorResult, DispatchContext, ExtractedReference, Feature, Finding, FindingCategory,
    FindingLocation, Fragment, Interest, LineSpan, Nesting, ProfileError, ProfileName, Registry,
    RegistryError, SecurityProfile, Severity, Token, TokenizeError, Tokenizer,
};

/// Re-exported for custom pipelines.
pub use strata_core as core;
pub use strata_security as security;
