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

//! Security layer for Strata.
//!
//! - [`gate`]: size, line-count and encoding checks on raw bytes, run before
//!   tokenization.
//! - [`injection`]: versioned injection patterns scanned over bounded
//!   windows of the admitted text.
//! - [`unicode`] and [`inspector`]: per-token bidi, invisible-character,
//!   confusable and feature checks run during dispatch.
//! - [`scheme`] and [`policy`]: reference validation over finalized
//!   fragments, link neutralization and the final blocking decision.
//!
//! Every scanner is a pure function of its input and the profile.

pub mod gate;
pub mod injection;
pub mod inspector;
pub mod policy;
pub mod scheme;
pub mod unicode;

pub use gate::{admit, count_lines, validate, GateReport};
pub use injection::{scan_injection, InjectionPattern, PatternSet, PATTERN_SET_VERSION};
pub use inspector::{feature_of, RuntimeInspector};
pub use policy::{apply_reference_policy, is_blocked, neutralize};
pub use scheme::{check_reference, extract_scheme, MAX_SCHEME_LEN};
