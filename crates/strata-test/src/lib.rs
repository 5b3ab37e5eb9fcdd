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

//! Shared test fixtures and utilities for Strata.
//!
//! # Quick Start
//!
//! ```rust
//! use strata_test::fixtures::{self, builders::TokenStreamBuilder, SpyTokenizer};
//! use strata_core::Tokenizer;
//!
//! // Canonical stream
//! let (source, tokens) = fixtures::two_headings();
//!
//! // Custom stream
//! let tokens = TokenStreamBuilder::new()
//!     .open("blockquote")
//!     .open("paragraph")
//!     .text("quoted")
//!     .build();
//! assert_eq!(tokens.len(), 5);
//!
//! // Tokenizer that counts its invocations
//! let spy = SpyTokenizer::new(tokens);
//! spy.tokenize("anything").unwrap();
//! assert_eq!(spy.calls(), 1);
//! ```

pub mod fixtures;

pub use fixtures::builders::TokenStreamBuilder;
pub use fixtures::collectors::{
    FailingCollector, FinalizeLog, PanickingCollector, RecordingCollector, Visit, VisitLog,
};
pub use fixtures::tokenizers::{FailingTokenizer, FixedTokenizer, LineTokenizer, SpyTokenizer};

/// Names of the fragments in a `structure` map, in map order.
pub fn fragment_names(structure: &std::collections::BTreeMap<String, serde_json::Value>) -> Vec<&str> {
    structure.keys().map(String::as_str).collect()
}
