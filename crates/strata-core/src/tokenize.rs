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

//! Tokenizer boundary.
//!
//! Strata ships no markup grammar. Callers plug in a [`Tokenizer`] that turns
//! admitted text into a flat, balanced token stream.

use crate::token::Token;
use thiserror::Error;

/// Failure reported by a tokenizer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("tokenizer failed: {0}")]
    Failed(String),

    #[error("tokenizer failed at line {line}: {message}")]
    AtLine { line: usize, message: String },
}

impl TokenizeError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Converts admitted text into a token stream.
///
/// The stream must be balanced: every `Open` token is matched by a later
/// `Close` of the same kind, properly nested. Streams that break this are
/// aborted during dispatch.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Result<Vec<Token>, TokenizeError>,
{
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        self(text)
    }
}
