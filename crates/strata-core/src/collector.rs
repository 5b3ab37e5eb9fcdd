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

//! Collector contract.
//!
//! A collector is a pluggable extraction unit. It declares which tokens it
//! cares about through an [`Interest`], receives matching tokens from the
//! dispatch engine through [`Collector::on_token`], and produces one
//! [`Fragment`] from [`Collector::finalize`] when the parse completes.
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Collector, CollectorResult, DispatchContext, Fragment, Interest, Token};
//!
//! struct CodeBlockCounter {
//!     interest: Interest,
//!     count: usize,
//! }
//!
//! impl Collector for CodeBlockCounter {
//!     fn name(&self) -> &str { "code_blocks" }
//!     fn interest(&self) -> &Interest { &self.interest }
//!     fn reset(&mut self) { self.count = 0; }
//!
//!     fn on_token(&mut self, _index: usize, _token: &Token, _ctx: &DispatchContext<'_>) -> CollectorResult<()> {
//!         self.count += 1;
//!         Ok(())
//!     }
//!
//!     fn finalize(&mut self) -> CollectorResult<Fragment> {
//!         Fragment::from_serialize(&self.count)
//!     }
//! }
//!
//! let collector = CodeBlockCounter { interest: Interest::types(["fence"]), count: 0 };
//! assert_eq!(collector.name(), "code_blocks");
//! ```

use crate::context::DispatchContext;
use crate::error::CollectorResult;
use crate::token::Token;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Custom token test attached to an [`Interest`].
pub type TokenPredicate = Arc<dyn Fn(&Token) -> bool + Send + Sync>;

/// Declarative filter describing which tokens a collector receives.
///
/// An interest with no types and no tags is a wildcard: the collector is
/// consulted for every token.
#[derive(Clone, Default)]
pub struct Interest {
    /// Token kinds of interest.
    pub types: BTreeSet<String>,
    /// Tag names of interest.
    pub tags: BTreeSet<String>,
    /// Ancestor kinds that suppress matching.
    pub ignore_inside: BTreeSet<String>,
    predicate: Option<TokenPredicate>,
}

impl Interest {
    /// Wildcard interest.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().with_types(types)
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().with_tags(tags)
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn ignoring<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_inside.extend(kinds.into_iter().map(Into::into));
        self
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Token) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.types.is_empty() && self.tags.is_empty()
    }

    /// Whether any of `ancestors` is an ignored scope.
    pub fn suppressed_by<S: AsRef<str>>(&self, ancestors: &[S]) -> bool {
        !self.ignore_inside.is_empty()
            && ancestors
                .iter()
                .any(|kind| self.ignore_inside.contains(kind.as_ref()))
    }

    /// Run the custom predicate (true when none is set).
    pub fn accepts(&self, token: &Token) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(token))
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interest")
            .field("types", &self.types)
            .field("tags", &self.tags)
            .field("ignore_inside", &self.ignore_inside)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A reference value extracted by a collector (link target, image source).
///
/// `pointer` is a JSON pointer into the collector's fragment value locating
/// the string, so policy can neutralize it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedReference {
    pub value: String,
    pub pointer: String,
    pub line: Option<usize>,
}

impl ExtractedReference {
    pub fn new(value: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            pointer: pointer.into(),
            line: None,
        }
    }

    pub fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }
}

/// The finalized output of one collector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    value: Value,
    references: Vec<ExtractedReference>,
}

impl Fragment {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            references: Vec::new(),
        }
    }

    /// Serialize a typed fragment into its open representation.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> CollectorResult<Self> {
        Ok(Self::new(serde_json::to_value(data)?))
    }

    pub fn with_reference(mut self, reference: ExtractedReference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_references(mut self, references: impl IntoIterator<Item = ExtractedReference>) -> Self {
        self.references.extend(references);
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn references(&self) -> &[ExtractedReference] {
        &self.references
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// A pluggable extraction unit.
///
/// Instances may be reused across parses; the engine calls
/// [`reset`](Collector::reset) at the start of every dispatch so no
/// accumulator state leaks from one parse into the next.
pub trait Collector: Send {
    /// Unique name; the key of this collector's fragment in the result.
    fn name(&self) -> &str;

    fn interest(&self) -> &Interest;

    /// Clear per-parse state. Called once before the first token.
    fn reset(&mut self) {}

    /// Fine-grained filter evaluated after interest matching.
    fn should_process(&self, _token: &Token, _ctx: &DispatchContext<'_>) -> bool {
        true
    }

    fn on_token(
        &mut self,
        index: usize,
        token: &Token,
        ctx: &DispatchContext<'_>,
    ) -> CollectorResult<()>;

    /// Produce the fragment. Called at most once per parse.
    fn finalize(&mut self) -> CollectorResult<Fragment>;
}
