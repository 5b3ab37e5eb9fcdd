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

//! Collector registry.
//!
//! The registry indexes an ordered collector list by token kind and tag so
//! the dispatch engine can resolve the interested collectors for a token
//! without consulting every collector. It stores only names and interests,
//! never collector state, so a built registry is immutable and can be shared
//! (`Arc<Registry>`) across concurrent parses that use the same collector set.

use crate::collector::{Collector, Interest};
use crate::error::{RegistryError, RegistryResult};
use crate::token::Token;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    interest: Interest,
}

/// Immutable index from token kind/tag to collector positions.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<Entry>,
    by_type: HashMap<String, Vec<usize>>,
    by_tag: HashMap<String, Vec<usize>>,
    catch_all: Vec<usize>,
}

impl Registry {
    /// Build a registry from collectors in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyName`] or
    /// [`RegistryError::DuplicateName`] when names are not unique, since
    /// collector names key the result structure.
    pub fn build(collectors: &[Box<dyn Collector>]) -> RegistryResult<Self> {
        let mut registry = Registry::default();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for (position, collector) in collectors.iter().enumerate() {
            let name = collector.name();
            if name.is_empty() {
                return Err(RegistryError::EmptyName { position });
            }
            if let Some(&first) = seen.get(name) {
                return Err(RegistryError::DuplicateName {
                    name: name.to_string(),
                    first,
                    second: position,
                });
            }
            seen.insert(name, position);

            let interest = collector.interest().clone();
            if interest.is_wildcard() {
                registry.catch_all.push(position);
            } else {
                for kind in &interest.types {
                    registry.by_type.entry(kind.clone()).or_default().push(position);
                }
                for tag in &interest.tags {
                    registry.by_tag.entry(tag.clone()).or_default().push(position);
                }
            }

            registry.entries.push(Entry {
                name: name.to_string(),
                interest,
            });
        }

        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collector names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn name(&self, position: usize) -> Option<&str> {
        self.entries.get(position).map(|e| e.name.as_str())
    }

    pub fn interest(&self, position: usize) -> Option<&Interest> {
        self.entries.get(position).map(|e| &e.interest)
    }

    /// Positions of the collectors interested in `token`, in registration
    /// order and without duplicates: `bucket[kind] ∪ bucket[tag] ∪ catch-all`.
    ///
    /// `out` is cleared first so the engine can reuse one buffer per parse.
    pub fn candidates_into(&self, token: &Token, out: &mut Vec<usize>) {
        out.clear();
        if let Some(bucket) = self.by_type.get(&token.kind) {
            out.extend_from_slice(bucket);
        }
        if let Some(bucket) = token.tag.as_ref().and_then(|tag| self.by_tag.get(tag)) {
            out.extend_from_slice(bucket);
        }
        out.extend_from_slice(&self.catch_all);
        out.sort_unstable();
        out.dedup();
    }

    pub fn candidates(&self, token: &Token) -> Vec<usize> {
        let mut out = Vec::new();
        self.candidates_into(token, &mut out);
        out
    }

    /// Check that this registry was built from a collector list with the
    /// same names in the same order.
    pub fn verify(&self, collectors: &[Box<dyn Collector>]) -> RegistryResult<()> {
        let same = self.entries.len() == collectors.len()
            && self
                .entries
                .iter()
                .zip(collectors)
                .all(|(entry, collector)| entry.name == collector.name());
        if same {
            Ok(())
        } else {
            Err(RegistryError::Mismatch {
                expected: self.names().map(str::to_string).collect(),
                actual: collectors.iter().map(|c| c.name().to_string()).collect(),
            })
        }
    }
}
