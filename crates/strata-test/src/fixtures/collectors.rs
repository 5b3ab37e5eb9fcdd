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

//! Collector fixtures.
//!
//! Collectors are moved into the parse as boxed trait objects, so the
//! fixtures report through shared logs the test keeps a handle to.

use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use strata_core::{
    Collector, CollectorFailure, CollectorResult, DispatchContext, Fragment, Interest, Nesting,
    Token,
};

/// One `on_token` call as seen by a [`RecordingCollector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub collector: String,
    pub index: usize,
    pub kind: String,
    pub nesting: Nesting,
    pub ancestors: Vec<String>,
}

pub type VisitLog = Arc<Mutex<Vec<Visit>>>;

/// Names of collectors in the order their `finalize` ran.
pub type FinalizeLog = Arc<Mutex<Vec<String>>>;

fn lock<T>(log: &Arc<Mutex<Vec<T>>>) -> std::sync::MutexGuard<'_, Vec<T>> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Records every token it receives together with the ancestor stack.
///
/// Its fragment is `{"visits": <count>}` for the current parse.
#[derive(Debug)]
pub struct RecordingCollector {
    name: String,
    interest: Interest,
    visits: VisitLog,
    finalized: Option<FinalizeLog>,
    count: usize,
}

impl RecordingCollector {
    pub fn new(name: &str, interest: Interest) -> Self {
        Self {
            name: name.to_string(),
            interest,
            visits: Arc::default(),
            finalized: None,
            count: 0,
        }
    }

    /// Wildcard recorder.
    pub fn any(name: &str) -> Self {
        Self::new(name, Interest::any())
    }

    /// Share a visit log with other recorders.
    pub fn with_visit_log(mut self, log: &VisitLog) -> Self {
        self.visits = Arc::clone(log);
        self
    }

    /// Append this collector's name to `log` when finalized.
    pub fn with_finalize_log(mut self, log: &FinalizeLog) -> Self {
        self.finalized = Some(Arc::clone(log));
        self
    }

    pub fn visits(&self) -> VisitLog {
        Arc::clone(&self.visits)
    }

    pub fn boxed(self) -> Box<dyn Collector> {
        Box::new(self)
    }
}

impl Collector for RecordingCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn reset(&mut self) {
        self.count = 0;
    }

    fn on_token(
        &mut self,
        index: usize,
        token: &Token,
        ctx: &DispatchContext<'_>,
    ) -> CollectorResult<()> {
        self.count += 1;
        lock(&self.visits).push(Visit {
            collector: self.name.clone(),
            index,
            kind: token.kind.clone(),
            nesting: token.nesting,
            ancestors: ctx.ancestors().to_vec(),
        });
        Ok(())
    }

    fn finalize(&mut self) -> CollectorResult<Fragment> {
        if let Some(log) = &self.finalized {
            lock(log).push(self.name.clone());
        }
        Ok(Fragment::new(json!({ "visits": self.count })))
    }
}

/// Returns an error for selected token indices and optionally on finalize.
#[derive(Debug)]
pub struct FailingCollector {
    name: String,
    interest: Interest,
    fail_at: BTreeSet<usize>,
    fail_finalize: bool,
}

impl FailingCollector {
    pub fn new(name: &str, fail_at: impl IntoIterator<Item = usize>) -> Self {
        Self {
            name: name.to_string(),
            interest: Interest::any(),
            fail_at: fail_at.into_iter().collect(),
            fail_finalize: false,
        }
    }

    pub fn failing_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    pub fn boxed(self) -> Box<dyn Collector> {
        Box::new(self)
    }
}

impl Collector for FailingCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn on_token(&mut self, index: usize, token: &Token, _: &DispatchContext<'_>) -> CollectorResult<()> {
        if self.fail_at.contains(&index) {
            return Err(CollectorFailure::UnexpectedToken {
                kind: token.kind.clone(),
                index,
            });
        }
        Ok(())
    }

    fn finalize(&mut self) -> CollectorResult<Fragment> {
        if self.fail_finalize {
            return Err(CollectorFailure::msg("finalize refused"));
        }
        Ok(Fragment::new(json!(null)))
    }
}

/// Panics at one token index, or in finalize.
#[derive(Debug)]
pub struct PanickingCollector {
    name: String,
    interest: Interest,
    panic_at: Option<usize>,
}

impl PanickingCollector {
    /// Panic when token `index` is dispatched.
    pub fn at(name: &str, index: usize) -> Self {
        Self {
            name: name.to_string(),
            interest: Interest::any(),
            panic_at: Some(index),
        }
    }

    /// Panic in finalize only.
    pub fn in_finalize(name: &str) -> Self {
        Self {
            name: name.to_string(),
            interest: Interest::any(),
            panic_at: None,
        }
    }

    pub fn boxed(self) -> Box<dyn Collector> {
        Box::new(self)
    }
}

impl Collector for PanickingCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn on_token(&mut self, index: usize, _: &Token, _: &DispatchContext<'_>) -> CollectorResult<()> {
        if self.panic_at == Some(index) {
            panic!("{} exploded at token {}", self.name, index);
        }
        Ok(())
    }

    fn finalize(&mut self) -> CollectorResult<Fragment> {
        if self.panic_at.is_none() {
            panic!("{} exploded in finalize", self.name);
        }
        Ok(Fragment::new(json!(null)))
    }
}
