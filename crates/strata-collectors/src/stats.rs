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

//! Token statistics collector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strata_core::{
    Collector, CollectorResult, DispatchContext, Fragment, Interest, Nesting, Token,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    pub total_tokens: usize,
    /// Openers and leaves per kind. Closers are not counted.
    pub by_kind: BTreeMap<String, usize>,
    pub max_depth: usize,
    pub line_count: usize,
}

/// Wildcard collector summarizing the token stream.
#[derive(Debug)]
pub struct StatsCollector {
    interest: Interest,
    stats: TokenStats,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsCollector {
    pub const NAME: &'static str = "stats";

    pub fn new() -> Self {
        Self {
            interest: Interest::any(),
            stats: TokenStats::default(),
        }
    }
}

impl Collector for StatsCollector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn reset(&mut self) {
        self.stats = TokenStats::default();
    }

    fn on_token(
        &mut self,
        _index: usize,
        token: &Token,
        ctx: &DispatchContext<'_>,
    ) -> CollectorResult<()> {
        let stats = &mut self.stats;
        if stats.total_tokens == 0 {
            stats.line_count = ctx.line_count();
        }
        stats.total_tokens += 1;

        match token.nesting {
            Nesting::Open => {
                stats.max_depth = stats.max_depth.max(ctx.depth() + 1);
                *stats.by_kind.entry(token.kind.clone()).or_default() += 1;
            }
            Nesting::SelfClosing => {
                *stats.by_kind.entry(token.kind.clone()).or_default() += 1;
            }
            Nesting::Close => {}
        }
        Ok(())
    }

    fn finalize(&mut self) -> CollectorResult<Fragment> {
        Fragment::from_serialize(&self.stats)
    }
}
