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

//! Heading outline collector.

use serde::{Deserialize, Serialize};
use strata_core::{
    Collector, CollectorFailure, CollectorResult, DispatchContext, Fragment, Interest, Token,
};

/// One heading in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    /// URL-fragment style slug of `text`.
    pub anchor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

/// Collects `heading` scopes as `{level, text, anchor, line}` entries.
///
/// The level comes from the `h1`..`h6` tag, or a `level` attribute when the
/// tokenizer sets no tag.
#[derive(Debug)]
pub struct HeadingsCollector {
    interest: Interest,
    headings: Vec<Heading>,
}

impl Default for HeadingsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadingsCollector {
    pub const NAME: &'static str = "headings";

    pub fn new() -> Self {
        Self {
            interest: Interest::types(["heading"]),
            headings: Vec::new(),
        }
    }

    /// Skip headings nested inside the given scopes (e.g. `blockquote`).
    pub fn ignoring<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interest = self.interest.ignoring(kinds);
        self
    }
}

fn heading_level(token: &Token) -> Option<u8> {
    let raw = match token.tag.as_deref() {
        Some(tag) => tag.strip_prefix('h')?,
        None => token.attr("level")?,
    };
    raw.parse::<u8>().ok().filter(|level| (1..=6).contains(level))
}

/// Lowercase slug: alphanumerics kept, runs of anything else become `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

impl Collector for HeadingsCollector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn reset(&mut self) {
        self.headings.clear();
    }

    fn should_process(&self, token: &Token, _ctx: &DispatchContext<'_>) -> bool {
        token.is_open()
    }

    fn on_token(
        &mut self,
        index: usize,
        token: &Token,
        ctx: &DispatchContext<'_>,
    ) -> CollectorResult<()> {
        let level = heading_level(token).ok_or_else(|| {
            CollectorFailure::msg(format!(
                "heading at index {} has no level (tag {:?})",
                index, token.tag
            ))
        })?;
        let text = ctx.text_of(index).trim().to_string();
        self.headings.push(Heading {
            level,
            anchor: slugify(&text),
            text,
            line: token.line(),
        });
        Ok(())
    }

    fn finalize(&mut self) -> CollectorResult<Fragment> {
        Fragment::from_serialize(&self.headings)
    }
}
