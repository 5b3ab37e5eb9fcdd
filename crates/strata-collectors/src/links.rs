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

//! Link and image reference collector.

use serde::{Deserialize, Serialize};
use strata_core::{
    Collector, CollectorResult, DispatchContext, ExtractedReference, Fragment, Interest, Token,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Link,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub kind: LinkKind,
    pub href: String,
    /// Link text, or the image's alt text.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

/// Collects link targets (`href`) and image sources (`src`).
///
/// Every target is reported as an [`ExtractedReference`] so scheme policy can
/// validate and neutralize it after finalize.
#[derive(Debug)]
pub struct LinksCollector {
    interest: Interest,
    links: Vec<Link>,
}

impl Default for LinksCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl LinksCollector {
    pub const NAME: &'static str = "links";

    pub fn new() -> Self {
        Self {
            interest: Interest::types(["link", "image"]),
            links: Vec::new(),
        }
    }
}

impl Collector for LinksCollector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn reset(&mut self) {
        self.links.clear();
    }

    fn should_process(&self, token: &Token, _ctx: &DispatchContext<'_>) -> bool {
        !token.is_close()
    }

    fn on_token(
        &mut self,
        index: usize,
        token: &Token,
        ctx: &DispatchContext<'_>,
    ) -> CollectorResult<()> {
        let (kind, target) = match token.kind.as_str() {
            "image" => (LinkKind::Image, token.attr("src")),
            _ => (LinkKind::Link, token.attr("href")),
        };
        // Targetless links carry nothing to validate.
        let Some(href) = target else {
            return Ok(());
        };
        self.links.push(Link {
            kind,
            href: href.to_string(),
            text: ctx.text_of(index),
            line: token.line(),
        });
        Ok(())
    }

    fn finalize(&mut self) -> CollectorResult<Fragment> {
        let references = self.links.iter().enumerate().map(|(i, link)| {
            ExtractedReference::new(link.href.clone(), format!("/{}/href", i)).at_line(link.line)
        });
        Ok(Fragment::from_serialize(&self.links)?.with_references(references))
    }
}
