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

//! Per-token runtime checks run during dispatch.

use crate::unicode;
use strata_core::{
    DispatchContext, Feature, Finding, FindingCategory, FindingLocation, Severity, Token,
    TokenInspector,
};

/// Feature a token kind belongs to, if it is gated.
pub fn feature_of(kind: &str) -> Option<Feature> {
    match kind {
        "html_block" | "html_inline" => Some(Feature::RawHtml),
        "image" => Some(Feature::Images),
        "table" => Some(Feature::Tables),
        k if k.starts_with("footnote") => Some(Feature::Footnotes),
        _ => None,
    }
}

/// [`TokenInspector`] reporting disallowed features and suspicious
/// characters in inline content.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeInspector {
    scan_characters: bool,
}

impl Default for RuntimeInspector {
    fn default() -> Self {
        Self {
            scan_characters: true,
        }
    }
}

impl RuntimeInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable bidi/invisible/confusable scanning.
    pub fn with_character_scan(mut self, enabled: bool) -> Self {
        self.scan_characters = enabled;
        self
    }
}

impl TokenInspector for RuntimeInspector {
    fn inspect(
        &self,
        index: usize,
        token: &Token,
        ctx: &DispatchContext<'_>,
        findings: &mut Vec<Finding>,
    ) {
        let location = FindingLocation::Token {
            index,
            line: token.line(),
        };

        if !token.is_close() {
            if let Some(feature) = feature_of(&token.kind) {
                if !ctx.profile().allows(feature) {
                    let severity = match feature {
                        Feature::RawHtml => Severity::High,
                        _ => Severity::Medium,
                    };
                    findings.push(
                        Finding::new(
                            FindingCategory::DisallowedFeature,
                            severity,
                            location.clone(),
                            format!("'{}' is not allowed by profile '{}'", token.kind, ctx.profile().name),
                        )
                        .with_rule(format!("feature.{}", token.kind)),
                    );
                }
            }
        }

        if self.scan_characters {
            if let Some(content) = &token.content {
                unicode::scan_text(content, &location, findings);
            }
        }
    }
}
