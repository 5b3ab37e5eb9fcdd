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

//! Security profiles for Strata parsing.
//!
//! A profile bundles the resource thresholds enforced by the gate and the
//! dispatch engine with the trust policy applied to findings. Profiles are
//! plain data: select a preset, override individual thresholds with the
//! `with_*` builders, then [`validate`](SecurityProfile::validate) before use.

use crate::error::{ProfileError, ProfileResult};
use crate::finding::{Finding, FindingCategory, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Preset profile names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileName {
    Strict,
    Moderate,
    Permissive,
}

impl ProfileName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Permissive => "permissive",
        }
    }

    /// Build the preset profile for this name.
    pub fn profile(self) -> SecurityProfile {
        match self {
            Self::Strict => SecurityProfile::strict(),
            Self::Moderate => SecurityProfile::moderate(),
            Self::Permissive => SecurityProfile::permissive(),
        }
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileName {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "moderate" => Ok(Self::Moderate),
            "permissive" => Ok(Self::Permissive),
            other => Err(ProfileError::UnknownProfile(other.to_string())),
        }
    }
}

/// Optional document features a profile may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Raw HTML blocks and inline HTML.
    RawHtml,
    /// `data:` references.
    DataUri,
    Images,
    Tables,
    Footnotes,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::RawHtml,
        Feature::DataUri,
        Feature::Images,
        Feature::Tables,
        Feature::Footnotes,
    ];
}

/// Decides which findings block a result.
///
/// A finding blocks when its severity is at least `threshold` and its
/// category is in `categories` (all categories when `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPolicy {
    pub threshold: Severity,
    pub categories: Option<BTreeSet<FindingCategory>>,
}

impl BlockPolicy {
    /// Block every finding at or above `threshold`.
    pub fn at(threshold: Severity) -> Self {
        Self {
            threshold,
            categories: None,
        }
    }

    /// Restrict blocking to the given categories.
    pub fn only(mut self, categories: impl IntoIterator<Item = FindingCategory>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    pub fn blocks(&self, finding: &Finding) -> bool {
        finding.severity() >= self.threshold
            && self
                .categories
                .as_ref()
                .map_or(true, |set| set.contains(&finding.category()))
    }
}

/// Schemes every preset allows for extracted references.
pub const DEFAULT_ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

/// Resource thresholds and trust policy for a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityProfile {
    /// Name reported in results as `profile_used`.
    pub name: String,
    /// Maximum raw content size in bytes.
    pub max_content_bytes: usize,
    /// Maximum number of source lines.
    pub max_line_count: usize,
    /// Maximum ancestor stack depth during dispatch.
    pub max_recursion_depth: usize,
    /// Maximum number of tokens accepted from the tokenizer.
    pub max_token_count: usize,
    pub allowed_features: BTreeSet<Feature>,
    /// Lowercase schemes allowed for extracted references.
    pub allowed_schemes: BTreeSet<String>,
    pub block_policy: BlockPolicy,
    /// Replace disallowed reference values inside fragments.
    pub neutralize_links: bool,
}

impl Default for SecurityProfile {
    fn default() -> Self {
        Self::moderate()
    }
}

fn schemes() -> BTreeSet<String> {
    DEFAULT_ALLOWED_SCHEMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl SecurityProfile {
    /// Untrusted input: small documents, shallow nesting, no raw HTML.
    pub fn strict() -> Self {
        Self {
            name: ProfileName::Strict.to_string(),
            max_content_bytes: 100 * 1024,      // 100KB
            max_line_count: 2_000,
            max_recursion_depth: 32,
            max_token_count: 50_000,
            allowed_features: [Feature::Tables, Feature::Footnotes].into_iter().collect(),
            allowed_schemes: schemes(),
            block_policy: BlockPolicy::at(Severity::High),
            neutralize_links: true,
        }
    }

    /// General-purpose default.
    pub fn moderate() -> Self {
        Self {
            name: ProfileName::Moderate.to_string(),
            max_content_bytes: 1024 * 1024,     // 1MB
            max_line_count: 10_000,
            max_recursion_depth: 64,
            max_token_count: 200_000,
            allowed_features: [Feature::Images, Feature::Tables, Feature::Footnotes]
                .into_iter()
                .collect(),
            allowed_schemes: schemes(),
            block_policy: BlockPolicy::at(Severity::High).only([
                FindingCategory::Injection,
                FindingCategory::DisallowedScheme,
                FindingCategory::BidiControl,
            ]),
            neutralize_links: true,
        }
    }

    /// Trusted input: large documents, every feature enabled.
    pub fn permissive() -> Self {
        Self {
            name: ProfileName::Permissive.to_string(),
            max_content_bytes: 10 * 1024 * 1024, // 10MB
            max_line_count: 50_000,
            max_recursion_depth: 128,
            max_token_count: 1_000_000,
            allowed_features: Feature::ALL.into_iter().collect(),
            allowed_schemes: schemes(),
            block_policy: BlockPolicy::at(Severity::Critical)
                .only([FindingCategory::DisallowedScheme]),
            neutralize_links: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_content_bytes(mut self, bytes: usize) -> Self {
        self.max_content_bytes = bytes;
        self
    }

    pub fn with_max_line_count(mut self, lines: usize) -> Self {
        self.max_line_count = lines;
        self
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_max_token_count(mut self, count: usize) -> Self {
        self.max_token_count = count;
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.allowed_features.insert(feature);
        self
    }

    pub fn without_feature(mut self, feature: Feature) -> Self {
        self.allowed_features.remove(&feature);
        self
    }

    /// Add a scheme to the allow-list (stored lowercase).
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.allowed_schemes.insert(scheme.to_ascii_lowercase());
        self
    }

    pub fn with_block_policy(mut self, policy: BlockPolicy) -> Self {
        self.block_policy = policy;
        self
    }

    pub fn with_neutralize_links(mut self, neutralize: bool) -> Self {
        self.neutralize_links = neutralize;
        self
    }

    pub fn allows(&self, feature: Feature) -> bool {
        self.allowed_features.contains(&feature)
    }

    pub fn allows_scheme(&self, scheme: &str) -> bool {
        self.allowed_schemes.contains(scheme)
    }

    /// Check that every threshold is usable.
    pub fn validate(&self) -> ProfileResult<()> {
        let limits = [
            ("max_content_bytes", self.max_content_bytes),
            ("max_line_count", self.max_line_count),
            ("max_recursion_depth", self.max_recursion_depth),
            ("max_token_count", self.max_token_count),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(ProfileError::ZeroLimit(field));
            }
        }

        for scheme in &self.allowed_schemes {
            let valid = scheme
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_lowercase())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+-.".contains(c));
            if !valid {
                return Err(ProfileError::InvalidScheme(scheme.clone()));
            }
        }

        Ok(())
    }
}
