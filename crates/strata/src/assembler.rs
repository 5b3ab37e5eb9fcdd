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

//! Result assembly.
//!
//! Every parse produces exactly one [`ParseResult`]. Its `structure` is
//! present only for [`ParseStatus::Completed`]; security findings and
//! diagnostics are kept for every status.

use crate::pipeline::ParseStage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use strata_core::{
    AbortReason, CollectorError, Finding, FindingCategory, Fragment, SecurityProfile, Severity,
};
use strata_security::is_blocked;
use tracing::info;

/// Collector name to fragment, in registration order.
pub type Structure = Map<String, Value>;

/// Terminal status of a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// The content failed the gate (or the tokenizer failed); nothing was
    /// dispatched.
    Rejected,
    /// Dispatch stopped early; see [`Diagnostics::abort_reason`].
    RecursionAborted,
    Completed,
}

impl fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "rejected"),
            Self::RecursionAborted => write!(f, "recursion_aborted"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Security outcome of a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySummary {
    pub profile_used: String,
    pub findings: Vec<Finding>,
    /// Whether any finding blocks under the profile's policy.
    pub blocked: bool,
    /// Version of the injection pattern set the content was scanned with.
    pub pattern_set_version: String,
}

impl SecuritySummary {
    pub fn highest_severity(&self) -> Option<Severity> {
        self.findings.iter().map(Finding::severity).max()
    }

    pub fn by_category(&self, category: FindingCategory) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.category() == category)
    }
}

/// What happened during a parse, independent of its output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Last pipeline stage reached.
    pub stage: ParseStage,
    /// Tokens produced by the tokenizer, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,
    pub tokens_visited: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<AbortReason>,
    /// Failures from `reset` and `on_token`.
    pub collector_errors: Vec<CollectorError>,
    pub finalize_errors: Vec<CollectorError>,
    pub elapsed_us: u64,
}

/// The single output of a parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub status: ParseStatus,
    /// Collector name to fragment. Absent unless `status` is `Completed`.
    pub structure: Option<Structure>,
    pub security: SecuritySummary,
    pub diagnostics: Diagnostics,
}

impl ParseResult {
    /// Result for content that never reached dispatch.
    pub fn rejected(
        profile: &SecurityProfile,
        findings: Vec<Finding>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self::assemble(ParseStatus::Rejected, None, profile, findings, diagnostics)
    }

    /// Result for a dispatch that stopped early.
    pub fn aborted(
        profile: &SecurityProfile,
        findings: Vec<Finding>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self::assemble(
            ParseStatus::RecursionAborted,
            None,
            profile,
            findings,
            diagnostics,
        )
    }

    /// Merge finalized fragments into the structure map.
    pub fn completed(
        profile: &SecurityProfile,
        fragments: Vec<(String, Fragment)>,
        findings: Vec<Finding>,
        diagnostics: Diagnostics,
    ) -> Self {
        let structure = fragments
            .into_iter()
            .map(|(name, fragment)| (name, fragment.into_value()))
            .collect();
        Self::assemble(
            ParseStatus::Completed,
            Some(structure),
            profile,
            findings,
            diagnostics,
        )
    }

    fn assemble(
        status: ParseStatus,
        structure: Option<Structure>,
        profile: &SecurityProfile,
        findings: Vec<Finding>,
        diagnostics: Diagnostics,
    ) -> Self {
        let blocked = is_blocked(&findings, profile);
        if blocked {
            info!(
                profile = %profile.name,
                findings = findings.len(),
                %status,
                "result blocked by security policy"
            );
        }
        Self {
            status,
            structure,
            security: SecuritySummary {
                profile_used: profile.name.clone(),
                findings,
                blocked,
                pattern_set_version: strata_security::PATTERN_SET_VERSION.to_string(),
            },
            diagnostics,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ParseStatus::Completed
    }

    pub fn is_blocked(&self) -> bool {
        self.security.blocked
    }

    /// Fragment produced by the named collector.
    pub fn fragment(&self, collector: &str) -> Option<&Value> {
        self.structure.as_ref()?.get(collector)
    }

    pub fn findings(&self) -> &[Finding] {
        &self.security.findings
    }

    /// Serialize the whole result as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_core::FindingLocation;

    fn finding(category: FindingCategory, severity: Severity) -> Finding {
        Finding::new(category, severity, FindingLocation::Document, "test")
    }

    // ==================== Assembly tests ====================

    #[test]
    fn test_completed_merges_fragments() {
        let fragments = vec![
            ("b".to_string(), Fragment::new(json!([1]))),
            ("a".to_string(), Fragment::new(json!({ "x": true }))),
        ];
        let result = ParseResult::completed(
            &SecurityProfile::moderate(),
            fragments,
            Vec::new(),
            Diagnostics::default(),
        );

        assert!(result.is_completed());
        assert_eq!(result.fragment("a"), Some(&json!({ "x": true })));
        assert_eq!(result.fragment("b"), Some(&json!([1])));
        assert_eq!(result.security.profile_used, "moderate");
        assert!(!result.is_blocked());
    }

    #[test]
    fn test_rejected_has_no_structure() {
        let result = ParseResult::rejected(
            &SecurityProfile::strict(),
            vec![finding(FindingCategory::LineCount, Severity::High)],
            Diagnostics::default(),
        );
        assert_eq!(result.status, ParseStatus::Rejected);
        assert!(result.structure.is_none());
        assert!(result.fragment("anything").is_none());
        assert_eq!(result.findings().len(), 1);
    }

    #[test]
    fn test_blocked_follows_profile() {
        let findings = vec![finding(FindingCategory::Injection, Severity::High)];
        let strict = ParseResult::completed(
            &SecurityProfile::strict(),
            Vec::new(),
            findings.clone(),
            Diagnostics::default(),
        );
        let permissive = ParseResult::completed(
            &SecurityProfile::permissive(),
            Vec::new(),
            findings,
            Diagnostics::default(),
        );
        assert!(strict.is_blocked());
        assert!(!permissive.is_blocked());
    }

    #[test]
    fn test_summary_helpers() {
        let result = ParseResult::aborted(
            &SecurityProfile::moderate(),
            vec![
                finding(FindingCategory::Confusable, Severity::Low),
                finding(FindingCategory::BidiControl, Severity::High),
            ],
            Diagnostics::default(),
        );
        assert_eq!(result.status, ParseStatus::RecursionAborted);
        assert_eq!(result.security.highest_severity(), Some(Severity::High));
        assert_eq!(result.security.by_category(FindingCategory::Confusable).count(), 1);
    }

    // ==================== Serialization tests ====================

    #[test]
    fn test_json_shape() {
        let result = ParseResult::completed(
            &SecurityProfile::moderate(),
            vec![("stats".to_string(), Fragment::new(json!({ "n": 1 })))],
            Vec::new(),
            Diagnostics::default(),
        );
        let value: Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

        assert_eq!(value["status"], "completed");
        assert_eq!(value["structure"]["stats"]["n"], 1);
        assert_eq!(value["security"]["blocked"], false);
        assert_eq!(value["diagnostics"]["stage"], "received");
    }

    #[test]
    fn test_structure_keeps_registration_order() {
        let result = ParseResult::completed(
            &SecurityProfile::moderate(),
            vec![
                ("zeta".to_string(), Fragment::new(json!(1))),
                ("alpha".to_string(), Fragment::new(json!(2))),
                ("mid".to_string(), Fragment::new(json!(3))),
            ],
            Vec::new(),
            Diagnostics::default(),
        );
        let names: Vec<&str> = result
            .structure
            .as_ref()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        let json = result.to_json().unwrap();
        let zeta = json.find("\"zeta\"").unwrap();
        let alpha = json.find("\"alpha\"").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ParseStatus::RecursionAborted.to_string(), "recursion_aborted");
    }
}
