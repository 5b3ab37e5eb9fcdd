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

//! Post-finalize security policy.
//!
//! Reference validation runs over finalized fragments, after every collector
//! has produced its output. Blocking is decided last, over the complete set
//! of findings.

use crate::scheme::check_reference;
use serde_json::Value;
use strata_core::{Finding, Fragment, SecurityProfile};
use tracing::debug;

/// Validate every extracted reference in `fragments`.
///
/// When the profile neutralizes links, each offending value is replaced in
/// place with an empty string and its finding is marked neutralized.
pub fn apply_reference_policy(
    fragments: &mut [(String, Fragment)],
    profile: &SecurityProfile,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (collector, fragment) in fragments.iter_mut() {
        let mut flagged = Vec::new();
        for reference in fragment.references() {
            if let Some(finding) = check_reference(collector, reference, profile) {
                flagged.push((reference.pointer.clone(), finding));
            }
        }

        for (pointer, mut finding) in flagged {
            if profile.neutralize_links && neutralize(fragment, &pointer) {
                debug!(collector = %collector, pointer = %pointer, "reference neutralized");
                finding.mark_neutralized();
            }
            findings.push(finding);
        }
    }

    findings
}

/// Replace the string at `pointer` with `""`. Returns false when the pointer
/// does not name a string.
pub fn neutralize(fragment: &mut Fragment, pointer: &str) -> bool {
    match fragment.value_mut().pointer_mut(pointer) {
        Some(slot) if slot.is_string() => {
            *slot = Value::String(String::new());
            true
        }
        _ => false,
    }
}

/// Whether any finding blocks under the profile's policy.
pub fn is_blocked(findings: &[Finding], profile: &SecurityProfile) -> bool {
    findings.iter().any(|f| profile.block_policy.blocks(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_core::{
        ExtractedReference, FindingCategory, FindingLocation, Severity,
    };

    fn links(hrefs: &[&str]) -> Fragment {
        let value = Value::Array(hrefs.iter().map(|h| json!({ "href": h })).collect());
        Fragment::new(value).with_references(
            hrefs
                .iter()
                .enumerate()
                .map(|(i, h)| ExtractedReference::new(*h, format!("/{}/href", i))),
        )
    }

    // ==================== Reference policy tests ====================

    #[test]
    fn test_neutralizes_disallowed_link() {
        let mut fragments = vec![(
            "links".to_string(),
            links(&["https://ok", "javascript:alert(1)"]),
        )];
        let findings = apply_reference_policy(&mut fragments, &SecurityProfile::moderate());

        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_neutralized());
        assert_eq!(
            fragments[0].1.value(),
            &json!([{ "href": "https://ok" }, { "href": "" }])
        );
    }

    #[test]
    fn test_permissive_keeps_value() {
        let mut fragments = vec![("links".to_string(), links(&["javascript:alert(1)"]))];
        let findings = apply_reference_policy(&mut fragments, &SecurityProfile::permissive());

        assert_eq!(findings.len(), 1);
        assert!(!findings[0].is_neutralized());
        assert_eq!(fragments[0].1.value(), &json!([{ "href": "javascript:alert(1)" }]));
    }

    #[test]
    fn test_bad_pointer_not_neutralized() {
        let mut fragment = Fragment::new(json!({ "n": 1 }));
        assert!(!neutralize(&mut fragment, "/n"));
        assert!(!neutralize(&mut fragment, "/missing"));
    }

    // ==================== Blocking tests ====================

    fn finding(category: FindingCategory, severity: Severity) -> Finding {
        Finding::new(category, severity, FindingLocation::Document, "test")
    }

    #[test]
    fn test_strict_blocks_any_high() {
        let findings = [finding(FindingCategory::Confusable, Severity::High)];
        assert!(is_blocked(&findings, &SecurityProfile::strict()));
        assert!(!is_blocked(&findings, &SecurityProfile::moderate()));
    }

    #[test]
    fn test_permissive_blocks_only_critical_schemes() {
        let profile = SecurityProfile::permissive();
        assert!(!is_blocked(
            &[finding(FindingCategory::Injection, Severity::High)],
            &profile
        ));
        assert!(is_blocked(
            &[finding(FindingCategory::DisallowedScheme, Severity::Critical)],
            &profile
        ));
    }

    #[test]
    fn test_no_findings_never_blocks() {
        assert!(!is_blocked(&[], &SecurityProfile::strict()));
    }
}
