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

//! Reference scheme validation.

use strata_core::{
    ExtractedReference, Feature, Finding, FindingCategory, FindingLocation, SecurityProfile,
    Severity,
};

/// Schemes that execute code when followed.
pub const SCRIPT_SCHEMES: [&str; 2] = ["javascript", "vbscript"];

/// Longest scheme kept by [`extract_scheme`]. Longer schemes are truncated.
pub const MAX_SCHEME_LEN: usize = 32;

/// Extract the lowercase scheme of a reference value.
///
/// ASCII whitespace and control characters are removed first, so
/// `" java\tscript:"` yields `javascript`. Relative references, fragments
/// and values whose first `:` follows a `/`, `?` or `#` have no scheme.
/// A scheme longer than [`MAX_SCHEME_LEN`] comes back truncated and still
/// goes through the allow-list.
pub fn extract_scheme(value: &str) -> Option<String> {
    let mut scheme = String::new();
    let mut length = 0;
    let mut valid = true;
    let mut terminated = false;
    for c in value.chars() {
        if c.is_ascii_whitespace() || c.is_ascii_control() {
            continue;
        }
        match c {
            ':' => {
                terminated = true;
                break;
            }
            '/' | '?' | '#' => return None,
            _ => {}
        }
        valid &= if length == 0 {
            c.is_ascii_alphabetic()
        } else {
            c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
        };
        length += 1;
        if length <= MAX_SCHEME_LEN {
            scheme.push(c);
        }
    }

    if !terminated || length == 0 || !valid {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

/// Check one extracted reference against the profile's allow-list.
pub fn check_reference(
    collector: &str,
    reference: &ExtractedReference,
    profile: &SecurityProfile,
) -> Option<Finding> {
    let scheme = extract_scheme(&reference.value)?;
    if profile.allows_scheme(&scheme) {
        return None;
    }
    if scheme == "data" && profile.allows(Feature::DataUri) {
        return None;
    }

    let severity = if SCRIPT_SCHEMES.contains(&scheme.as_str()) {
        Severity::Critical
    } else if scheme == "data" {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(
        Finding::new(
            FindingCategory::DisallowedScheme,
            severity,
            FindingLocation::Fragment {
                collector: collector.to_string(),
                pointer: reference.pointer.clone(),
                line: reference.line,
            },
            format!("reference uses disallowed scheme '{}'", scheme),
        )
        .with_rule(format!("scheme.{}", scheme)),
    )
}
