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

//! Pre-tokenization content gate.
//!
//! The gate looks only at raw bytes. It runs before any tokenizer and fails
//! closed: content it cannot measure or decode is rejected.

use memchr::{memchr, memchr_iter};
use strata_core::{Finding, FindingCategory, FindingLocation, SecurityProfile, Severity};
use tracing::warn;

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    pub valid: bool,
    pub issues: Vec<Finding>,
    pub byte_len: usize,
    /// `None` when the size check failed first and lines were never counted.
    pub line_count: Option<usize>,
}

/// Check raw content against the profile's size and line limits.
pub fn validate(content: &[u8], profile: &SecurityProfile) -> GateReport {
    match admit(content, profile) {
        Ok(_) => GateReport {
            valid: true,
            issues: Vec::new(),
            byte_len: content.len(),
            line_count: Some(count_lines(content)),
        },
        Err(report) => report,
    }
}

/// Validate and decode content in one step.
///
/// Returns the decoded text when every check passes, otherwise the failing
/// report.
pub fn admit<'a>(content: &'a [u8], profile: &SecurityProfile) -> Result<&'a str, GateReport> {
    let byte_len = content.len();

    if byte_len > profile.max_content_bytes {
        let issue = Finding::new(
            FindingCategory::ContentSize,
            Severity::High,
            FindingLocation::Document,
            format!(
                "content is {} bytes, limit is {}",
                byte_len, profile.max_content_bytes
            ),
        )
        .with_rule("gate.content-size");
        warn!(byte_len, limit = profile.max_content_bytes, "content rejected: too large");
        return Err(GateReport {
            valid: false,
            issues: vec![issue],
            byte_len,
            line_count: None,
        });
    }

    let mut issues = Vec::new();

    let line_count = count_lines(content);
    if line_count > profile.max_line_count {
        issues.push(
            Finding::new(
                FindingCategory::LineCount,
                Severity::High,
                FindingLocation::Document,
                format!(
                    "content has {} lines, limit is {}",
                    line_count, profile.max_line_count
                ),
            )
            .with_rule("gate.line-count"),
        );
    }

    let text = match std::str::from_utf8(content) {
        Ok(text) => Some(text),
        Err(e) => {
            issues.push(
                Finding::new(
                    FindingCategory::Encoding,
                    Severity::High,
                    FindingLocation::Document,
                    format!("content is not valid UTF-8 at byte {}", e.valid_up_to()),
                )
                .with_rule("gate.encoding"),
            );
            None
        }
    };

    if let Some(pos) = memchr(0, content) {
        issues.push(
            Finding::new(
                FindingCategory::Encoding,
                Severity::High,
                FindingLocation::Document,
                format!("content contains a NUL byte at offset {}", pos),
            )
            .with_rule("gate.nul-byte"),
        );
    }

    match text {
        Some(text) if issues.is_empty() => Ok(text),
        _ => {
            warn!(
                issues = issues.len(),
                byte_len,
                line_count,
                "content rejected by gate"
            );
            Err(GateReport {
                valid: false,
                issues,
                byte_len,
                line_count: Some(line_count),
            })
        }
    }
}

/// Number of lines in `content`.
///
/// A trailing line without a terminator counts; empty content has zero lines.
pub fn count_lines(content: &[u8]) -> usize {
    let newlines = memchr_iter(b'\n', content).count();
    match content.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}
