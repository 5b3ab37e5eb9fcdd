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

//! Injection pattern scanning.
//!
//! Text is scanned in bounded, overlapping windows so a single pathological
//! input cannot make one regex evaluation arbitrarily large. Patterns are
//! plain data grouped in a versioned [`PatternSet`]; the built-in set is
//! compiled once per process.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use std::collections::BTreeSet;
use strata_core::{Finding, FindingCategory, FindingLocation, Severity};

/// Version of the built-in pattern list. Bump on every change to
/// [`BUILTIN_PATTERNS`].
pub const PATTERN_SET_VERSION: &str = "2025.1";

/// Maximum bytes scanned per window.
pub const WINDOW_BYTES: usize = 4096;

/// Bytes shared by consecutive windows.
pub const WINDOW_OVERLAP: usize = 256;

/// A named injection pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionPattern {
    pub id: &'static str,
    pub severity: Severity,
    pub pattern: &'static str,
    pub description: &'static str,
}

/// The built-in pattern list.
pub const BUILTIN_PATTERNS: &[InjectionPattern] = &[
    InjectionPattern {
        id: "injection.ignore-previous",
        severity: Severity::High,
        pattern: r"(?i)\b(?:ignore|disregard|forget)\s+(?:all\s+)?(?:of\s+)?(?:the\s+|your\s+)?(?:previous|prior|above|earlier|preceding)\s+(?:instructions|prompts?|rules|directions|messages)",
        description: "instruction override phrase",
    },
    InjectionPattern {
        id: "injection.override-system",
        severity: Severity::High,
        pattern: r"(?i)\b(?:override|bypass|disable)\s+(?:the\s+|your\s+)?(?:system|safety)\s+(?:prompt|instructions|rules|guidelines|filters?)",
        description: "system override phrase",
    },
    InjectionPattern {
        id: "injection.reveal-prompt",
        severity: Severity::High,
        pattern: r"(?i)\b(?:reveal|print|show|repeat|output)\s+(?:me\s+)?(?:your|the)\s+(?:system\s+prompt|hidden\s+instructions|initial\s+instructions)",
        description: "prompt exfiltration phrase",
    },
    InjectionPattern {
        id: "injection.persona-switch",
        severity: Severity::Medium,
        pattern: r"(?i)\byou\s+are\s+now\s+(?:in\s+)?(?:developer\s+mode|dan|jailbroken|unrestricted|an?\s+unfiltered)",
        description: "persona switch phrase",
    },
    InjectionPattern {
        id: "injection.role-marker",
        severity: Severity::Medium,
        pattern: r"(?im)^[ \t>]*(?:system|assistant)\s*:",
        description: "chat role marker at line start",
    },
    InjectionPattern {
        id: "injection.template-token",
        severity: Severity::Medium,
        pattern: r"<\|(?:im_start|im_end|system|endoftext)\|>|\[/?INST\]|<</?SYS>>",
        description: "chat template control token",
    },
];

/// A compiled, versioned set of injection patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    version: String,
    patterns: Vec<InjectionPattern>,
    set: RegexSet,
    regexes: Vec<Regex>,
}

static BUILTIN: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(PATTERN_SET_VERSION, BUILTIN_PATTERNS.to_vec())
        .expect("Valid built-in injection patterns")
});

impl PatternSet {
    /// Compile a pattern list.
    pub fn new(
        version: impl Into<String>,
        patterns: Vec<InjectionPattern>,
    ) -> Result<Self, regex::Error> {
        let set = RegexSet::new(patterns.iter().map(|p| p.pattern))?;
        let regexes = patterns
            .iter()
            .map(|p| Regex::new(p.pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            version: version.into(),
            patterns,
            set,
            regexes,
        })
    }

    /// The built-in set.
    pub fn builtin() -> &'static PatternSet {
        &BUILTIN
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn patterns(&self) -> &[InjectionPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Scan `text`, reporting each pattern at most once per line.
    pub fn scan(&self, text: &str) -> Vec<Finding> {
        let line_starts = line_starts(text);
        let mut seen: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut findings = Vec::new();

        for (offset, window) in windows(text, WINDOW_BYTES, WINDOW_OVERLAP) {
            // Search starts at the window but sees the text before it, so
            // `^` and `\b` do not match at a window cut.
            let haystack = &text[..offset + window.len()];
            let matched = self.set.matches_at(haystack, offset);
            if !matched.matched_any() {
                continue;
            }
            for idx in matched.iter() {
                let mut at = offset;
                while let Some(m) = self.regexes[idx].find_at(haystack, at) {
                    let line = line_of(&line_starts, m.start());
                    if seen.insert((line, idx)) {
                        let pattern = &self.patterns[idx];
                        findings.push(
                            Finding::new(
                                FindingCategory::Injection,
                                pattern.severity,
                                FindingLocation::Line { line },
                                format!("{}: \"{}\"", pattern.description, excerpt(m.as_str())),
                            )
                            .with_rule(pattern.id),
                        );
                    }
                    if m.end() >= haystack.len() {
                        break;
                    }
                    at = if m.end() > m.start() {
                        m.end()
                    } else {
                        ceil_boundary(haystack, m.end() + 1)
                    };
                }
            }
        }

        findings.sort_by_key(|f| match f.location() {
            FindingLocation::Line { line } => *line,
            _ => 0,
        });
        findings
    }
}

/// Scan `text` with the built-in pattern set.
pub fn scan_injection(text: &str) -> Vec<Finding> {
    PatternSet::builtin().scan(text)
}

/// Split `text` into windows of at most `size` bytes that overlap by
/// `overlap` bytes, cut on char boundaries. Yields `(byte_offset, window)`.
pub(crate) fn windows(text: &str, size: usize, overlap: usize) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    if text.is_empty() {
        return out;
    }
    let size = size.max(1);
    let overlap = overlap.min(size / 2);

    let mut start = 0;
    loop {
        let mut end = floor_boundary(text, (start + size).min(text.len()));
        if end <= start {
            // A single char wider than the window.
            end = ceil_boundary(text, start + 1);
        }
        out.push((start, &text[start..end]));
        if end == text.len() {
            break;
        }
        let next = floor_boundary(text, end.saturating_sub(overlap));
        start = if next > start { next } else { end };
    }
    out
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index.min(text.len())
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(memchr::memchr_iter(b'\n', text.as_bytes()).map(|i| i + 1))
        .collect()
}

/// 0-based line containing byte `offset`.
fn line_of(line_starts: &[usize], offset: usize) -> usize {
    match line_starts.binary_search(&offset) {
        Ok(line) => line,
        Err(next) => next - 1,
    }
}

fn excerpt(matched: &str) -> String {
    const MAX_CHARS: usize = 60;
    let mut out: String = matched.chars().take(MAX_CHARS).collect();
    if matched.chars().count() > MAX_CHARS {
        out.push('…');
    }
    out.replace('\n', " ")
}
