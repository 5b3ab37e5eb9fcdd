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

//! Security finding types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational, rarely actionable
    Low,
    /// Suspicious content
    Medium,
    /// Likely hostile content
    High,
    /// Content capable of executing or escaping its context
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    /// Raw content exceeds the byte limit
    ContentSize,
    /// Raw content exceeds the line limit
    LineCount,
    /// Content is not valid UTF-8 or contains NUL bytes
    Encoding,
    /// The tokenizer failed on gated content
    Tokenizer,
    /// Known adversarial phrase or structure
    Injection,
    /// Reference value uses a scheme outside the allow-list
    DisallowedScheme,
    /// Token belongs to a feature the profile does not allow
    DisallowedFeature,
    /// Direction override or embedding control point
    BidiControl,
    /// Zero-width or otherwise invisible character
    InvisibleCharacter,
    /// Visually confusable sequence (homograph risk)
    Confusable,
}

impl FindingCategory {
    /// Stable identifier used in logs and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentSize => "content-size",
            Self::LineCount => "line-count",
            Self::Encoding => "encoding",
            Self::Tokenizer => "tokenizer",
            Self::Injection => "injection",
            Self::DisallowedScheme => "disallowed-scheme",
            Self::DisallowedFeature => "disallowed-feature",
            Self::BidiControl => "bidi-control",
            Self::InvisibleCharacter => "invisible-character",
            Self::Confusable => "confusable",
        }
    }

    /// Whether this category is produced by the pre-tokenization gate.
    pub fn is_gate_category(&self) -> bool {
        matches!(
            self,
            Self::ContentSize | Self::LineCount | Self::Encoding | Self::Tokenizer
        )
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finding was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingLocation {
    /// The document as a whole
    Document,
    /// A source line (0-based)
    Line { line: usize },
    /// A token in the stream
    Token { index: usize, line: Option<usize> },
    /// A value inside a collector fragment
    Fragment {
        collector: String,
        pointer: String,
        line: Option<usize>,
    },
}

impl fmt::Display for FindingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Line { line } => write!(f, "line {}", line + 1),
            Self::Token { index, line } => match line {
                Some(line) => write!(f, "token {} (line {})", index, line + 1),
                None => write!(f, "token {}", index),
            },
            Self::Fragment {
                collector, pointer, ..
            } => write!(f, "{}{}", collector, pointer),
        }
    }
}

/// A security finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    category: FindingCategory,
    severity: Severity,
    location: FindingLocation,
    message: String,
    /// Identifier of the pattern or check that produced this finding.
    #[serde(skip_serializing_if = "Option::is_none")]
    rule_id: Option<String>,
    /// Set when policy rewrote the offending value.
    #[serde(default)]
    neutralized: bool,
}

impl Finding {
    pub fn new(
        category: FindingCategory,
        severity: Severity,
        location: FindingLocation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            location,
            message: message.into(),
            rule_id: None,
            neutralized: false,
        }
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    // Public getters
    pub fn category(&self) -> FindingCategory {
        self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn location(&self) -> &FindingLocation {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn rule_id(&self) -> Option<&str> {
        self.rule_id.as_deref()
    }

    pub fn is_neutralized(&self) -> bool {
        self.neutralized
    }

    /// Mark the finding as neutralized (used by the result assembler).
    pub fn mark_neutralized(&mut self) {
        self.neutralized = true;
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] {}: {}",
            self.location, self.category, self.severity, self.message
        )?;
        if self.neutralized {
            write!(f, " (neutralized)")?;
        }
        Ok(())
    }
}
