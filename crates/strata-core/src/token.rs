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

//! Token model consumed by the dispatch engine.
//!
//! Tokens are produced by an external tokenizer and are never mutated by the
//! core. A token carries its structural type (`kind`), an optional element
//! name (`tag`), a nesting marker and the source lines it spans.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Nesting marker of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    /// Opens a structural scope (+1).
    Open,
    /// Stands alone (0).
    SelfClosing,
    /// Closes the innermost open scope (-1).
    Close,
}

impl Nesting {
    /// Signed depth delta of this marker.
    pub fn delta(self) -> i32 {
        match self {
            Self::Open => 1,
            Self::SelfClosing => 0,
            Self::Close => -1,
        }
    }

    /// Build a marker from a signed delta (`> 0` open, `< 0` close).
    pub fn from_delta(delta: i32) -> Self {
        match delta.signum() {
            1 => Self::Open,
            -1 => Self::Close,
            _ => Self::SelfClosing,
        }
    }
}

impl fmt::Display for Nesting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::SelfClosing => write!(f, "self-closing"),
            Self::Close => write!(f, "close"),
        }
    }
}

/// Half-open range of source lines (0-based, `end` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Span covering a single line.
    pub fn line(line: usize) -> Self {
        Self::new(line, line + 1)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Structural type, e.g. `heading`, `paragraph`, `text`.
    pub kind: String,
    /// Element name, e.g. `h2`, `a`.
    pub tag: Option<String>,
    pub nesting: Nesting,
    pub line_span: Option<LineSpan>,
    pub attributes: BTreeMap<String, String>,
    /// Inline text carried by leaf tokens.
    pub content: Option<String>,
}

impl Token {
    pub fn new(kind: impl Into<String>, nesting: Nesting) -> Self {
        Self {
            kind: kind.into(),
            tag: None,
            nesting,
            line_span: None,
            attributes: BTreeMap::new(),
            content: None,
        }
    }

    pub fn open(kind: impl Into<String>) -> Self {
        Self::new(kind, Nesting::Open)
    }

    pub fn close(kind: impl Into<String>) -> Self {
        Self::new(kind, Nesting::Close)
    }

    pub fn leaf(kind: impl Into<String>) -> Self {
        Self::new(kind, Nesting::SelfClosing)
    }

    /// Leaf `text` token carrying inline content.
    pub fn text(content: impl Into<String>) -> Self {
        Self::leaf("text").with_content(content)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_lines(mut self, start: usize, end: usize) -> Self {
        self.line_span = Some(LineSpan::new(start, end));
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn is_open(&self) -> bool {
        self.nesting == Nesting::Open
    }

    pub fn is_close(&self) -> bool {
        self.nesting == Nesting::Close
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First source line of the token, if known.
    pub fn line(&self) -> Option<usize> {
        self.line_span.map(|span| span.start)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(tag) = &self.tag {
            write!(f, "<{}>", tag)?;
        }
        write!(f, " ({})", self.nesting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Nesting tests ====================

    #[test]
    fn test_nesting_delta() {
        assert_eq!(Nesting::Open.delta(), 1);
        assert_eq!(Nesting::SelfClosing.delta(), 0);
        assert_eq!(Nesting::Close.delta(), -1);
    }

    #[test]
    fn test_nesting_from_delta() {
        assert_eq!(Nesting::from_delta(1), Nesting::Open);
        assert_eq!(Nesting::from_delta(7), Nesting::Open);
        assert_eq!(Nesting::from_delta(0), Nesting::SelfClosing);
        assert_eq!(Nesting::from_delta(-1), Nesting::Close);
    }

    #[test]
    fn test_nesting_serde_names() {
        let json = serde_json::to_string(&Nesting::SelfClosing).unwrap();
        assert_eq!(json, "\"self_closing\"");
    }

    // ==================== LineSpan tests ====================

    #[test]
    fn test_line_span_single() {
        let span = LineSpan::line(4);
        assert_eq!(span.start, 4);
        assert_eq!(span.end, 5);
        assert_eq!(span.len(), 1);
    }

    #[test]
    fn test_line_span_inverted_is_clamped() {
        let span = LineSpan::new(10, 3);
        assert_eq!(span.end, 10);
        assert!(span.is_empty());
    }

    // ==================== Token tests ====================

    #[test]
    fn test_token_builders() {
        let token = Token::open("heading")
            .with_tag("h2")
            .with_lines(3, 4)
            .with_attr("id", "intro");

        assert!(token.is_open());
        assert!(!token.is_close());
        assert_eq!(token.tag.as_deref(), Some("h2"));
        assert_eq!(token.line(), Some(3));
        assert_eq!(token.attr("id"), Some("intro"));
        assert_eq!(token.attr("class"), None);
    }

    #[test]
    fn test_token_text() {
        let token = Token::text("hello");
        assert_eq!(token.kind, "text");
        assert_eq!(token.nesting, Nesting::SelfClosing);
        assert_eq!(token.content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_token_display() {
        let token = Token::close("link").with_tag("a");
        assert_eq!(format!("{}", token), "link<a> (close)");
    }
}
