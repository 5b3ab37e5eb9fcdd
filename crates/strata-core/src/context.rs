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

//! Per-parse dispatch state and the read-only query surface.
//!
//! A [`DispatchContext`] is created fresh for every parse and handed by
//! reference to every collector callback. Collectors can only read from it;
//! the ancestor stack and line cursor are maintained by the dispatch engine.

use crate::profile::SecurityProfile;
use crate::token::{Nesting, Token};
use std::cell::OnceCell;

/// Token kinds holding raw markup rather than document text.
pub const RAW_MARKUP_KINDS: [&str; 2] = ["html_inline", "html_block"];

/// Per-parse dispatch state.
#[derive(Debug)]
pub struct DispatchContext<'a> {
    tokens: &'a [Token],
    source: &'a str,
    profile: &'a SecurityProfile,
    /// Kinds of the still-open ancestors, outermost first.
    ancestors: Vec<String>,
    /// Token index of each entry in `ancestors`.
    open_indices: Vec<usize>,
    current_index: usize,
    current_line: usize,
    line_starts: OnceCell<Vec<usize>>,
}

impl<'a> DispatchContext<'a> {
    pub fn new(tokens: &'a [Token], source: &'a str, profile: &'a SecurityProfile) -> Self {
        Self {
            tokens,
            source,
            profile,
            ancestors: Vec::new(),
            open_indices: Vec::new(),
            current_index: 0,
            current_line: 0,
            line_starts: OnceCell::new(),
        }
    }

    // ---- engine-side mutation ----

    pub(crate) fn enter(&mut self, index: usize, token: &Token) {
        self.current_index = index;
        if let Some(line) = token.line() {
            self.current_line = line;
        }
    }

    pub(crate) fn push(&mut self, index: usize, kind: &str) {
        self.ancestors.push(kind.to_string());
        self.open_indices.push(index);
    }

    pub(crate) fn pop(&mut self) -> Option<(String, usize)> {
        let kind = self.ancestors.pop()?;
        let index = self.open_indices.pop()?;
        Some((kind, index))
    }

    // ---- dispatch state ----

    /// Kinds of the still-open ancestors enclosing the current token.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Kind of the innermost open ancestor.
    pub fn parent_kind(&self) -> Option<&str> {
        self.ancestors.last().map(String::as_str)
    }

    pub fn is_inside(&self, kind: &str) -> bool {
        self.ancestors.iter().any(|k| k == kind)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Line of the most recent token that carried a line span.
    pub fn current_line(&self) -> usize {
        self.current_line
    }

    pub fn profile(&self) -> &SecurityProfile {
        self.profile
    }

    // ---- token queries ----

    pub fn token(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index)
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    /// Index of the token closing the opener at `index`.
    ///
    /// Returns `None` when `index` is not an opener or the stream ends
    /// before the scope is balanced.
    pub fn find_matching_close(&self, index: usize) -> Option<usize> {
        let opener = self.tokens.get(index)?;
        if opener.nesting != Nesting::Open {
            return None;
        }

        let mut depth = 0i64;
        for (offset, token) in self.tokens[index..].iter().enumerate() {
            depth += i64::from(token.nesting.delta());
            if depth == 0 {
                return Some(index + offset);
            }
        }
        None
    }

    /// Index of the nearest ancestor still open when the token at `index`
    /// was dispatched.
    pub fn find_parent(&self, index: usize) -> Option<usize> {
        if index >= self.tokens.len() {
            return None;
        }
        if index == self.current_index {
            // A closer is dispatched while its own scope is still on the
            // stack; its parent is the entry below.
            let skip = usize::from(self.tokens[index].is_close());
            return self.open_indices.iter().rev().nth(skip).copied();
        }

        // Closers balance their own opener before the walk starts.
        let mut depth = if self.tokens[index].is_close() { 1i64 } else { 0 };
        for candidate in (0..index).rev() {
            match self.tokens[candidate].nesting {
                Nesting::Close => depth += 1,
                Nesting::Open if depth == 0 => return Some(candidate),
                Nesting::Open => depth -= 1,
                Nesting::SelfClosing => {}
            }
        }
        None
    }

    /// Concatenated inline content of the tokens strictly between `start`
    /// and `end`, skipping structural and raw-markup tokens.
    pub fn text_between(&self, start: usize, end: usize) -> String {
        let mut text = String::new();
        let upper = end.min(self.tokens.len());
        if start + 1 >= upper {
            return text;
        }
        for token in &self.tokens[start + 1..upper] {
            append_inline(&mut text, token);
        }
        text
    }

    /// Text content of the token at `index`: the scope's inner text for an
    /// opener, the token's own content for a leaf.
    pub fn text_of(&self, index: usize) -> String {
        let Some(token) = self.tokens.get(index) else {
            return String::new();
        };
        match token.nesting {
            Nesting::Open => {
                let end = self.find_matching_close(index).unwrap_or(self.tokens.len());
                self.text_between(index, end)
            }
            Nesting::SelfClosing => {
                let mut text = String::new();
                append_inline(&mut text, token);
                text
            }
            Nesting::Close => String::new(),
        }
    }

    // ---- source slicing ----

    fn line_starts(&self) -> &[usize] {
        self.line_starts.get_or_init(|| {
            std::iter::once(0)
                .chain(self.source.match_indices('\n').map(|(pos, _)| pos + 1))
                .collect()
        })
    }

    pub fn line_count(&self) -> usize {
        if self.source.is_empty() {
            return 0;
        }
        let starts = self.line_starts().len();
        if self.source.ends_with('\n') {
            starts - 1
        } else {
            starts
        }
    }

    /// Raw source of lines `start..end` (0-based, `end` exclusive),
    /// including their line terminators.
    pub fn lines(&self, start: usize, end: usize) -> Option<&'a str> {
        let count = self.line_count();
        if start >= end || end > count {
            return None;
        }
        let starts = self.line_starts();
        let from = starts[start];
        let to = starts.get(end).copied().unwrap_or(self.source.len());
        self.source.get(from..to)
    }

    /// Raw source covered by the token's line span.
    pub fn token_source(&self, index: usize) -> Option<&'a str> {
        let span = self.tokens.get(index)?.line_span?;
        self.lines(span.start, span.end)
    }

    /// Raw source between two byte offsets, if both fall on char boundaries.
    pub fn slice(&self, start: usize, end: usize) -> Option<&'a str> {
        if start > end {
            return None;
        }
        self.source.get(start..end)
    }
}

fn append_inline(out: &mut String, token: &Token) {
    if token.nesting != Nesting::SelfClosing || RAW_MARKUP_KINDS.contains(&token.kind.as_str()) {
        return;
    }
    match token.kind.as_str() {
        "softbreak" => out.push(' '),
        "hardbreak" => out.push('\n'),
        _ => {
            if let Some(content) = &token.content {
                out.push_str(content);
            }
        }
    }
}
