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

//! Fluent builder for token streams.

use strata_core::{Nesting, Token};

/// Builds balanced token streams.
///
/// `close()` closes the innermost open token; `build()` closes whatever is
/// still open. Tokens get the current line set by [`line`](Self::line).
///
/// # Examples
///
/// ```
/// use strata_test::TokenStreamBuilder;
///
/// let tokens = TokenStreamBuilder::new()
///     .line(0)
///     .open_tag("heading", "h1")
///     .text("Title")
///     .close()
///     .build();
///
/// assert_eq!(tokens.len(), 3);
/// assert_eq!(tokens[2].tag.as_deref(), Some("h1"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenStreamBuilder {
    tokens: Vec<Token>,
    open: Vec<(String, Option<String>)>,
    line: Option<usize>,
}

impl TokenStreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line assigned to subsequently added tokens.
    pub fn line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    fn push(mut self, mut token: Token) -> Self {
        if let Some(line) = self.line {
            token = token.with_lines(line, line + 1);
        }
        self.tokens.push(token);
        self
    }

    pub fn open(mut self, kind: &str) -> Self {
        self.open.push((kind.to_string(), None));
        self.push(Token::open(kind))
    }

    pub fn open_tag(mut self, kind: &str, tag: &str) -> Self {
        self.open.push((kind.to_string(), Some(tag.to_string())));
        self.push(Token::open(kind).with_tag(tag))
    }

    /// Close the innermost open token. Does nothing when none is open.
    pub fn close(mut self) -> Self {
        match self.open.pop() {
            Some((kind, tag)) => {
                let mut token = Token::close(kind);
                token.tag = tag;
                self.push(token)
            }
            None => self,
        }
    }

    /// Close the innermost `n` open tokens.
    pub fn close_n(mut self, n: usize) -> Self {
        for _ in 0..n {
            self = self.close();
        }
        self
    }

    pub fn text(self, content: &str) -> Self {
        self.push(Token::text(content))
    }

    pub fn leaf(self, kind: &str) -> Self {
        self.push(Token::leaf(kind))
    }

    /// Append an arbitrary token without touching the open stack.
    pub fn token(self, token: Token) -> Self {
        self.push(token)
    }

    /// Set an attribute on the most recently added token.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if let Some(last) = self.tokens.pop() {
            self.tokens.push(last.with_attr(name, value));
        }
        self
    }

    /// Open `depth` nested tokens of `kind`, without closing them.
    pub fn nest(mut self, kind: &str, depth: usize) -> Self {
        for _ in 0..depth {
            self = self.open(kind);
        }
        self
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn build(mut self) -> Vec<Token> {
        while !self.open.is_empty() {
            self = self.close();
        }
        self.tokens
    }

    /// The tokens added so far, leaving open tokens unclosed.
    pub fn build_unbalanced(self) -> Vec<Token> {
        self.tokens
    }
}

/// Net nesting of a stream (0 when balanced).
pub fn net_nesting(tokens: &[Token]) -> i32 {
    tokens.iter().map(|t| t.nesting.delta()).sum()
}

/// Maximum ancestor depth reached by a stream.
pub fn max_depth(tokens: &[Token]) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    for token in tokens {
        match token.nesting {
            Nesting::Open => {
                depth += 1;
                max = max.max(depth);
            }
            Nesting::Close => depth = depth.saturating_sub(1),
            Nesting::SelfClosing => {}
        }
    }
    max
}
