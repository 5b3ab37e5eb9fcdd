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

//! Tokenizer fixtures.

use std::sync::atomic::{AtomicUsize, Ordering};
use strata_core::{Token, TokenizeError, Tokenizer};

/// Returns a fixed token stream regardless of input.
#[derive(Debug, Clone, Default)]
pub struct FixedTokenizer(pub Vec<Token>);

impl Tokenizer for FixedTokenizer {
    fn tokenize(&self, _text: &str) -> Result<Vec<Token>, TokenizeError> {
        Ok(self.0.clone())
    }
}

/// Always fails.
#[derive(Debug, Clone)]
pub struct FailingTokenizer {
    pub message: String,
}

impl FailingTokenizer {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl Tokenizer for FailingTokenizer {
    fn tokenize(&self, _text: &str) -> Result<Vec<Token>, TokenizeError> {
        Err(TokenizeError::failed(self.message.clone()))
    }
}

/// Wraps a tokenizer and counts how often it is invoked.
pub struct SpyTokenizer {
    inner: Box<dyn Tokenizer + Send + Sync>,
    calls: AtomicUsize,
}

impl SpyTokenizer {
    /// Spy returning `tokens` on every call.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::wrapping(FixedTokenizer(tokens))
    }

    pub fn wrapping<T: Tokenizer + Send + Sync + 'static>(inner: T) -> Self {
        Self {
            inner: Box::new(inner),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SpyTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpyTokenizer")
            .field("calls", &self.calls())
            .finish()
    }
}

impl Tokenizer for SpyTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.tokenize(text)
    }
}

/// Minimal line-oriented markdown tokenizer for end-to-end tests.
///
/// Understands ATX headings, paragraphs, `>` blockquotes, `- ` bullet
/// lists, fenced code, lines starting with `<` as raw HTML, and inline
/// `[label](href)` links and `![alt](src)` images. Every token carries its
/// 0-based line span.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineTokenizer;

impl Tokenizer for LineTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        let lines: Vec<&str> = text.lines().collect();
        let mut out = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].trim_end();
            if line.trim().is_empty() {
                i += 1;
                continue;
            }

            if let Some(level) = heading_level(line) {
                let tag = format!("h{}", level);
                out.push(Token::open("heading").with_tag(&tag).with_lines(i, i + 1));
                inline(line[level + 1..].trim(), i, &mut out);
                out.push(Token::close("heading").with_tag(&tag).with_lines(i, i + 1));
                i += 1;
            } else if line.starts_with("```") {
                let start = i;
                let mut body = String::new();
                i += 1;
                while i < lines.len() && !lines[i].trim_end().starts_with("```") {
                    body.push_str(lines[i]);
                    body.push('\n');
                    i += 1;
                }
                if i == lines.len() {
                    return Err(TokenizeError::AtLine {
                        line: start,
                        message: "unterminated code fence".to_string(),
                    });
                }
                i += 1;
                out.push(Token::leaf("code_block").with_content(body).with_lines(start, i));
            } else if line.starts_with('<') {
                out.push(Token::leaf("html_block").with_content(line).with_lines(i, i + 1));
                i += 1;
            } else if line.starts_with('>') {
                let start = i;
                let mut quoted = Vec::new();
                while i < lines.len() {
                    match lines[i].trim_end().strip_prefix('>') {
                        Some(rest) => quoted.push(rest.trim()),
                        None => break,
                    }
                    i += 1;
                }
                quoted.retain(|l| !l.is_empty());
                out.push(Token::open("blockquote").with_lines(start, i));
                if !quoted.is_empty() {
                    paragraph(&quoted, start, &mut out);
                }
                out.push(Token::close("blockquote").with_lines(start, i));
            } else if line.starts_with("- ") {
                let start = i;
                let mut items = Vec::new();
                while i < lines.len() {
                    match lines[i].trim_end().strip_prefix("- ") {
                        Some(rest) => items.push((i, rest.trim())),
                        None => break,
                    }
                    i += 1;
                }
                out.push(Token::open("bullet_list").with_tag("ul").with_lines(start, i));
                for (line_no, item) in items {
                    out.push(Token::open("list_item").with_tag("li").with_lines(line_no, line_no + 1));
                    paragraph(&[item], line_no, &mut out);
                    out.push(Token::close("list_item").with_tag("li").with_lines(line_no, line_no + 1));
                }
                out.push(Token::close("bullet_list").with_tag("ul").with_lines(start, i));
            } else {
                let start = i;
                let mut para = Vec::new();
                while i < lines.len() && !lines[i].trim().is_empty() && !is_block_start(lines[i]) {
                    para.push(lines[i].trim());
                    i += 1;
                }
                paragraph(&para, start, &mut out);
            }
        }

        Ok(out)
    }
}

fn heading_level(line: &str) -> Option<usize> {
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&level) && line[level..].starts_with(' ') {
        Some(level)
    } else {
        None
    }
}

fn is_block_start(line: &str) -> bool {
    let line = line.trim_end();
    heading_level(line).is_some()
        || line.starts_with("```")
        || line.starts_with('<')
        || line.starts_with('>')
        || line.starts_with("- ")
}

fn paragraph(lines: &[&str], start: usize, out: &mut Vec<Token>) {
    let end = start + lines.len();
    out.push(Token::open("paragraph").with_tag("p").with_lines(start, end));
    for (offset, line) in lines.iter().enumerate() {
        if offset > 0 {
            out.push(Token::leaf("softbreak").with_lines(start + offset, start + offset + 1));
        }
        inline(line, start + offset, out);
    }
    out.push(Token::close("paragraph").with_tag("p").with_lines(start, end));
}

fn inline(text: &str, line: usize, out: &mut Vec<Token>) {
    let at = |token: Token| token.with_lines(line, line + 1);
    let mut rest = text;

    while !rest.is_empty() {
        let Some(link) = find_link(rest) else {
            out.push(at(Token::text(rest)));
            break;
        };
        if link.start > 0 {
            out.push(at(Token::text(&rest[..link.start])));
        }
        if link.image {
            out.push(at(Token::leaf("image")
                .with_tag("img")
                .with_attr("src", link.href)
                .with_content(link.label)));
        } else {
            out.push(at(Token::open("link").with_tag("a").with_attr("href", link.href)));
            if !link.label.is_empty() {
                out.push(at(Token::text(link.label)));
            }
            out.push(at(Token::close("link").with_tag("a")));
        }
        rest = &rest[link.end..];
    }
}

struct InlineLink<'a> {
    start: usize,
    end: usize,
    image: bool,
    label: &'a str,
    href: &'a str,
}

fn find_link(s: &str) -> Option<InlineLink<'_>> {
    let open = s.find('[')?;
    let close = open + s[open..].find("](")?;
    let end = close + 2 + s[close + 2..].find(')')?;
    let image = open > 0 && s.as_bytes()[open - 1] == b'!';
    Some(InlineLink {
        start: if image { open - 1 } else { open },
        end: end + 1,
        image,
        label: &s[open + 1..close],
        href: &s[close + 2..end],
    })
}
