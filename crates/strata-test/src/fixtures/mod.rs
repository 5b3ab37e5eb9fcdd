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

//! Canonical token streams and their source text.

pub mod builders;
pub mod collectors;
pub mod tokenizers;

pub use builders::TokenStreamBuilder;
pub use collectors::{FailingCollector, PanickingCollector, RecordingCollector};
pub use tokenizers::{FailingTokenizer, FixedTokenizer, LineTokenizer, SpyTokenizer};

use strata_core::Token;

/// Two headings (levels 1 and 2), each followed by a paragraph.
pub fn two_headings() -> (&'static str, Vec<Token>) {
    let source = "# Intro\n\nFirst paragraph.\n\n## Details\n\nSecond paragraph.\n";
    let tokens = TokenStreamBuilder::new()
        .line(0)
        .open_tag("heading", "h1")
        .text("Intro")
        .close()
        .line(2)
        .open_tag("paragraph", "p")
        .text("First paragraph.")
        .close()
        .line(4)
        .open_tag("heading", "h2")
        .text("Details")
        .close()
        .line(6)
        .open_tag("paragraph", "p")
        .text("Second paragraph.")
        .close()
        .build();
    (source, tokens)
}

/// Blockquote containing a paragraph, followed by a plain paragraph.
///
/// Indices: 0 `+blockquote`, 1 `+paragraph`, 2 `text`, 3 `-paragraph`,
/// 4 `-blockquote`, 5 `+paragraph`, 6 `text`, 7 `-paragraph`.
pub fn quoted_and_plain() -> Vec<Token> {
    TokenStreamBuilder::new()
        .open("blockquote")
        .open("paragraph")
        .text("quoted")
        .close_n(2)
        .open("paragraph")
        .text("plain")
        .build()
}

/// `depth` nested blockquotes around a single text token.
pub fn nested_blockquotes(depth: usize) -> Vec<Token> {
    TokenStreamBuilder::new()
        .nest("blockquote", depth)
        .text("deep")
        .build()
}

/// Paragraph with one link whose target is `href`.
pub fn link_paragraph(href: &str) -> Vec<Token> {
    TokenStreamBuilder::new()
        .line(0)
        .open_tag("paragraph", "p")
        .text("click ")
        .token(Token::open("link").with_tag("a").with_attr("href", href).with_lines(0, 1))
        .text("here")
        .token(Token::close("link").with_tag("a").with_lines(0, 1))
        .build()
}

/// Content of `lines` lines.
pub fn lines(count: usize) -> String {
    "line\n".repeat(count)
}
