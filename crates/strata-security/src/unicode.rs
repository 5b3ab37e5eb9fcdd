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

//! Bidirectional-control, invisible-character and confusable detection.
//!
//! These checks only report. They never rewrite content.

use std::collections::{BTreeMap, HashSet};
use strata_core::{Finding, FindingCategory, FindingLocation, Severity};
use unicode_normalization::UnicodeNormalization;

/// Name and severity of a bidirectional formatting character.
pub fn bidi_control(c: char) -> Option<(&'static str, Severity)> {
    let entry = match c {
        '\u{202D}' => ("LEFT-TO-RIGHT OVERRIDE", Severity::High),
        '\u{202E}' => ("RIGHT-TO-LEFT OVERRIDE", Severity::High),
        '\u{2066}' => ("LEFT-TO-RIGHT ISOLATE", Severity::High),
        '\u{2067}' => ("RIGHT-TO-LEFT ISOLATE", Severity::High),
        '\u{2068}' => ("FIRST STRONG ISOLATE", Severity::High),
        '\u{2069}' => ("POP DIRECTIONAL ISOLATE", Severity::High),
        '\u{202A}' => ("LEFT-TO-RIGHT EMBEDDING", Severity::Medium),
        '\u{202B}' => ("RIGHT-TO-LEFT EMBEDDING", Severity::Medium),
        '\u{202C}' => ("POP DIRECTIONAL FORMATTING", Severity::Medium),
        '\u{200E}' => ("LEFT-TO-RIGHT MARK", Severity::Low),
        '\u{200F}' => ("RIGHT-TO-LEFT MARK", Severity::Low),
        '\u{061C}' => ("ARABIC LETTER MARK", Severity::Low),
        _ => return None,
    };
    Some(entry)
}

/// Name of a zero-width or otherwise invisible character.
pub fn invisible_character(c: char) -> Option<&'static str> {
    match c {
        '\u{200B}' => Some("ZERO WIDTH SPACE"),
        '\u{200C}' => Some("ZERO WIDTH NON-JOINER"),
        '\u{200D}' => Some("ZERO WIDTH JOINER"),
        '\u{2060}' => Some("WORD JOINER"),
        '\u{FEFF}' => Some("ZERO WIDTH NO-BREAK SPACE"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Script {
    Latin,
    Greek,
    Cyrillic,
}

fn script_of(c: char) -> Option<Script> {
    match c {
        'a'..='z' | 'A'..='Z' | '\u{00C0}'..='\u{024F}' => Some(Script::Latin),
        '\u{0370}'..='\u{03FF}' => Some(Script::Greek),
        '\u{0400}'..='\u{04FF}' => Some(Script::Cyrillic),
        _ => None,
    }
}

/// Whether `word` mixes Latin letters with Greek or Cyrillic ones.
pub fn is_mixed_script(word: &str) -> bool {
    let mut latin = false;
    let mut other = false;
    for script in word.chars().filter_map(script_of) {
        match script {
            Script::Latin => latin = true,
            Script::Greek | Script::Cyrillic => other = true,
        }
        if latin && other {
            return true;
        }
    }
    false
}

/// ASCII text a compatibility character folds to under NFKC, if any.
///
/// Fullwidth `Ａ` folds to `A`; plain ASCII and whitespace are ignored.
pub fn ascii_compatibility_form(c: char) -> Option<String> {
    if c.is_ascii() || c.is_whitespace() {
        return None;
    }
    let folded: String = std::iter::once(c).nfkc().collect();
    if folded.is_ascii() && !folded.is_empty() {
        Some(folded)
    } else {
        None
    }
}

/// Mixed-script words reported individually per scanned text. Further
/// words are folded into one summary finding.
pub const MAX_CONFUSABLE_WORDS: usize = 16;

/// Scan `text`, appending one finding per distinct offending character or
/// word, up to [`MAX_CONFUSABLE_WORDS`] words.
pub fn scan_text(text: &str, location: &FindingLocation, findings: &mut Vec<Finding>) {
    if text.is_ascii() {
        return;
    }

    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for c in text.chars() {
        if bidi_control(c).is_some() || invisible_character(c).is_some() {
            *counts.entry(c).or_default() += 1;
        }
    }
    for (c, count) in counts {
        if let Some((name, severity)) = bidi_control(c) {
            findings.push(
                Finding::new(
                    FindingCategory::BidiControl,
                    severity,
                    location.clone(),
                    occurrences(name, c, count),
                )
                .with_rule("unicode.bidi"),
            );
        } else if let Some(name) = invisible_character(c) {
            findings.push(
                Finding::new(
                    FindingCategory::InvisibleCharacter,
                    Severity::Medium,
                    location.clone(),
                    occurrences(name, c, count),
                )
                .with_rule("unicode.invisible"),
            );
        }
    }

    scan_confusables(text, location, findings);
}

fn scan_confusables(text: &str, location: &FindingLocation, findings: &mut Vec<Finding>) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported = 0;
    let mut worst = Severity::Medium;
    for word in text.split_whitespace() {
        if word.is_ascii() || seen.contains(word) || !is_mixed_script(word) {
            continue;
        }
        seen.insert(word);
        let severity = if word.contains(['.', '/', '@']) {
            Severity::High
        } else {
            Severity::Medium
        };
        if reported == MAX_CONFUSABLE_WORDS {
            worst = worst.max(severity);
            continue;
        }
        reported += 1;
        findings.push(
            Finding::new(
                FindingCategory::Confusable,
                severity,
                location.clone(),
                format!("word \"{}\" mixes Latin with Greek or Cyrillic letters", word),
            )
            .with_rule("unicode.mixed-script"),
        );
    }

    let omitted = seen.len() - reported;
    if omitted > 0 {
        findings.push(
            Finding::new(
                FindingCategory::Confusable,
                worst,
                location.clone(),
                format!("{} more words mix Latin with Greek or Cyrillic letters", omitted),
            )
            .with_rule("unicode.mixed-script"),
        );
    }

    let mut folded: BTreeMap<char, String> = BTreeMap::new();
    for c in text.chars() {
        if folded.contains_key(&c) {
            continue;
        }
        if let Some(ascii) = ascii_compatibility_form(c) {
            folded.insert(c, ascii);
        }
    }
    for (c, ascii) in folded {
        findings.push(
            Finding::new(
                FindingCategory::Confusable,
                Severity::Low,
                location.clone(),
                format!("U+{:04X} is a compatibility form of \"{}\"", c as u32, ascii),
            )
            .with_rule("unicode.compatibility"),
        );
    }
}

fn occurrences(name: &str, c: char, count: usize) -> String {
    if count == 1 {
        format!("{} (U+{:04X})", name, c as u32)
    } else {
        format!("{} (U+{:04X}) x{}", name, c as u32, count)
    }
}
