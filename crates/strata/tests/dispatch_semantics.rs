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

//! Dispatch guarantees observed through the public `parse` entry point:
//! visitation order, ancestor stacks, `ignore_inside` scoping, failure
//! isolation and finalize ordering.

use serde_json::json;
use std::time::Duration;
use strata::{
    parse, AbortReason, Collector, CollectorPhase, Interest, Nesting, ParseOptions, ParseStatus,
    Token,
};
use strata_test::fixtures::{self, collectors::FinalizeLog};
use strata_test::{
    FailingCollector, FixedTokenizer, PanickingCollector, RecordingCollector, SpyTokenizer,
    TokenStreamBuilder,
};

fn run(tokens: Vec<Token>, collectors: &mut [Box<dyn Collector>]) -> strata::ParseResult {
    parse(
        "source",
        &FixedTokenizer(tokens),
        collectors,
        &ParseOptions::default(),
    )
    .unwrap()
}

// ==================== Visitation tests ====================

#[test]
fn test_every_token_visited_once_in_order() {
    let recorder = RecordingCollector::any("all");
    let visits = recorder.visits();
    let mut collectors = vec![recorder.boxed()];
    let tokens = fixtures::quoted_and_plain();
    let count = tokens.len();

    let result = run(tokens, &mut collectors);

    assert_eq!(result.status, ParseStatus::Completed);
    let indices: Vec<usize> = visits.lock().unwrap().iter().map(|v| v.index).collect();
    assert_eq!(indices, (0..count).collect::<Vec<_>>());
    assert_eq!(result.diagnostics.tokens_visited, count);
}

#[test]
fn test_ancestor_stack_on_nested_fixture() {
    let recorder = RecordingCollector::any("all");
    let visits = recorder.visits();
    let mut collectors = vec![recorder.boxed()];

    run(fixtures::quoted_and_plain(), &mut collectors);

    let stacks: Vec<Vec<String>> = visits
        .lock()
        .unwrap()
        .iter()
        .map(|v| v.ancestors.clone())
        .collect();
    let expected: Vec<Vec<&str>> = vec![
        vec![],
        vec!["blockquote"],
        vec!["blockquote", "paragraph"],
        vec!["blockquote", "paragraph"],
        vec!["blockquote"],
        vec![],
        vec!["paragraph"],
        vec!["paragraph"],
    ];
    assert_eq!(stacks, expected);
}

#[test]
fn test_routing_by_type_and_tag() {
    let log = Default::default();
    let by_type = RecordingCollector::new("by-type", Interest::types(["text"])).with_visit_log(&log);
    let by_tag = RecordingCollector::new("by-tag", Interest::tags(["h2"])).with_visit_log(&log);
    let mut collectors = vec![by_type.boxed(), by_tag.boxed()];
    let (_, tokens) = fixtures::two_headings();

    run(tokens, &mut collectors);

    let seen: Vec<(String, usize)> = log
        .lock()
        .unwrap()
        .iter()
        .map(|v| (v.collector.clone(), v.index))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("by-type".to_string(), 1),
            ("by-type".to_string(), 4),
            ("by-tag".to_string(), 6),
            ("by-type".to_string(), 7),
            ("by-tag".to_string(), 8),
            ("by-type".to_string(), 10),
        ]
    );
}

// ==================== ignore_inside tests ====================

#[test]
fn test_ignore_inside_skips_nested_tokens() {
    let recorder = RecordingCollector::new("outside", Interest::any().ignoring(["blockquote"]));
    let visits = recorder.visits();
    let mut collectors = vec![recorder.boxed()];

    run(fixtures::quoted_and_plain(), &mut collectors);

    let indices: Vec<usize> = visits.lock().unwrap().iter().map(|v| v.index).collect();
    // The blockquote's own boundary tokens (0 and 4) are not inside it.
    assert_eq!(indices, vec![0, 4, 5, 6, 7]);
}

#[test]
fn test_ignore_inside_closing_token_sees_full_chain() {
    let recorder = RecordingCollector::new(
        "quotes",
        Interest::types(["blockquote"]).ignoring(["blockquote"]),
    );
    let visits = recorder.visits();
    let mut collectors = vec![recorder.boxed()];

    run(fixtures::quoted_and_plain(), &mut collectors);

    let visits = visits.lock().unwrap();
    assert_eq!(visits.len(), 2);
    assert_eq!(visits[0].nesting, Nesting::Open);
    assert!(visits[0].ancestors.is_empty());
    assert_eq!(visits[1].nesting, Nesting::Close);
    assert_eq!(visits[1].ancestors, vec!["blockquote".to_string()]);
}

#[test]
fn test_ignore_inside_nested_same_kind() {
    // A quote inside a quote is inside the outer one.
    let tokens = fixtures::nested_blockquotes(2);
    let recorder = RecordingCollector::new(
        "quotes",
        Interest::types(["blockquote"]).ignoring(["blockquote"]),
    );
    let visits = recorder.visits();
    let mut collectors = vec![recorder.boxed()];

    run(tokens, &mut collectors);

    let indices: Vec<usize> = visits.lock().unwrap().iter().map(|v| v.index).collect();
    assert_eq!(indices, vec![0, 4]);
}

// ==================== Failure isolation tests ====================

#[test]
fn test_failing_collector_does_not_stop_others() {
    let recorder = RecordingCollector::any("after");
    let visits = recorder.visits();
    let mut collectors = vec![FailingCollector::new("failing", [2]).boxed(), recorder.boxed()];

    let result = run(fixtures::quoted_and_plain(), &mut collectors);

    assert_eq!(result.status, ParseStatus::Completed);
    assert_eq!(visits.lock().unwrap().len(), 8);
    let errors = &result.diagnostics.collector_errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].collector_name, "failing");
    assert_eq!(errors[0].token_index, Some(2));
    assert_eq!(errors[0].phase, CollectorPhase::OnToken);
    assert_eq!(errors[0].description, "unexpected token 'text' at index 2");
    assert_eq!(result.fragment("after"), Some(&json!({ "visits": 8 })));
    assert_eq!(result.fragment("failing"), Some(&json!(null)));
}

#[test]
fn test_panicking_collector_is_isolated() {
    let recorder = RecordingCollector::any("after");
    let visits = recorder.visits();
    let mut collectors = vec![PanickingCollector::at("panicky", 3).boxed(), recorder.boxed()];

    let result = run(fixtures::quoted_and_plain(), &mut collectors);

    assert_eq!(result.status, ParseStatus::Completed);
    assert_eq!(visits.lock().unwrap().len(), 8);
    let errors = &result.diagnostics.collector_errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].collector_name, "panicky");
    assert_eq!(errors[0].token_index, Some(3));
    assert!(errors[0].description.contains("panicky exploded at token 3"));
}

#[test]
fn test_finalize_failures_recorded_separately() {
    let mut collectors = vec![
        FailingCollector::new("refuses", []).failing_finalize().boxed(),
        PanickingCollector::in_finalize("explodes").boxed(),
        RecordingCollector::any("fine").boxed(),
    ];

    let result = run(fixtures::quoted_and_plain(), &mut collectors);

    assert_eq!(result.status, ParseStatus::Completed);
    assert!(result.diagnostics.collector_errors.is_empty());
    let names: Vec<&str> = result
        .diagnostics
        .finalize_errors
        .iter()
        .map(|e| e.collector_name.as_str())
        .collect();
    assert_eq!(names, vec!["refuses", "explodes"]);
    assert!(result
        .diagnostics
        .finalize_errors
        .iter()
        .all(|e| e.phase == CollectorPhase::Finalize && e.token_index.is_none()));
    let structure = result.structure.unwrap();
    assert_eq!(structure.keys().collect::<Vec<_>>(), vec!["fine"]);
}

// ==================== Finalize tests ====================

#[test]
fn test_finalize_runs_once_in_registration_order() {
    let log: FinalizeLog = Default::default();
    let mut collectors = vec![
        RecordingCollector::any("zeta").with_finalize_log(&log).boxed(),
        RecordingCollector::any("alpha").with_finalize_log(&log).boxed(),
        RecordingCollector::any("mid").with_finalize_log(&log).boxed(),
    ];

    run(fixtures::quoted_and_plain(), &mut collectors);

    assert_eq!(*log.lock().unwrap(), vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_state_reset_between_parses() {
    let mut collectors = vec![RecordingCollector::any("all").boxed()];

    let first = run(fixtures::quoted_and_plain(), &mut collectors);
    let second = run(fixtures::quoted_and_plain(), &mut collectors);

    assert_eq!(first.fragment("all"), Some(&json!({ "visits": 8 })));
    assert_eq!(second.fragment("all"), Some(&json!({ "visits": 8 })));
}

#[test]
fn test_duplicate_names_rejected_at_registration() {
    let spy = SpyTokenizer::new(Vec::new());
    let mut collectors = vec![
        RecordingCollector::any("same").boxed(),
        RecordingCollector::any("same").boxed(),
    ];

    let err = parse("x", &spy, &mut collectors, &ParseOptions::default()).unwrap_err();

    assert!(matches!(err, strata::StrataError::Registry(_)));
    assert_eq!(spy.calls(), 0);
}

// ==================== Abort tests ====================

#[test]
fn test_token_budget_aborts_before_dispatch() {
    let log: FinalizeLog = Default::default();
    let mut collectors = vec![RecordingCollector::any("all").with_finalize_log(&log).boxed()];
    let opts = ParseOptions::builder().max_token_count(5).build();

    let result = parse(
        "x",
        &FixedTokenizer(fixtures::quoted_and_plain()),
        &mut collectors,
        &opts,
    )
    .unwrap();

    assert_eq!(result.status, ParseStatus::RecursionAborted);
    assert_eq!(
        result.diagnostics.abort_reason,
        Some(AbortReason::TokenBudget { count: 8, limit: 5 })
    );
    assert_eq!(result.diagnostics.tokens_visited, 0);
    assert_eq!(result.diagnostics.token_count, Some(8));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_unbalanced_stream_aborts() {
    let tokens = TokenStreamBuilder::new()
        .open("list")
        .token(Token::close("table"))
        .build();
    let mut collectors = vec![RecordingCollector::any("all").boxed()];

    let result = run(tokens, &mut collectors);

    assert_eq!(result.status, ParseStatus::RecursionAborted);
    assert_eq!(
        result.diagnostics.abort_reason,
        Some(AbortReason::UnbalancedNesting {
            index: 1,
            kind: "table".to_string(),
        })
    );
    assert!(result.structure.is_none());
}

#[test]
fn test_expired_deadline_aborts() {
    let log: FinalizeLog = Default::default();
    let mut collectors = vec![RecordingCollector::any("all").with_finalize_log(&log).boxed()];
    let opts = ParseOptions::builder()
        .timeout(Duration::ZERO)
        .deadline_check_interval(1)
        .build();

    let result = parse(
        "x",
        &FixedTokenizer(fixtures::quoted_and_plain()),
        &mut collectors,
        &opts,
    )
    .unwrap();

    assert_eq!(result.status, ParseStatus::RecursionAborted);
    assert_eq!(
        result.diagnostics.abort_reason,
        Some(AbortReason::Deadline { index: 0 })
    );
    assert!(result.structure.is_none());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_generous_deadline_completes() {
    let mut collectors = vec![RecordingCollector::any("all").boxed()];
    let opts = ParseOptions::builder().timeout(Duration::from_secs(60)).build();

    let result = parse(
        "x",
        &FixedTokenizer(fixtures::quoted_and_plain()),
        &mut collectors,
        &opts,
    )
    .unwrap();

    assert_eq!(result.status, ParseStatus::Completed);
}
