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

//! Registry reuse across parses and threads.

use std::sync::Arc;
use strata::{parse_with_registry, ParseOptions, ParseStatus, Registry, RegistryError, StrataError};
use strata_collectors::{default_collectors, HeadingsCollector, LinksCollector};
use strata_test::LineTokenizer;

const DOCUMENT: &str = "# One\n\nSee [a](https://a.example) and [b](mailto:b@example.com).\n\n\
                        ## Two\n\n- item\n";

#[test]
fn test_registry_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Registry>();
    assert_send_sync::<Arc<Registry>>();
}

#[test]
fn test_shared_registry_across_threads() {
    let registry = Arc::new(Registry::build(&default_collectors()).unwrap());
    let options = ParseOptions::default();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let options = &options;
                scope.spawn(move || {
                    let mut collectors = default_collectors();
                    parse_with_registry(DOCUMENT, &LineTokenizer, &registry, &mut collectors, options)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in &results {
        assert_eq!(result.status, ParseStatus::Completed);
        assert_eq!(result.structure, results[0].structure);
    }
    let headings = results[0].fragment("headings").unwrap().as_array().unwrap();
    assert_eq!(headings.len(), 2);
    assert_eq!(results[0].fragment("links").unwrap().as_array().unwrap().len(), 2);
}

#[test]
fn test_registry_reused_for_sequential_parses() {
    let mut collectors = default_collectors();
    let registry = Arc::new(Registry::build(&collectors).unwrap());

    for _ in 0..3 {
        let result = parse_with_registry(
            DOCUMENT,
            &LineTokenizer,
            &registry,
            &mut collectors,
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(result.fragment("headings").unwrap().as_array().unwrap().len(), 2);
    }
}

#[test]
fn test_mismatched_registry_rejected() {
    let registered: Vec<Box<dyn strata::Collector>> = vec![
        Box::new(HeadingsCollector::new()),
        Box::new(LinksCollector::new()),
    ];
    let registry = Arc::new(Registry::build(&registered).unwrap());
    let mut swapped: Vec<Box<dyn strata::Collector>> = vec![
        Box::new(LinksCollector::new()),
        Box::new(HeadingsCollector::new()),
    ];

    let err = parse_with_registry(
        DOCUMENT,
        &LineTokenizer,
        &registry,
        &mut swapped,
        &ParseOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        StrataError::Registry(RegistryError::Mismatch { .. })
    ));
}
