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

//! Single-pass dispatch engine.
//!
//! [`DispatchEngine::dispatch_all`] walks a materialized token stream exactly
//! once. For every token it resolves the interested collectors through the
//! [`Registry`], skips those whose `ignore_inside` scopes enclose the token,
//! and invokes the rest under failure isolation: an `Err` or a panic from one
//! collector is recorded as a [`CollectorError`] and dispatch continues.
//!
//! # Ancestor stack
//!
//! Collectors always run before the stack changes. An opening token is not
//! inside itself, so its kind is pushed after its collectors ran; a closing
//! token still sees the scope it closes, so its kind is popped afterwards.
//!
//! `ignore_inside` is evaluated against the ancestors *enclosing* the token's
//! scope. The boundary tokens of an ignored scope therefore behave the same
//! way: the opener of `X` is not inside `X`, and neither is the closer of
//! `X`, so a collector ignoring `X` receives both boundary tokens but none of
//! the tokens between them.
//!
//! # Aborts
//!
//! The parse aborts, and no collector is finalized, when the stack grows past
//! `max_recursion_depth`, when the stream exceeds `max_token_count`, when a
//! closing token does not match the innermost open scope, or when the
//! optional deadline expires.

use crate::collector::{Collector, Fragment};
use crate::context::DispatchContext;
use crate::error::{CollectorError, CollectorFailure, CollectorResult};
use crate::finding::Finding;
use crate::profile::SecurityProfile;
use crate::registry::Registry;
use crate::token::{Nesting, Token};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, warn};

/// Default number of tokens between two deadline checks.
pub const DEFAULT_DEADLINE_CHECK_INTERVAL: usize = 1024;

/// Hook invoked once per token, before collectors, to scan token content.
///
/// Inspectors are pure with respect to the parse: they only append findings.
pub trait TokenInspector {
    fn inspect(
        &self,
        index: usize,
        token: &Token,
        ctx: &DispatchContext<'_>,
        findings: &mut Vec<Finding>,
    );
}

/// Inspector that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInspection;

impl TokenInspector for NoInspection {
    fn inspect(&self, _: usize, _: &Token, _: &DispatchContext<'_>, _: &mut Vec<Finding>) {}
}

/// Why dispatch stopped before the end of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbortReason {
    /// The ancestor stack grew past the profile limit.
    RecursionDepth { index: usize, depth: usize, limit: usize },
    /// The tokenizer produced more tokens than the profile allows.
    TokenBudget { count: usize, limit: usize },
    /// A closing token did not match the innermost open scope.
    UnbalancedNesting { index: usize, kind: String },
    /// The caller's deadline expired.
    Deadline { index: usize },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecursionDepth { index, depth, limit } => write!(
                f,
                "nesting depth {} exceeds limit {} at token {}",
                depth, limit, index
            ),
            Self::TokenBudget { count, limit } => {
                write!(f, "token count {} exceeds limit {}", count, limit)
            }
            Self::UnbalancedNesting { index, kind } => {
                write!(f, "unbalanced closing token '{}' at index {}", kind, index)
            }
            Self::Deadline { index } => write!(f, "deadline expired at token {}", index),
        }
    }
}

/// Result of one dispatch pass.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub abort: Option<AbortReason>,
    pub tokens_visited: usize,
    pub collector_errors: Vec<CollectorError>,
    pub findings: Vec<Finding>,
}

impl DispatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.abort.is_none()
    }
}

/// Result of finalizing every collector.
#[derive(Debug, Default)]
pub struct FinalizeOutcome {
    /// Fragments in registration order, keyed by collector name.
    pub fragments: Vec<(String, Fragment)>,
    pub errors: Vec<CollectorError>,
}

/// Walks token streams and routes tokens to collectors.
#[derive(Debug, Clone)]
pub struct DispatchEngine<'r> {
    registry: &'r Registry,
    deadline: Option<Instant>,
    check_interval: usize,
}

impl<'r> DispatchEngine<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            deadline: None,
            check_interval: DEFAULT_DEADLINE_CHECK_INTERVAL,
        }
    }

    /// Abort dispatch once `deadline` passes, checked every `interval`
    /// tokens (minimum 1).
    pub fn with_deadline(mut self, deadline: Option<Instant>, interval: usize) -> Self {
        self.deadline = deadline;
        self.check_interval = interval.max(1);
        self
    }

    /// Dispatch every token exactly once.
    ///
    /// `collectors` must be the list the registry was built from (see
    /// [`Registry::verify`]); positions the registry names but the slice lacks
    /// are skipped.
    pub fn dispatch_all(
        &self,
        tokens: &[Token],
        source: &str,
        profile: &SecurityProfile,
        collectors: &mut [Box<dyn Collector>],
        inspector: &dyn TokenInspector,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for collector in collectors.iter_mut() {
            let result = isolate(|| {
                collector.reset();
                Ok(())
            });
            if let Err(failure) = result {
                warn!(collector = collector.name(), error = %failure, "collector reset failed");
                outcome
                    .collector_errors
                    .push(CollectorError::reset(collector.name(), &failure));
            }
        }

        if tokens.len() > profile.max_token_count {
            let reason = AbortReason::TokenBudget {
                count: tokens.len(),
                limit: profile.max_token_count,
            };
            warn!(%reason, "dispatch aborted");
            outcome.abort = Some(reason);
            return outcome;
        }

        let mut ctx = DispatchContext::new(tokens, source, profile);
        let mut candidates = Vec::new();

        for (index, token) in tokens.iter().enumerate() {
            if let Some(deadline) = self.deadline {
                if index % self.check_interval == 0 && Instant::now() >= deadline {
                    outcome.abort = Some(AbortReason::Deadline { index });
                    break;
                }
            }

            ctx.enter(index, token);

            if token.nesting == Nesting::Close && ctx.parent_kind() != Some(token.kind.as_str()) {
                outcome.abort = Some(AbortReason::UnbalancedNesting {
                    index,
                    kind: token.kind.clone(),
                });
                break;
            }

            inspector.inspect(index, token, &ctx, &mut outcome.findings);

            self.registry.candidates_into(token, &mut candidates);
            let ancestors = ctx.ancestors();
            let enclosing = match token.nesting {
                Nesting::Close => &ancestors[..ancestors.len() - 1],
                _ => ancestors,
            };

            for &position in &candidates {
                let Some(interest) = self.registry.interest(position) else {
                    continue;
                };
                if interest.suppressed_by(enclosing) || !interest.accepts(token) {
                    continue;
                }
                let Some(collector) = collectors.get_mut(position) else {
                    continue;
                };

                let result = isolate(|| {
                    if collector.should_process(token, &ctx) {
                        collector.on_token(index, token, &ctx)
                    } else {
                        Ok(())
                    }
                });
                if let Err(failure) = result {
                    warn!(
                        collector = collector.name(),
                        token_index = index,
                        error = %failure,
                        "collector failed"
                    );
                    outcome
                        .collector_errors
                        .push(CollectorError::on_token(collector.name(), index, &failure));
                }
            }

            outcome.tokens_visited += 1;

            match token.nesting {
                Nesting::Open => {
                    ctx.push(index, &token.kind);
                    if ctx.depth() > profile.max_recursion_depth {
                        outcome.abort = Some(AbortReason::RecursionDepth {
                            index,
                            depth: ctx.depth(),
                            limit: profile.max_recursion_depth,
                        });
                        break;
                    }
                }
                Nesting::Close => {
                    ctx.pop();
                }
                Nesting::SelfClosing => {}
            }
        }

        match &outcome.abort {
            Some(reason) => warn!(%reason, visited = outcome.tokens_visited, "dispatch aborted"),
            None => debug!(
                visited = outcome.tokens_visited,
                errors = outcome.collector_errors.len(),
                "dispatch complete"
            ),
        }

        outcome
    }

    /// Finalize every collector in registration order.
    ///
    /// Returns `None`, without calling any `finalize`, when `outcome` is an
    /// aborted dispatch.
    pub fn finalize_all(
        &self,
        outcome: &DispatchOutcome,
        collectors: &mut [Box<dyn Collector>],
    ) -> Option<FinalizeOutcome> {
        if !outcome.is_complete() {
            return None;
        }

        let mut finalized = FinalizeOutcome::default();
        for collector in collectors.iter_mut() {
            match isolate(|| collector.finalize()) {
                Ok(fragment) => finalized
                    .fragments
                    .push((collector.name().to_string(), fragment)),
                Err(failure) => {
                    warn!(collector = collector.name(), error = %failure, "finalize failed");
                    finalized
                        .errors
                        .push(CollectorError::finalize(collector.name(), &failure));
                }
            }
        }
        Some(finalized)
    }
}

/// Run a collector callback, converting panics into failures.
fn isolate<T>(f: impl FnOnce() -> CollectorResult<T>) -> CollectorResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(CollectorFailure::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
