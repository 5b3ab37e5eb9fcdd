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

//! Error types for Strata.
//!
//! Nothing in this module escapes a parse call as an `Err`: registry and
//! profile errors are configuration errors reported before a parse starts,
//! and collector failures are captured by the dispatch engine and recorded
//! as [`CollectorError`] diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Invalid security profile configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("unknown security profile '{0}' (expected strict, moderate or permissive)")]
    UnknownProfile(String),

    #[error("profile limit {0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("invalid scheme '{0}' in allow-list")]
    InvalidScheme(String),
}

/// Invalid collector registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("collector name must not be empty (position {position})")]
    EmptyName { position: usize },

    #[error("duplicate collector name '{name}' at positions {first} and {second}")]
    DuplicateName {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("registry does not match collectors: expected {expected:?}, got {actual:?}")]
    Mismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Failure reported by a collector from `on_token` or `finalize`.
#[derive(Debug, Error)]
pub enum CollectorFailure {
    #[error("{0}")]
    Message(String),

    #[error("unexpected token '{kind}' at index {index}")]
    UnexpectedToken { kind: String, index: usize },

    #[error("fragment serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("collector panicked: {0}")]
    Panic(String),
}

impl CollectorFailure {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Result type for collector callbacks.
pub type CollectorResult<T> = Result<T, CollectorFailure>;

/// Result type for registry construction.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for profile validation.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Which collector callback failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorPhase {
    Reset,
    OnToken,
    Finalize,
}

/// A captured collector failure, recorded in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorError {
    pub collector_name: String,
    /// Index of the triggering token (`None` for finalize failures).
    pub token_index: Option<usize>,
    pub phase: CollectorPhase,
    pub description: String,
}

impl CollectorError {
    pub fn on_token(collector_name: &str, token_index: usize, failure: &CollectorFailure) -> Self {
        Self {
            collector_name: collector_name.to_string(),
            token_index: Some(token_index),
            phase: CollectorPhase::OnToken,
            description: failure.to_string(),
        }
    }

    pub fn finalize(collector_name: &str, failure: &CollectorFailure) -> Self {
        Self {
            collector_name: collector_name.to_string(),
            token_index: None,
            phase: CollectorPhase::Finalize,
            description: failure.to_string(),
        }
    }

    pub fn reset(collector_name: &str, failure: &CollectorFailure) -> Self {
        Self {
            collector_name: collector_name.to_string(),
            token_index: None,
            phase: CollectorPhase::Reset,
            description: failure.to_string(),
        }
    }
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.phase, self.token_index) {
            (CollectorPhase::OnToken, Some(index)) => write!(
                f,
                "collector '{}' failed at token {}: {}",
                self.collector_name, index, self.description
            ),
            (CollectorPhase::Reset, _) => write!(
                f,
                "collector '{}' failed to reset: {}",
                self.collector_name, self.description
            ),
            _ => write!(
                f,
                "collector '{}' failed to finalize: {}",
                self.collector_name, self.description
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ProfileError tests ====================

    #[test]
    fn test_profile_error_display() {
        let err = ProfileError::ZeroLimit("max_line_count");
        assert_eq!(err.to_string(), "profile limit max_line_count must be greater than zero");

        let err = ProfileError::UnknownProfile("lax".to_string());
        assert!(err.to_string().contains("'lax'"));
    }

    // ==================== RegistryError tests ====================

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::DuplicateName {
            name: "headings".to_string(),
            first: 0,
            second: 2,
        };
        assert_eq!(
            err.to_string(),
            "duplicate collector name 'headings' at positions 0 and 2"
        );
    }

    // ==================== CollectorFailure tests ====================

    #[test]
    fn test_collector_failure_msg() {
        let failure = CollectorFailure::msg("boom");
        assert_eq!(failure.to_string(), "boom");
    }

    #[test]
    fn test_collector_failure_unexpected_token() {
        let failure = CollectorFailure::UnexpectedToken {
            kind: "table".to_string(),
            index: 9,
        };
        assert_eq!(failure.to_string(), "unexpected token 'table' at index 9");
    }

    #[test]
    fn test_collector_failure_from_serde() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let failure: CollectorFailure = err.into();
        assert!(matches!(failure, CollectorFailure::Serialize(_)));
    }

    // ==================== CollectorError tests ====================

    #[test]
    fn test_collector_error_on_token() {
        let err = CollectorError::on_token("links", 4, &CollectorFailure::msg("bad href"));
        assert_eq!(err.collector_name, "links");
        assert_eq!(err.token_index, Some(4));
        assert_eq!(err.phase, CollectorPhase::OnToken);
        assert_eq!(err.to_string(), "collector 'links' failed at token 4: bad href");
    }

    #[test]
    fn test_collector_error_finalize() {
        let err = CollectorError::finalize("stats", &CollectorFailure::msg("overflow"));
        assert_eq!(err.token_index, None);
        assert_eq!(err.phase, CollectorPhase::Finalize);
        assert!(err.to_string().contains("failed to finalize"));
    }

    #[test]
    fn test_collector_error_reset() {
        let err = CollectorError::reset("stats", &CollectorFailure::Panic("poisoned".to_string()));
        assert_eq!(err.phase, CollectorPhase::Reset);
        assert_eq!(
            err.to_string(),
            "collector 'stats' failed to reset: collector panicked: poisoned"
        );
    }
}
