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

//! Configuration errors.
//!
//! Parse outcomes (rejection, abort, collector failures) are reported in the
//! [`ParseResult`](crate::ParseResult). Only a misconfigured call, one that
//! could never succeed regardless of the content, is an `Err`.

use strata_core::{ProfileError, RegistryError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StrataError {
    #[error("invalid security profile: {0}")]
    Profile(#[from] ProfileError),

    #[error("invalid collector registration: {0}")]
    Registry(#[from] RegistryError),
}

/// Result type for parse entry points.
pub type StrataResult<T> = Result<T, StrataError>;
