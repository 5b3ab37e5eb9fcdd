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

//! Reference collectors for Strata.
//!
//! These are small, complete [`Collector`](strata_core::Collector)
//! implementations: a heading outline, link and image targets, and token
//! statistics. They double as usage samples for writing collectors.
//!
//! ```
//! use strata_collectors::{HeadingsCollector, LinksCollector, StatsCollector};
//! use strata_core::Collector;
//!
//! let collectors: Vec<Box<dyn Collector>> = vec![
//!     Box::new(HeadingsCollector::new()),
//!     Box::new(LinksCollector::new()),
//!     Box::new(StatsCollector::new()),
//! ];
//! assert_eq!(collectors[1].name(), "links");
//! ```

mod headings;
mod links;
mod stats;

pub use headings::{slugify, Heading, HeadingsCollector};
pub use links::{Link, LinkKind, LinksCollector};
pub use stats::{StatsCollector, TokenStats};

/// The three reference collectors in their usual registration order.
pub fn default_collectors() -> Vec<Box<dyn strata_core::Collector>> {
    vec![
        Box::new(HeadingsCollector::new()),
        Box::new(LinksCollector::new()),
        Box::new(StatsCollector::new()),
    ]
}
