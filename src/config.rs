/*
 * Copyright 2024 Google LLC
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Loading, validating, and publishing telemetry policy configuration.

mod error;
mod slot;

use std::io;

use serde::{Deserialize, Serialize};

use crate::{
    access_log::{AccessLogFilter, FilterConfig},
    stats::{TagExtractor, TagRule},
};

pub use self::{error::CreationError, slot::Slot};
#[doc(inline)]
pub use crate::{access_log::validate_filter, stats::validate_tag_rules};

/// The top-level configuration document for both policy engines.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub stats: StatsConfig,
    /// The access-log filter expression; absent means every entry is
    /// emitted. Filter nodes are written as single-key maps, so the field
    /// opts out of serde_yaml's `!Tag` enum notation.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    #[schemars(with = "Option<FilterConfig>")]
    pub access_log: Option<FilterConfig>,
}

/// Tag extraction configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StatsConfig {
    /// Whether the built-in catalog runs ahead of the custom rules.
    #[serde(default = "default_use_all_default_tags")]
    pub use_all_default_tags: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagRule>,
}

fn default_use_all_default_tags() -> bool {
    true
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            use_all_default_tags: true,
            tags: Vec::new(),
        }
    }
}

impl Config {
    /// Reads a YAML configuration document.
    pub fn from_reader<R: io::Read>(input: R) -> Result<Self, CreationError> {
        serde_yaml::from_reader(input).map_err(From::from)
    }

    /// Validates the document and builds both engines.
    ///
    /// All-or-nothing: any validation failure leaves no partially built
    /// engine behind. The host decides whether to abort startup or keep
    /// the previously published [`Policy`].
    pub fn build(self) -> Result<Policy, CreationError> {
        let extractor = TagExtractor::build(self.stats.tags, self.stats.use_all_default_tags)?;
        let filter = self.access_log.map(AccessLogFilter::build).transpose()?;

        Ok(Policy { extractor, filter })
    }
}

/// The immutable engine pair built from one validated [`Config`].
///
/// Typically placed in a [`Slot`] so configuration reloads swap a freshly
/// built pair in atomically; readers never observe a partially built one.
pub struct Policy {
    pub extractor: TagExtractor,
    pub filter: Option<AccessLogFilter>,
}
