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

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::TagCatalog;
use crate::config::CreationError;

/// A named extraction rule for one dimensional tag.
///
/// When `pattern` is omitted the rule refers to the built-in pattern
/// registered under `name` in the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, schemars::JsonSchema)]
pub struct TagRule {
    /// The name of the tag to extract.
    pub name: String,
    /// The pattern applied to the stat name. Capture group 1 is spliced out
    /// of the name; capture group 2, when present, supplies the tag value.
    #[serde(default, with = "serde_regex", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub pattern: Option<regex::Regex>,
}

impl TagRule {
    pub fn new(name: impl Into<String>, pattern: regex::Regex) -> Self {
        Self {
            name: name.into(),
            pattern: Some(pattern),
        }
    }

    /// A rule resolved from the catalog by name alone.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: None,
        }
    }
}

impl PartialEq for TagRule {
    fn eq(&self, rhs: &Self) -> bool {
        self.name == rhs.name
            && self.pattern.as_ref().map(|regex| regex.as_str())
                == rhs.pattern.as_ref().map(|regex| regex.as_str())
    }
}

/// Checks a custom rule list for structural well-formedness ahead of
/// building a [`TagExtractor`][crate::stats::TagExtractor].
///
/// Rejected here, never at extraction time: empty tag names, any tag name
/// appearing twice across the default and custom lists, rules that neither
/// carry a pattern nor resolve against `catalog`, and patterns without a
/// capture group.
pub fn validate_tag_rules(
    rules: &[TagRule],
    use_defaults: bool,
    catalog: &TagCatalog,
) -> Result<(), CreationError> {
    let mut seen: HashSet<&str> = if use_defaults {
        catalog.names().collect()
    } else {
        HashSet::new()
    };

    for rule in rules {
        if rule.name.is_empty() {
            return Err(CreationError::EmptyTagName);
        }

        if !seen.insert(&rule.name) {
            return Err(CreationError::DuplicateTag(rule.name.clone()));
        }

        match &rule.pattern {
            Some(regex) => {
                if regex.captures_len() < 2 {
                    return Err(CreationError::MissingCaptureGroup {
                        tag: rule.name.clone(),
                        pattern: regex.as_str().into(),
                    });
                }
            }
            None => {
                if catalog.get(&rule.name).is_none() {
                    return Err(CreationError::UnknownDefaultTag(rule.name.clone()));
                }
            }
        }
    }

    Ok(())
}
