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

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CreationError;

/// The well-known tag names and their extraction patterns.
///
/// Order matters: patterns are applied top to bottom, each one against the
/// name left over by the previous match, so the more specific patterns for a
/// stat family come before that family's broad prefix pattern.
pub static DEFAULT_TAGS: &[(&str, &str)] = &[
    ("envoy.response_code_class", r"_rq(_(\dxx))$"),
    ("envoy.response_code", r"_rq(_(\d{3}))$"),
    (
        "envoy.http_user_agent",
        r"^http\.(?:.*?\.)?user_agent\.((.+?)\.)\w+?$",
    ),
    (
        "envoy.fault_downstream_cluster",
        r"^http\.(?:.*?\.)?fault\.((.+?)\.)",
    ),
    ("envoy.http_conn_manager_prefix", r"^http\.((.+?)\.)"),
    ("envoy.cluster_name", r"^cluster\.((.+?)\.)"),
    ("envoy.listener_address", r"^listener\.((.+?)\.)"),
    ("envoy.grpc_bridge_method", r"^grpc\.[^.]+\.((.+?)\.)"),
    ("envoy.grpc_bridge_service", r"^grpc\.((.+?)\.)"),
    (
        "envoy.virtual_cluster",
        r"^vhost\.[^.]+\.vcluster\.((.+?)\.)",
    ),
    ("envoy.virtual_host", r"^vhost\.((.+?)\.)"),
    ("envoy.mongo_prefix", r"^mongo\.((.+?)\.)"),
    ("envoy.ratelimit_prefix", r"^ratelimit\.((.+?)\.)"),
    ("envoy.tcp_prefix", r"^tcp\.((.+?)\.)"),
    ("envoy.clientssl_prefix", r"^auth\.clientssl\.((.+?)\.)"),
    ("envoy.ssl_cipher", r"ssl\.cipher(\.(.+))$"),
];

static DEFAULT_CATALOG: Lazy<TagCatalog> =
    Lazy::new(|| TagCatalog::new(DEFAULT_TAGS).expect("built-in tag patterns are valid"));

/// The process-wide catalog built from [`DEFAULT_TAGS`].
pub fn default_catalog() -> &'static TagCatalog {
    &DEFAULT_CATALOG
}

/// An immutable table of well-known tag names mapped to extraction patterns.
///
/// Consulted by [`TagExtractor`][crate::stats::TagExtractor] when a rule
/// names a tag without supplying its own pattern. Passed explicitly into
/// builds so tests can substitute a reduced catalog.
#[derive(Debug)]
pub struct TagCatalog {
    entries: Vec<(String, Regex)>,
}

impl TagCatalog {
    /// Compiles `pairs` of tag name and pattern into a catalog.
    ///
    /// Every pattern must compile and contain at least one capture group,
    /// and names must be unique.
    pub fn new(pairs: &[(&str, &str)]) -> Result<Self, CreationError> {
        let mut entries = Vec::with_capacity(pairs.len());

        for (name, pattern) in pairs {
            if entries.iter().any(|(existing, _)| existing == name) {
                return Err(CreationError::DuplicateTag((*name).into()));
            }

            let regex = Regex::new(pattern).map_err(|error| CreationError::InvalidPattern {
                tag: (*name).into(),
                reason: error.to_string(),
            })?;

            if regex.captures_len() < 2 {
                return Err(CreationError::MissingCaptureGroup {
                    tag: (*name).into(),
                    pattern: (*pattern).into(),
                });
            }

            entries.push(((*name).into(), regex));
        }

        Ok(Self { entries })
    }

    /// Returns the pattern registered for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Regex> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, regex)| regex)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &Regex)> {
        self.entries
            .iter()
            .map(|(name, regex)| (name.as_str(), regex))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_compiles() {
        let catalog = default_catalog();
        assert_eq!(DEFAULT_TAGS.len(), catalog.len());
        assert!(catalog.get("envoy.cluster_name").is_some());
        assert!(catalog.get("envoy.http_user_agent").is_some());
        assert!(catalog.get("made.up.tag").is_none());
    }

    #[test]
    fn every_default_has_a_capture_group() {
        for (name, regex) in default_catalog().entries() {
            assert!(regex.captures_len() >= 2, "{name} has no capture group");
        }
    }

    #[test]
    fn rejects_duplicate_names() {
        assert!(matches!(
            TagCatalog::new(&[("tag", r"^a(b)"), ("tag", r"^c(d)")]),
            Err(CreationError::DuplicateTag(name)) if name == "tag"
        ));
    }

    #[test]
    fn rejects_captureless_pattern() {
        assert!(matches!(
            TagCatalog::new(&[("tag", r"^cluster\.")]),
            Err(CreationError::MissingCaptureGroup { tag, pattern })
                if tag == "tag" && pattern == r"^cluster\."
        ));
    }

    #[test]
    fn rejects_invalid_pattern() {
        assert!(matches!(
            TagCatalog::new(&[("tag", "((")]),
            Err(CreationError::InvalidPattern { .. })
        ));
    }
}
