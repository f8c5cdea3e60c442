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

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use super::{config::validate_tag_rules, default_catalog, TagCatalog, TagRule};
use crate::config::CreationError;

/// The outcome of running one stat name through the rule list: the name
/// with all matched capture text removed, and the tags pulled out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub tag_extracted_name: String,
    pub tags: HashMap<String, String>,
}

struct Rule {
    name: String,
    regex: Regex,
}

/// Extracts dimensional tags from flat metric names.
///
/// Built once from an ordered rule list and immutable afterwards, so a
/// single instance is shared by reference across concurrent callers.
/// [`extract`][Self::extract] is total; a name matching no rule passes
/// through unchanged.
///
/// Rule order is an observable contract: each rule's pattern runs against
/// the name as already shortened by the rules before it. Rule patterns are
/// not vetted for pathological backtracking cost; that risk belongs to
/// whoever authors the configuration.
pub struct TagExtractor {
    rules: Vec<Rule>,
    metrics: super::metrics::Metrics,
}

impl TagExtractor {
    /// Builds an extractor from `custom_rules` against the process default
    /// catalog. With `use_defaults` the effective rule list is the full
    /// catalog followed by `custom_rules`, in that order.
    pub fn build(custom_rules: Vec<TagRule>, use_defaults: bool) -> Result<Self, CreationError> {
        Self::with_catalog(custom_rules, use_defaults, default_catalog())
    }

    /// Builds an extractor against an explicit catalog.
    pub fn with_catalog(
        custom_rules: Vec<TagRule>,
        use_defaults: bool,
        catalog: &TagCatalog,
    ) -> Result<Self, CreationError> {
        validate_tag_rules(&custom_rules, use_defaults, catalog)?;

        let mut rules = Vec::new();
        if use_defaults {
            rules.extend(catalog.entries().map(|(name, regex)| Rule {
                name: name.into(),
                regex: regex.clone(),
            }));
        }

        for rule in custom_rules {
            let regex = match rule.pattern {
                Some(regex) => regex,
                // Resolvability was checked by `validate_tag_rules`.
                None => catalog
                    .get(&rule.name)
                    .ok_or_else(|| CreationError::UnknownDefaultTag(rule.name.clone()))?
                    .clone(),
            };

            rules.push(Rule {
                name: rule.name,
                regex,
            });
        }

        Ok(Self {
            rules,
            metrics: super::metrics::Metrics::new()?,
        })
    }

    /// Runs `stat_name` through the rule list in order.
    ///
    /// Each matching rule records `tags[rule.name]` from capture group 2
    /// when present, group 1 otherwise, and splices the full text of group
    /// 1 out of the working name before the next rule runs.
    pub fn extract(&self, stat_name: &str) -> ExtractionResult {
        let mut name = stat_name.to_owned();
        let mut tags = HashMap::new();

        for rule in &self.rules {
            let removed = match rule.regex.captures(&name).and_then(|captures| {
                let removed = captures.get(1)?;
                let value = captures.get(2).unwrap_or(removed);
                Some((removed.range(), value.as_str().to_owned()))
            }) {
                Some((range, value)) => {
                    debug!(tag = %rule.name, %value, "extracted tag");
                    tags.insert(rule.name.clone(), value);
                    self.metrics.tags_extracted_total.inc();
                    range
                }
                None => continue,
            };

            let mut shortened = String::with_capacity(name.len() - removed.len());
            shortened.push_str(&name[..removed.start]);
            shortened.push_str(&name[removed.end..]);
            name = shortened;
        }

        ExtractionResult {
            tag_extracted_name: name,
            tags,
        }
    }

    /// The number of rules in the effective list.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::*;

    fn rule(name: &str, pattern: &str) -> TagRule {
        TagRule::new(name, Regex::new(pattern).unwrap())
    }

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).into(), (*value).into()))
            .collect()
    }

    #[test]
    #[traced_test]
    fn extracts_cluster_name() {
        let extractor = TagExtractor::build(
            vec![rule("envoy.cluster_name", r"^cluster\.((.+?)\.)")],
            false,
        )
        .unwrap();

        let result = extractor.extract("cluster.foo_cluster.upstream_rq_timeout");
        assert_eq!("cluster.upstream_rq_timeout", result.tag_extracted_name);
        assert_eq!(tags(&[("envoy.cluster_name", "foo_cluster")]), result.tags);
        assert!(logs_contain("extracted tag"));
    }

    #[test]
    fn rule_order_is_observable() {
        // The user agent rule must run first so that its positional match
        // still sees the connection manager prefix.
        let extractor = TagExtractor::build(
            vec![
                rule(
                    "envoy.http_user_agent",
                    r"^http\.(?:.*?\.)?user_agent\.((.+?)\.)\w+?$",
                ),
                rule("envoy.http_conn_manager_prefix", r"^http\.((.+?)\.)"),
            ],
            false,
        )
        .unwrap();

        let result =
            extractor.extract("http.connection_manager_1.user_agent.ios.downstream_cx_total");
        assert_eq!(
            "http.user_agent.downstream_cx_total",
            result.tag_extracted_name
        );
        assert_eq!(
            tags(&[
                ("envoy.http_user_agent", "ios"),
                ("envoy.http_conn_manager_prefix", "connection_manager_1"),
            ]),
            result.tags
        );
    }

    #[test]
    fn unmatched_name_passes_through() {
        let extractor = TagExtractor::build(vec![], true).unwrap();

        let result = extractor.extract("server.live");
        assert_eq!("server.live", result.tag_extracted_name);
        assert!(result.tags.is_empty());

        // Idempotent: re-running on the output changes nothing.
        let again = extractor.extract(&result.tag_extracted_name);
        assert_eq!(result, again);
    }

    #[test]
    fn defaults_run_before_custom_rules() {
        let extractor = TagExtractor::build(
            vec![rule("app.verb", r"upstream_rq_((\w+))$")],
            true,
        )
        .unwrap();

        let result = extractor.extract("cluster.foo_cluster.upstream_rq_timeout");
        assert_eq!("cluster.upstream_rq_", result.tag_extracted_name);
        assert_eq!(
            tags(&[
                ("envoy.cluster_name", "foo_cluster"),
                ("app.verb", "timeout"),
            ]),
            result.tags
        );
    }

    #[test]
    fn default_catalog_handles_response_codes() {
        let extractor = TagExtractor::build(vec![], true).unwrap();

        let result = extractor.extract("cluster.foo.upstream_rq_503");
        assert_eq!("cluster.upstream_rq", result.tag_extracted_name);
        assert_eq!(
            tags(&[
                ("envoy.cluster_name", "foo"),
                ("envoy.response_code", "503"),
            ]),
            result.tags
        );

        let result = extractor.extract("cluster.foo.upstream_rq_5xx");
        assert_eq!("cluster.upstream_rq", result.tag_extracted_name);
        assert_eq!(
            tags(&[
                ("envoy.cluster_name", "foo"),
                ("envoy.response_code_class", "5xx"),
            ]),
            result.tags
        );
    }

    #[test]
    fn reduced_catalog_is_injectable() {
        let catalog = TagCatalog::new(&[("test.prefix", r"^test\.((.+?)\.)")]).unwrap();
        let extractor =
            TagExtractor::with_catalog(vec![TagRule::named("test.prefix")], false, &catalog)
                .unwrap();

        let result = extractor.extract("test.alpha.requests");
        assert_eq!("test.requests", result.tag_extracted_name);
        assert_eq!(tags(&[("test.prefix", "alpha")]), result.tags);
    }

    #[test]
    fn duplicate_names_fail_the_build() {
        let result = TagExtractor::build(
            vec![rule("envoy.cluster_name", r"^cluster\.((.+?)\.)")],
            true,
        );
        assert!(matches!(result, Err(CreationError::DuplicateTag(name)) if name == "envoy.cluster_name"));
    }

    #[test]
    fn single_capture_group_supplies_the_value() {
        let extractor = TagExtractor::build(
            vec![rule("app.response_flag", r"\.(UF|UO|NR)$")],
            false,
        )
        .unwrap();

        let result = extractor.extract("listener.downstream_rq.UF");
        assert_eq!("listener.downstream_rq.", result.tag_extracted_name);
        assert_eq!(tags(&[("app.response_flag", "UF")]), result.tags);
    }
}
