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

use serde::{Deserialize, Serialize};

use crate::config::CreationError;

/// The comparison applied by a `status_code` or `duration` filter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, schemars::JsonSchema)]
pub enum CompareOp {
    #[serde(rename = "EQ")]
    Eq,
    #[serde(rename = "GE")]
    Ge,
}

/// A comparison filter's operand.
///
/// `value` is carried as `i64` so that negative operands are caught by
/// [`validate_filter`] instead of failing opaquely during deserialization;
/// the compiled filter stores a `u32`. A configured `runtime_key` overrides
/// `value` whenever the runtime snapshot holds a parseable entry for it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, schemars::JsonSchema)]
pub struct ComparisonConfig {
    pub op: CompareOp,
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_key: Option<String>,
}

/// One node of the access-log filter expression.
///
/// A closed union resolved once at configuration-load time; evaluation
/// walks the compiled tree and never re-interprets configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterConfig {
    /// Compares the response status code.
    StatusCode(ComparisonConfig),
    /// Compares the request duration in milliseconds.
    Duration(ComparisonConfig),
    /// Accepts entries that are not health checks.
    NotHealthCheck,
    /// Accepts entries belonging to traced requests.
    Traceable,
    /// Samples entries consistently by request id at the percentage stored
    /// under `runtime_key`.
    Runtime { runtime_key: String },
    /// Accepts when every child accepts; an empty list accepts.
    And { filters: Vec<FilterConfig> },
    /// Accepts when any child accepts; an empty list rejects.
    Or { filters: Vec<FilterConfig> },
}

impl FilterConfig {
    pub fn status_code(op: CompareOp, value: i64) -> Self {
        Self::StatusCode(ComparisonConfig {
            op,
            value,
            runtime_key: None,
        })
    }

    pub fn duration(op: CompareOp, value: i64) -> Self {
        Self::Duration(ComparisonConfig {
            op,
            value,
            runtime_key: None,
        })
    }
}

/// Checks a filter tree for structural well-formedness ahead of building an
/// [`AccessLogFilter`][crate::access_log::AccessLogFilter].
///
/// Comparison operands must fit a `u32` and runtime keys must be non-empty;
/// nothing else can be malformed, and cycles are unrepresentable because
/// children are owned by their parents.
pub fn validate_filter(filter: &FilterConfig) -> Result<(), CreationError> {
    match filter {
        FilterConfig::StatusCode(comparison) | FilterConfig::Duration(comparison) => {
            if u32::try_from(comparison.value).is_err() {
                return Err(CreationError::InvalidOperand(comparison.value));
            }
            if comparison.runtime_key.as_deref() == Some("") {
                return Err(CreationError::EmptyRuntimeKey);
            }
            Ok(())
        }
        FilterConfig::NotHealthCheck | FilterConfig::Traceable => Ok(()),
        FilterConfig::Runtime { runtime_key } => {
            if runtime_key.is_empty() {
                return Err(CreationError::EmptyRuntimeKey);
            }
            Ok(())
        }
        FilterConfig::And { filters } | FilterConfig::Or { filters } => {
            for filter in filters {
                validate_filter(filter)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn deserialize_filter_tree() {
        let yaml = "
and:
  filters:
    - status_code:
        op: GE
        value: 500
        runtime_key: access_log.min_code
    - not_health_check
";
        let config: FilterConfig = serde_yaml::with::singleton_map_recursive::deserialize(
            serde_yaml::Deserializer::from_str(yaml),
        )
        .unwrap();
        assert_eq!(
            FilterConfig::And {
                filters: vec![
                    FilterConfig::StatusCode(ComparisonConfig {
                        op: CompareOp::Ge,
                        value: 500,
                        runtime_key: Some("access_log.min_code".into()),
                    }),
                    FilterConfig::NotHealthCheck,
                ],
            },
            config
        );
    }

    #[test]
    fn serialize_round_trip() {
        let config = FilterConfig::Or {
            filters: vec![
                FilterConfig::Traceable,
                FilterConfig::Runtime {
                    runtime_key: "access_log.sampled".into(),
                },
                FilterConfig::duration(CompareOp::Ge, 1000),
            ],
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: FilterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);

        // The YAML representation uses single-key maps for every node.
        let mut yaml = Vec::new();
        serde_yaml::with::singleton_map_recursive::serialize(
            &config,
            &mut serde_yaml::Serializer::new(&mut yaml),
        )
        .unwrap();
        let parsed: FilterConfig = serde_yaml::with::singleton_map_recursive::deserialize(
            serde_yaml::Deserializer::from_slice(&yaml),
        )
        .unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn negative_operand_is_rejected() {
        let config = FilterConfig::status_code(CompareOp::Eq, -1);
        assert_eq!(Err(CreationError::InvalidOperand(-1)), validate_filter(&config));
    }

    #[test]
    fn oversized_operand_is_rejected() {
        let config = FilterConfig::duration(CompareOp::Ge, i64::from(u32::MAX) + 1);
        assert_eq!(
            Err(CreationError::InvalidOperand(i64::from(u32::MAX) + 1)),
            validate_filter(&config)
        );
    }

    #[test]
    fn empty_runtime_key_is_rejected() {
        let config = FilterConfig::Runtime {
            runtime_key: String::new(),
        };
        assert_eq!(Err(CreationError::EmptyRuntimeKey), validate_filter(&config));

        let config = FilterConfig::StatusCode(ComparisonConfig {
            op: CompareOp::Eq,
            value: 200,
            runtime_key: Some(String::new()),
        });
        assert_eq!(Err(CreationError::EmptyRuntimeKey), validate_filter(&config));
    }

    #[test]
    fn validation_recurses_into_children() {
        let config = FilterConfig::And {
            filters: vec![FilterConfig::Or {
                filters: vec![FilterConfig::status_code(CompareOp::Eq, -7)],
            }],
        };
        assert_eq!(Err(CreationError::InvalidOperand(-7)), validate_filter(&config));
    }
}
