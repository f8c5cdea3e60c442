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

/// All the ways building a policy engine from configuration can fail.
///
/// Raised only while validating and building; extraction and evaluation
/// are total and never return errors.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum CreationError {
    #[error("tag name must not be empty")]
    EmptyTagName,
    #[error("duplicate tag name `{0}`")]
    DuplicateTag(String),
    #[error("tag `{0}` has no pattern and no built-in default")]
    UnknownDefaultTag(String),
    #[error("tag `{tag}` pattern `{pattern}` has no capture group")]
    MissingCaptureGroup { tag: String, pattern: String },
    #[error("tag `{tag}` pattern is invalid: {reason}")]
    InvalidPattern { tag: String, reason: String },
    #[error("filter operand `{0}` does not fit an unsigned 32-bit value")]
    InvalidOperand(i64),
    #[error("filter runtime key must not be empty")]
    EmptyRuntimeKey,
    #[error("failed to initialize metrics: {0}")]
    InitializeMetricsFailed(String),
    #[error("deserialization failed: {0}")]
    DeserializeFailed(String),
}

impl From<prometheus::Error> for CreationError {
    fn from(error: prometheus::Error) -> Self {
        Self::InitializeMetricsFailed(error.to_string())
    }
}

impl From<serde_yaml::Error> for CreationError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::DeserializeFailed(error.to_string())
    }
}
