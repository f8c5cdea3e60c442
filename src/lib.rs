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

//! Declarative telemetry policy engines for a proxy's control plane.
//!
//! Two independently testable engines, both built once from configuration
//! and evaluated as pure functions per event:
//!
//! - [`stats::TagExtractor`] pulls dimensional tags out of flat metric
//!   names with an ordered list of capture-group regexes.
//! - [`access_log::AccessLogFilter`] evaluates a boolean expression tree
//!   over request facts to decide whether an access-log entry is emitted,
//!   including a consistent-sampling leaf keyed by request id.
//!
//! Both engines are immutable once built and safe to share by reference
//! across concurrent callers. Configuration errors surface only at build
//! time through [`config::CreationError`]; evaluation never fails.

#![deny(unused_must_use)]

pub mod access_log;
pub mod config;
pub mod metrics;
pub mod stats;

#[doc(inline)]
pub use self::{
    access_log::{AccessLogFilter, FilterConfig, LogContext, RuntimeValues},
    config::{Config, CreationError, Policy, Slot},
    stats::{ExtractionResult, TagCatalog, TagExtractor, TagRule},
};
