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

use rand::Rng;
use tracing::trace;

use super::{
    config::{validate_filter, CompareOp, FilterConfig},
    RuntimeValues,
};
use crate::config::CreationError;

/// The request and response facts one filter evaluation runs against.
/// Supplied fresh per call and never retained.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogContext<'a> {
    pub status_code: u32,
    pub duration_ms: u32,
    pub health_check: bool,
    pub traceable: bool,
    pub request_id: Option<&'a str>,
}

#[derive(Debug)]
struct Comparison {
    op: CompareOp,
    value: u32,
    runtime_key: Option<String>,
}

impl Comparison {
    fn matches(&self, lhs: u32, runtime: &dyn RuntimeValues) -> bool {
        let rhs = self
            .runtime_key
            .as_deref()
            .and_then(|key| runtime.get(key))
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(self.value);

        match self.op {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug)]
enum FilterNode {
    StatusCode(Comparison),
    Duration(Comparison),
    NotHealthCheck,
    Traceable,
    Runtime { key: String },
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
}

/// Decides whether an access-log entry should be emitted.
///
/// The expression tree is compiled once from [`FilterConfig`] and immutable
/// afterwards; children are owned by their parents, so the tree is acyclic
/// by construction and a single instance is shared by reference across
/// concurrent callers.
///
/// `runtime` leaves sample consistently: the decision for a given request
/// id is derived from `seahash::hash(id) % 100`, which is stable across
/// calls, threads, and processes, so every replica that sees the same
/// logical request reaches the same verdict. Entries without a request id
/// fall back to an independent uniform draw.
pub struct AccessLogFilter {
    root: FilterNode,
    metrics: super::metrics::Metrics,
}

impl AccessLogFilter {
    /// Validates `config` and compiles it into an immutable filter.
    pub fn build(config: FilterConfig) -> Result<Self, CreationError> {
        validate_filter(&config)?;

        Ok(Self {
            root: compile(config),
            metrics: super::metrics::Metrics::new()?,
        })
    }

    /// Evaluates the filter against one entry. Total: well-formed trees
    /// never fail, and absent facts fall back to documented defaults.
    pub fn evaluate(&self, ctx: &LogContext<'_>, runtime: &dyn RuntimeValues) -> bool {
        let accept = eval_node(&self.root, ctx, runtime);

        trace!(
            accept,
            status_code = ctx.status_code,
            request_id = ctx.request_id,
            "evaluated access log filter"
        );
        if accept {
            self.metrics.entries_accepted_total.inc();
        } else {
            self.metrics.entries_rejected_total.inc();
        }

        accept
    }
}

fn compile(config: FilterConfig) -> FilterNode {
    match config {
        FilterConfig::StatusCode(comparison) => FilterNode::StatusCode(Comparison {
            op: comparison.op,
            // In range per `validate_filter`.
            value: comparison.value as u32,
            runtime_key: comparison.runtime_key,
        }),
        FilterConfig::Duration(comparison) => FilterNode::Duration(Comparison {
            op: comparison.op,
            value: comparison.value as u32,
            runtime_key: comparison.runtime_key,
        }),
        FilterConfig::NotHealthCheck => FilterNode::NotHealthCheck,
        FilterConfig::Traceable => FilterNode::Traceable,
        FilterConfig::Runtime { runtime_key } => FilterNode::Runtime { key: runtime_key },
        FilterConfig::And { filters } => {
            FilterNode::And(filters.into_iter().map(compile).collect())
        }
        FilterConfig::Or { filters } => FilterNode::Or(filters.into_iter().map(compile).collect()),
    }
}

fn eval_node(node: &FilterNode, ctx: &LogContext<'_>, runtime: &dyn RuntimeValues) -> bool {
    match node {
        FilterNode::StatusCode(comparison) => comparison.matches(ctx.status_code, runtime),
        FilterNode::Duration(comparison) => comparison.matches(ctx.duration_ms, runtime),
        FilterNode::NotHealthCheck => !ctx.health_check,
        FilterNode::Traceable => ctx.traceable,
        FilterNode::Runtime { key } => sample(key, ctx.request_id, runtime),
        FilterNode::And(children) => children
            .iter()
            .all(|child| eval_node(child, ctx, runtime)),
        FilterNode::Or(children) => children
            .iter()
            .any(|child| eval_node(child, ctx, runtime)),
    }
}

fn sample(key: &str, request_id: Option<&str>, runtime: &dyn RuntimeValues) -> bool {
    let percentage = runtime.get(key).unwrap_or(0).min(100);

    let draw = match request_id {
        Some(id) => seahash::hash(id.as_bytes()) % 100,
        None => rand::thread_rng().gen_range(0..100),
    };

    draw < percentage
}
