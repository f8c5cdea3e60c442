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

use prometheus::IntCounter;

use crate::metrics::{opts, CollectorExt, Result};

pub(super) struct Metrics {
    pub(super) entries_accepted_total: IntCounter,
    pub(super) entries_rejected_total: IntCounter,
}

impl Metrics {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            entries_accepted_total: IntCounter::with_opts(opts(
                "entries_accepted_total",
                "access_log",
                "Total number of access log entries accepted by the filter",
            ))?
            .register_if_not_exists()?,
            entries_rejected_total: IntCounter::with_opts(opts(
                "entries_rejected_total",
                "access_log",
                "Total number of access log entries rejected by the filter",
            ))?
            .register_if_not_exists()?,
        })
    }
}
