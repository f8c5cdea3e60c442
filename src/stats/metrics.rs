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
    pub(super) tags_extracted_total: IntCounter,
}

impl Metrics {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            tags_extracted_total: IntCounter::with_opts(opts(
                "tags_extracted_total",
                "stats",
                "Total number of tags extracted from stat names",
            ))?
            .register_if_not_exists()?,
        })
    }
}
