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
use std::hash::BuildHasher;

/// A snapshot of named runtime values consulted during filter evaluation:
/// sampling percentages for `runtime` leaves and operand overrides for
/// comparisons.
///
/// The filter treats lookups as fast, synchronous, side-effect-free reads;
/// providers with their own reload or caching semantics sit behind this
/// trait, outside the evaluator's concern.
pub trait RuntimeValues {
    fn get(&self, key: &str) -> Option<u64>;
}

/// A lookup with no values, leaving every filter at its configured default.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyRuntime;

impl RuntimeValues for EmptyRuntime {
    fn get(&self, _: &str) -> Option<u64> {
        None
    }
}

impl<S: BuildHasher> RuntimeValues for HashMap<String, u64, S> {
    fn get(&self, key: &str) -> Option<u64> {
        HashMap::get(self, key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_implementations() {
        assert_eq!(None, EmptyRuntime.get("any"));

        let map = HashMap::from([("sampled".to_owned(), 25u64)]);
        assert_eq!(Some(25), RuntimeValues::get(&map, "sampled"));
        assert_eq!(None, RuntimeValues::get(&map, "other"));
    }
}
