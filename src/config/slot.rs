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

use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// A mutable memory location with atomic storage rules.
///
/// Holds the currently published value, usually a freshly built
/// [`Policy`][crate::config::Policy], for any number of concurrent readers;
/// a configuration reload stores a new value without readers ever observing
/// a partially built one.
pub struct Slot<T> {
    inner: Arc<ArcSwapOption<T>>,
    #[allow(clippy::type_complexity)]
    watcher: Arc<ArcSwapOption<Box<dyn Fn(&T) + Send + Sync>>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            watcher: self.watcher.clone(),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Slot<T> {
    /// Creates a new slot for `value`.
    pub fn new(value: impl Into<Option<T>>) -> Self {
        Self {
            inner: Arc::new(ArcSwapOption::new(value.into().map(Arc::new))),
            watcher: <_>::default(),
        }
    }

    /// Creates a new empty slot.
    pub fn empty() -> Self {
        Self::new(None)
    }

    /// Adds a watcher to the slot. The watcher fires whenever a new value
    /// is stored.
    pub fn watch(&self, watcher: impl Fn(&T) + Send + Sync + 'static) {
        tracing::trace!("adding new watcher");
        self.watcher.store(Some(Arc::new(Box::new(watcher))));
    }

    /// Returns whether any data is present in the slot.
    pub fn is_some(&self) -> bool {
        self.inner.load().is_some()
    }

    /// Provides a handle to the current value, if any.
    pub fn load(&self) -> Option<Arc<T>> {
        self.inner.load_full()
    }

    /// Replaces the data in the slot with `value`.
    pub fn store(&self, value: Arc<T>) {
        tracing::trace!("storing new value");
        self.inner.store(Some(value.clone()));
        if let Some(watcher) = &*self.watcher.load() {
            (watcher)(&value);
        }
    }

    /// Removes any data from the slot.
    pub fn remove(&self) {
        self.inner.store(None);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn store_and_load() {
        let slot = Slot::empty();
        assert!(!slot.is_some());
        assert!(slot.load().is_none());

        slot.store(Arc::new(41));
        assert_eq!(Some(41), slot.load().map(|value| *value));

        slot.store(Arc::new(42));
        assert_eq!(Some(42), slot.load().map(|value| *value));

        slot.remove();
        assert!(slot.load().is_none());
    }

    #[test]
    fn watcher_fires_on_store() {
        let slot = Slot::new(0);
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        slot.watch(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        slot.store(Arc::new(1));
        slot.store(Arc::new(2));
        assert_eq!(2, fired.load(Ordering::SeqCst));
    }

    #[test]
    fn clones_share_storage() {
        let slot = Slot::empty();
        let clone = slot.clone();

        slot.store(Arc::new("published"));
        assert_eq!(Some("published"), clone.load().map(|value| *value));
    }
}
