//! Pass-scoped in-memory series cache.
//!
//! Keyed by symbol. Cleared at the start of every scan pass, so cached bars
//! never outlive the pass that fetched them.

use crate::domain::Series;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Default number of series kept per pass.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Bounded symbol → series map shared by scan workers.
#[derive(Debug)]
pub struct SeriesCache {
    entries: RwLock<HashMap<String, Arc<Series>>>,
    capacity: usize,
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl SeriesCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop everything cached by the previous pass.
    pub fn begin_pass(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn get(&self, symbol: &str) -> Option<Arc<Series>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
            .cloned()
    }

    /// Return the cached series for `symbol`, or build and cache it.
    ///
    /// `build` runs outside the lock. When the cache is full the built series
    /// is returned without being stored. Empty series are cached like any
    /// other, so a failing symbol is fetched once per pass.
    pub fn get_or_build<F>(&self, symbol: &str, build: F) -> Arc<Series>
    where
        F: FnOnce() -> Series,
    {
        if let Some(hit) = self.get(symbol) {
            return hit;
        }

        let built = Arc::new(build());
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(symbol) {
            return Arc::clone(existing);
        }
        if entries.len() < self.capacity {
            entries.insert(symbol.to_string(), Arc::clone(&built));
        }
        built
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
