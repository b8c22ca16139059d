//! Shared state analyzers see while a run is in flight.
//!
//! The context owns an LRU cache of computed artifacts (CFGs, per-module
//! call sets) so several analyzers looking at the same function never build
//! the same graph twice. Entries are type-erased; `get_or_compute` restores
//! the concrete type on the way out.

use crate::core::AnalysisConfig;
use anyhow::Result;
use crossguard_ir::{ControlFlowGraph, Function};
use lru::LruCache;
use parking_lot::RwLock;
use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub struct AnalysisCache {
    entries: LruCache<String, Arc<dyn Any + Send + Sync>>,
}

impl AnalysisCache {
    pub fn new(max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).unwrap();
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn get_or_compute<T, F>(&mut self, key: &str, compute: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T>,
    {
        if let Some(entry) = self.entries.get(key) {
            if let Ok(value) = entry.clone().downcast::<T>() {
                return Ok(value);
            }
        }

        let value = Arc::new(compute()?);
        self.entries
            .put(key.to_string(), value.clone() as Arc<dyn Any + Send + Sync>);

        Ok(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct AnalysisContext {
    config: AnalysisConfig,
    cache: Arc<RwLock<AnalysisCache>>,
}

impl AnalysisContext {
    pub fn new(config: AnalysisConfig) -> Self {
        let cache_size = config.max_cache_size;
        Self {
            config,
            cache: Arc::new(RwLock::new(AnalysisCache::new(cache_size))),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn get_or_compute<T, F>(&self, key: &str, compute: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T>,
    {
        self.cache.write().get_or_compute(key, compute)
    }

    /// The CFG for `function`, cached under the function's qualified name.
    pub fn cfg(&self, qualified_name: &str, function: &Function) -> Arc<ControlFlowGraph> {
        self.get_or_compute(&format!("cfg::{qualified_name}"), || {
            Ok(ControlFlowGraph::build(function))
        })
        .expect("CFG construction is infallible")
    }
}
