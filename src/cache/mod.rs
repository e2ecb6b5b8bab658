//! Process-wide cache of compiled SQL.
//!
//! Compilation is pure, so the SQL for a given graph, dialect and set of
//! options never changes and can be shared between threads.
//!
//! # Design
//!
//! - Lock-free concurrent map (`DashMap`) keyed by [`CacheKey`]
//! - Insert-if-absent: the first stored string wins, so concurrent requests
//!   for the same graph all resolve to one `Arc<str>`
//! - No eviction; call [`SqlCache::clear`] to drop everything
//!
//! # Key Format
//!
//! ```text
//! (graph fingerprint, dialect, generate options)
//! ```

mod hash;
pub use hash::compute_hash;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::ModelResult;
use crate::generate::GenerateOptions;
use crate::sql::dialect::Dialect;

/// Key of a cached statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fingerprint: String,
    pub dialect: Dialect,
    pub options: GenerateOptions,
}

impl CacheKey {
    pub fn new(fingerprint: impl Into<String>, dialect: Dialect, options: GenerateOptions) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            dialect,
            options,
        }
    }
}

/// Concurrent compiled-SQL cache.
#[derive(Debug, Default)]
pub struct SqlCache {
    entries: DashMap<CacheKey, Arc<str>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SqlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<str>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Return the cached statement for `key`, generating it on a miss.
    ///
    /// `generate` runs outside of any lock and may run on several threads
    /// at once for the same key; only the first result is stored and every
    /// caller gets that one.
    pub fn get_or_try_insert<F>(&self, key: CacheKey, generate: F) -> ModelResult<Arc<str>>
    where
        F: FnOnce() -> ModelResult<String>,
    {
        if let Some(sql) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(fingerprint = %key.fingerprint, dialect = %key.dialect, "SQL cache hit");
            return Ok(sql);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(fingerprint = %key.fingerprint, dialect = %key.dialect, "SQL cache miss");
        let sql: Arc<str> = Arc::from(generate()?);
        Ok(self.entries.entry(key).or_insert(sql).value().clone())
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
