//! Semantic caching over any vector store
//!
//! Lookup is by vector similarity above a threshold rather than exact key
//! equality, so paraphrased queries can reuse earlier answers.

use crate::error::Result;
use crate::store::VectorStore;
use crate::types::Document;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for the semantic cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Enable or disable caching
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Minimum similarity for a stored entry to count as a hit
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Page size used when clearing through the id-listing capability
    #[serde(default = "default_clear_batch_size")]
    pub clear_batch_size: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_similarity_threshold() -> f64 {
    0.9
}

fn default_clear_batch_size() -> usize {
    100
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            similarity_threshold: default_similarity_threshold(),
            clear_batch_size: default_clear_batch_size(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
}

/// Similarity-keyed cache wrapping any `VectorStore`
pub struct SemanticCache {
    store: Arc<dyn VectorStore>,
    config: SemanticCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
}

impl SemanticCache {
    pub fn new(store: Arc<dyn VectorStore>, config: SemanticCacheConfig) -> Self {
        if !config.enabled {
            info!("semantic cache is disabled");
        }
        Self {
            store,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
        }
    }

    /// Look up the closest cached document for a query vector
    ///
    /// Returns `Some` iff the best match scores at or above the similarity
    /// threshold. Store failures are downgraded to a miss and logged.
    pub async fn get(&self, query: &[f64]) -> Option<Document> {
        if !self.config.enabled {
            return None;
        }

        let results = match self.store.search(query, 1).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "cache lookup failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match results.into_iter().next() {
            Some(result) if result.score >= self.config.similarity_threshold => {
                debug!(id = %result.document.id, score = result.score, "cache hit");
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(result.document)
            }
            best => {
                debug!(
                    best_score = best.map(|r| r.score).unwrap_or(0.0),
                    "cache miss"
                );
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a document in the cache
    pub async fn set(&self, doc: Document) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        self.store.add(vec![doc]).await?;
        self.insertions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Remove every cached entry
    ///
    /// Probes the backend's capabilities: bulk clear first, then paginated
    /// delete through the id lister, else a logged no-op.
    pub async fn clear(&self) -> Result<()> {
        if self.store.count().await? == 0 {
            return Ok(());
        }

        if let Some(clearable) = self.store.as_clearable() {
            debug!("clearing cache via bulk clear");
            return clearable.clear_all().await;
        }

        if let Some(lister) = self.store.as_document_lister() {
            debug!(
                batch = self.config.clear_batch_size,
                "clearing cache via paginated delete"
            );
            loop {
                let ids = lister.list_ids(self.config.clear_batch_size, 0).await?;
                if ids.is_empty() {
                    break;
                }
                self.store.delete(&ids).await?;
            }
            return Ok(());
        }

        warn!("backend supports neither bulk clear nor id listing; cache not cleared");
        Ok(())
    }

    /// Snapshot of hit/miss/insertion counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
        }
    }
}
