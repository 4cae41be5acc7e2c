//! Vector store contract and backends
//!
//! `VectorStore` is the mandatory surface every backend implements;
//! `Clearable` and `DocumentLister` are optional capabilities discovered at
//! runtime through the `as_*` probes, so callers never bind to a concrete
//! backend to ask for bulk clear or id pagination.

pub mod memory;

use crate::error::Result;
use crate::types::{Document, SearchResult};
use async_trait::async_trait;

/// Mandatory vector store operations
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a batch of documents
    ///
    /// Every document needs a non-empty id and an embedding of the store's
    /// dimension. An empty batch is a successful no-op.
    async fn add(&self, docs: Vec<Document>) -> Result<()>;

    /// Return up to `k` results ranked by descending cosine similarity
    async fn search(&self, query: &[f64], k: usize) -> Result<Vec<SearchResult>>;

    /// Remove documents by id; unknown ids are silently ignored
    async fn delete(&self, ids: &[String]) -> Result<()>;

    /// Replace an existing document in place
    async fn update(&self, doc: Document) -> Result<()>;

    /// Number of stored documents
    async fn count(&self) -> Result<usize>;

    /// Probe for bulk-clear support
    fn as_clearable(&self) -> Option<&dyn Clearable> {
        None
    }

    /// Probe for id-listing support
    fn as_document_lister(&self) -> Option<&dyn DocumentLister> {
        None
    }
}

/// Optional capability: remove all entries at once
#[async_trait]
pub trait Clearable: Send + Sync {
    /// Remove every entry, preserving schema/allocations where possible
    async fn clear_all(&self) -> Result<()>;
}

/// Optional capability: deterministic pagination over stored ids
#[async_trait]
pub trait DocumentLister: Send + Sync {
    /// List up to `limit` ids starting at `offset`
    ///
    /// `limit = 0` or `offset >= count` yield an empty page.
    async fn list_ids(&self, limit: usize, offset: usize) -> Result<Vec<String>>;
}

pub use memory::InMemoryVectorStore;
