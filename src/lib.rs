//! Local Retrieval Engine for RAG Pipelines
//!
//! A self-contained retrieval core that integrates:
//! - Document chunking with fixed, recursive, semantic, and structural strategies
//! - An in-memory vector store with exact cosine ranking
//! - A semantic cache keyed by vector similarity
//! - An HNSW graph index for approximate nearest-neighbor search
//!
//! # Example
//!
//! ```rust,no_run
//! use ragkit::{Document, InMemoryVectorStore, VectorStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = InMemoryVectorStore::new();
//!     let doc = Document::new("intro", "Hello retrieval")
//!         .with_embedding(vec![0.1, 0.9, 0.3]);
//!
//!     store.add(vec![doc]).await?;
//!     let results = store.search(&[0.1, 0.9, 0.3], 1).await?;
//!
//!     println!("top hit: {}", results[0].document.id);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod chunking;
pub mod config;
pub mod error;
pub mod hnsw;
pub mod pipeline;
pub mod similarity;
pub mod store;
pub mod tokenizer;
pub mod types;

// Re-export main types
pub use cache::{CacheStats, SemanticCache, SemanticCacheConfig};
pub use chunking::{
    ChunkStrategy, ChunkingConfig, DocumentChunker, JaccardSimilarity, SentenceSimilarity,
};
pub use config::RagConfig;
pub use error::{IndexError, RagError, Result, StoreError};
pub use hnsw::{HnswConfig, HnswIndex, HnswVectorStore, Neighbor};
pub use pipeline::{Embedder, IngestionPipeline, IngestionResult};
pub use similarity::{cosine_distance, cosine_similarity};
pub use store::{Clearable, DocumentLister, InMemoryVectorStore, VectorStore};
pub use tokenizer::{HeuristicTokenCounter, TokenCounter};
pub use types::{Chunk, Document, SearchResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with(char::is_numeric));
    }
}
