//! Ingestion pipeline: chunk, embed, store, query
//!
//! Thin orchestration over the chunker and a vector store; every consumer
//! of the pair writes this same loop, so it lives here once.

use crate::chunking::DocumentChunker;
use crate::error::Result;
use crate::store::VectorStore;
use crate::types::{Document, SearchResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Embedding provider contract
///
/// The model itself is external; vectors arrive through this seam.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a vector
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;

    /// Dimension of the produced vectors
    fn dimension(&self) -> usize;
}

/// Result of ingesting one source document
#[derive(Debug, Clone)]
pub struct IngestionResult {
    pub source: String,
    pub chunks_stored: usize,
    pub timestamp: DateTime<Utc>,
}

/// Chunk → embed → store orchestration
pub struct IngestionPipeline {
    chunker: DocumentChunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    pub fn new(
        chunker: DocumentChunker,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
        }
    }

    /// Ingest one source document under a stable id
    ///
    /// Each chunk becomes a stored document with id `"{source_id}#{index}"`,
    /// carrying its source offsets and chunk metadata.
    pub async fn ingest(&self, source_id: &str, text: &str) -> Result<IngestionResult> {
        let chunks = self.chunker.chunk(text);

        let mut docs = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.into_iter().enumerate() {
            let embedding = self.embedder.embed(&chunk.content).await?;
            let mut doc = Document::new(format!("{source_id}#{index}"), chunk.content)
                .with_embedding(embedding)
                .with_metadata("source", json!(source_id))
                .with_metadata("start_pos", json!(chunk.start_pos))
                .with_metadata("end_pos", json!(chunk.end_pos));
            for (key, value) in chunk.metadata {
                doc = doc.with_metadata(key, json!(value));
            }
            docs.push(doc);
        }

        let stored = docs.len();
        self.store.add(docs).await?;

        info!(source = source_id, chunks = stored, "document ingested");
        Ok(IngestionResult {
            source: source_id.to_string(),
            chunks_stored: stored,
            timestamp: Utc::now(),
        })
    }

    /// Query the underlying store with a pre-computed vector
    pub async fn query(&self, vector: &[f64], k: usize) -> Result<Vec<SearchResult>> {
        self.store.search(vector, k).await
    }
}
