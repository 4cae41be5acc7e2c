//! Shared data types for documents, chunks, and search results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A document held by a vector store
///
/// The id is a stable, caller-supplied string, unique within a store. The
/// embedding may be absent only before ingestion; every document inside a
/// store carries an embedding of the store's dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f64>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
            embedding: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f64>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Dimension of the embedding, if present
    pub fn dimension(&self) -> Option<usize> {
        self.embedding.as_ref().map(|e| e.len())
    }
}

/// A bounded slice of a source document produced by the chunker
///
/// `start_pos` and `end_pos` are byte offsets into the source text, always
/// on UTF-8 code-point boundaries. The content is trimmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub content: String,
    pub start_pos: usize,
    pub end_pos: usize,
    pub token_count: usize,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    pub fn new(content: String, start_pos: usize, end_pos: usize, token_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            start_pos,
            end_pos,
            token_count,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Block type tag set by the structural strategy ("text", "code", "table")
    pub fn block_type(&self) -> Option<&str> {
        self.metadata.get("block_type").map(|s| s.as_str())
    }
}

/// A ranked search result
///
/// `score` is cosine similarity clamped to `[0, 1]`; `distance = 1 - score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    pub score: f64,
    pub distance: f64,
}

impl SearchResult {
    pub fn new(document: Document, score: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            document,
            score,
            distance: 1.0 - score,
        }
    }
}
