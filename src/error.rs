//! Error handling for the retrieval engine

use thiserror::Error;

/// Result type alias for the retrieval engine
pub type Result<T> = std::result::Result<T, RagError>;

/// Main error type for the retrieval engine
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Errors raised by vector store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document has no id")]
    EmptyId,

    #[error("Document {0} has no embedding")]
    MissingEmbedding(String),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Query vector is empty")]
    MissingQuery,

    #[error("Document not found: {0}")]
    NotFound(String),
}

/// Errors raised by the HNSW index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Node already exists: {0}")]
    Duplicate(String),

    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector/id length mismatch: {vectors} vectors, {ids} ids")]
    LengthMismatch { vectors: usize, ids: usize },
}

impl RagError {
    /// Get error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            RagError::Store(_) => "store",
            RagError::Index(_) => "index",
            RagError::Config(_) => "config",
            RagError::Io(_) => "io",
            RagError::Serialization(_) => "serialization",
            RagError::Embedding(_) => "embedding",
            RagError::Generic(_) => "generic",
        }
    }
}
