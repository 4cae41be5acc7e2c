//! Configuration management for the retrieval engine

use crate::cache::SemanticCacheConfig;
use crate::chunking::ChunkingConfig;
use crate::hnsw::HnswConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the retrieval engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Document chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Semantic cache configuration
    #[serde(default)]
    pub cache: SemanticCacheConfig,

    /// HNSW index configuration
    #[serde(default)]
    pub hnsw: HnswConfig,

    /// Expected embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
}

fn default_embedding_dimension() -> usize {
    768
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            cache: SemanticCacheConfig::default(),
            hnsw: HnswConfig::default(),
            embedding_dimension: default_embedding_dimension(),
        }
    }
}

impl RagConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let config = match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yml::from_str(&content)?,
            _ => return Err(anyhow::anyhow!("Unsupported config file format")),
        };
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string(self)?,
            Some("yaml") | Some("yml") => serde_yml::to_string(self)?,
            _ => return Err(anyhow::anyhow!("Unsupported config file format")),
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.embedding_dimension == 0 {
            return Err(anyhow::anyhow!(
                "Embedding dimension must be greater than 0"
            ));
        }

        if self.chunking.chunk_size == 0 {
            return Err(anyhow::anyhow!("Chunk size must be greater than 0"));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(anyhow::anyhow!(
                "Chunk overlap must be smaller than chunk size"
            ));
        }

        if !(0.0..=1.0).contains(&self.chunking.similarity_threshold) {
            return Err(anyhow::anyhow!(
                "Chunking similarity threshold must be between 0.0 and 1.0"
            ));
        }

        if !(0.0..=1.0).contains(&self.cache.similarity_threshold) {
            return Err(anyhow::anyhow!(
                "Cache similarity threshold must be between 0.0 and 1.0"
            ));
        }

        if self.cache.clear_batch_size == 0 {
            return Err(anyhow::anyhow!(
                "Cache clear batch size must be greater than 0"
            ));
        }

        if self.hnsw.m == 0 {
            return Err(anyhow::anyhow!("HNSW m must be at least 1"));
        }

        if self.hnsw.ef_construction == 0 || self.hnsw.ef_search == 0 {
            return Err(anyhow::anyhow!(
                "HNSW candidate pool sizes must be greater than 0"
            ));
        }

        Ok(())
    }
}
