//! `VectorStore` backend over the HNSW index
//!
//! Pairs the graph with an id-keyed document map so the index is
//! interchangeable with the in-memory store behind the `VectorStore` trait.

use crate::error::{IndexError, Result, StoreError};
use crate::hnsw::{HnswConfig, HnswIndex};
use crate::store::{Clearable, DocumentLister, VectorStore};
use crate::types::{Document, SearchResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Approximate vector store backed by an HNSW graph
///
/// Not upsert-style: `add` rejects duplicate ids; `update` re-inserts the
/// node under its existing id.
pub struct HnswVectorStore {
    index: HnswIndex,
    documents: RwLock<HashMap<String, Document>>,
}

impl HnswVectorStore {
    pub fn new(config: HnswConfig) -> Self {
        Self {
            index: HnswIndex::new(config),
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Parameters picked from the expected corpus size
    pub fn with_expected_size(expected_size: usize) -> Self {
        Self::new(HnswConfig::adaptive(expected_size))
    }

    pub fn index(&self) -> &HnswIndex {
        &self.index
    }
}

impl Default for HnswVectorStore {
    fn default() -> Self {
        Self::new(HnswConfig::default())
    }
}

#[async_trait]
impl VectorStore for HnswVectorStore {
    async fn add(&self, docs: Vec<Document>) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }

        let mut documents = self.documents.write().await;

        // Validate the whole batch before touching the graph
        let mut expected = self.index.dimension().await;
        let mut batch_ids = std::collections::HashSet::new();
        for doc in &docs {
            if doc.id.is_empty() {
                return Err(StoreError::EmptyId.into());
            }
            let embedding = doc
                .embedding
                .as_ref()
                .ok_or_else(|| StoreError::MissingEmbedding(doc.id.clone()))?;
            if let Some(dim) = expected {
                if embedding.len() != dim {
                    return Err(StoreError::DimensionMismatch {
                        expected: dim,
                        actual: embedding.len(),
                    }
                    .into());
                }
            }
            expected = Some(embedding.len());
            if documents.contains_key(&doc.id) || !batch_ids.insert(doc.id.clone()) {
                return Err(IndexError::Duplicate(doc.id.clone()).into());
            }
        }

        for doc in docs {
            let embedding = doc.embedding.clone().unwrap_or_default();
            self.index.add(embedding, doc.id.clone()).await?;
            documents.insert(doc.id.clone(), doc);
        }

        debug!(count = documents.len(), "documents indexed");
        Ok(())
    }

    async fn search(&self, query: &[f64], k: usize) -> Result<Vec<SearchResult>> {
        let neighbors = self.index.search(query, k).await?;
        let documents = self.documents.read().await;

        Ok(neighbors
            .into_iter()
            .filter_map(|n| {
                documents
                    .get(&n.id)
                    .map(|doc| SearchResult::new(doc.clone(), n.score))
            })
            .collect())
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut documents = self.documents.write().await;
        for id in ids {
            if documents.remove(id).is_some() {
                self.index.delete(id).await?;
            }
        }
        Ok(())
    }

    async fn update(&self, doc: Document) -> Result<()> {
        let mut documents = self.documents.write().await;
        if !documents.contains_key(&doc.id) {
            return Err(StoreError::NotFound(doc.id).into());
        }
        let embedding = doc
            .embedding
            .clone()
            .ok_or_else(|| StoreError::MissingEmbedding(doc.id.clone()))?;
        // Validate before the delete so a bad update cannot leave the node
        // missing from the graph
        if let Some(expected) = self.index.dimension().await {
            if embedding.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                }
                .into());
            }
        }

        self.index.delete(&doc.id).await?;
        self.index.add(embedding, doc.id.clone()).await?;
        documents.insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.documents.read().await.len())
    }

    fn as_clearable(&self) -> Option<&dyn Clearable> {
        Some(self)
    }

    fn as_document_lister(&self) -> Option<&dyn DocumentLister> {
        Some(self)
    }
}

#[async_trait]
impl Clearable for HnswVectorStore {
    async fn clear_all(&self) -> Result<()> {
        let mut documents = self.documents.write().await;
        self.index.clear().await;
        documents.clear();
        Ok(())
    }
}

#[async_trait]
impl DocumentLister for HnswVectorStore {
    /// Lexicographic id order, so pagination over the map is deterministic
    async fn list_ids(&self, limit: usize, offset: usize) -> Result<Vec<String>> {
        let documents = self.documents.read().await;
        if limit == 0 || offset >= documents.len() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<String> = documents.keys().cloned().collect();
        ids.sort();
        Ok(ids.into_iter().skip(offset).take(limit).collect())
    }
}
