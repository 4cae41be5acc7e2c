//! In-memory vector store with exact cosine ranking
//!
//! Ground-truth backend: an insertion-ordered document list behind one
//! reader-writer lock. Search is a full scan, which is exact and fast enough
//! for the corpus sizes this store is meant for; the HNSW backend covers the
//! rest.

use crate::error::{Result, StoreError};
use crate::similarity::cosine_similarity;
use crate::store::{Clearable, DocumentLister, VectorStore};
use crate::types::{Document, SearchResult};
use async_trait::async_trait;
use std::cmp::Ordering;
use tokio::sync::RwLock;
use tracing::debug;

/// Insertion-ordered in-memory document store
///
/// Readers (`search`, `count`, `list_ids`) take the shared lock; writers
/// (`add`, `delete`, `update`, `clear_all`) take the exclusive lock. The
/// store dimension is fixed by the first ingested document.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    inner: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    docs: Vec<Document>,
    dimension: Option<usize>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension fixed by the first ingested document, if any
    pub async fn dimension(&self) -> Option<usize> {
        self.inner.read().await.dimension
    }
}

/// Validate one document against the expected dimension, returning its
/// embedding length on success
fn validate_doc(doc: &Document, expected: Option<usize>) -> Result<usize> {
    if doc.id.is_empty() {
        return Err(StoreError::EmptyId.into());
    }
    let embedding = doc
        .embedding
        .as_ref()
        .ok_or_else(|| StoreError::MissingEmbedding(doc.id.clone()))?;
    if let Some(expected) = expected {
        if embedding.len() != expected {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            }
            .into());
        }
    }
    Ok(embedding.len())
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, docs: Vec<Document>) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }

        let mut state = self.inner.write().await;

        // Validate the whole batch before mutating anything
        let mut expected = state.dimension;
        for doc in &docs {
            let dim = validate_doc(doc, expected)?;
            expected = Some(dim);
        }

        state.dimension = expected;
        for doc in docs {
            // Duplicate ids replace in place so ids stay unique
            match state.docs.iter_mut().find(|d| d.id == doc.id) {
                Some(existing) => *existing = doc,
                None => state.docs.push(doc),
            }
        }

        debug!(count = state.docs.len(), "documents stored");
        Ok(())
    }

    async fn search(&self, query: &[f64], k: usize) -> Result<Vec<SearchResult>> {
        if query.is_empty() {
            return Err(StoreError::MissingQuery.into());
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let state = self.inner.read().await;

        let mut results: Vec<SearchResult> = state
            .docs
            .iter()
            .map(|doc| {
                let score = doc
                    .embedding
                    .as_ref()
                    .map_or(0.0, |e| cosine_similarity(query, e));
                SearchResult::new(doc.clone(), score)
            })
            .collect();

        // Descending score; equal scores break ties on the smaller id so
        // results are reproducible
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        results.truncate(k);

        debug!(returned = results.len(), "search complete");
        Ok(results)
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut state = self.inner.write().await;
        let before = state.docs.len();
        state.docs.retain(|d| !ids.contains(&d.id));
        debug!(removed = before - state.docs.len(), "documents deleted");
        Ok(())
    }

    async fn update(&self, doc: Document) -> Result<()> {
        let mut state = self.inner.write().await;
        validate_doc(&doc, state.dimension)?;

        match state.docs.iter_mut().find(|d| d.id == doc.id) {
            Some(existing) => {
                *existing = doc;
                Ok(())
            }
            None => Err(StoreError::NotFound(doc.id).into()),
        }
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().await.docs.len())
    }

    fn as_clearable(&self) -> Option<&dyn Clearable> {
        Some(self)
    }

    fn as_document_lister(&self) -> Option<&dyn DocumentLister> {
        Some(self)
    }
}

#[async_trait]
impl Clearable for InMemoryVectorStore {
    async fn clear_all(&self) -> Result<()> {
        let mut state = self.inner.write().await;
        let removed = state.docs.len();
        state.docs.clear();
        debug!(removed, "store cleared");
        Ok(())
    }
}

#[async_trait]
impl DocumentLister for InMemoryVectorStore {
    async fn list_ids(&self, limit: usize, offset: usize) -> Result<Vec<String>> {
        let state = self.inner.read().await;
        if limit == 0 || offset >= state.docs.len() {
            return Ok(Vec::new());
        }
        Ok(state
            .docs
            .iter()
            .skip(offset)
            .take(limit)
            .map(|d| d.id.clone())
            .collect())
    }
}
