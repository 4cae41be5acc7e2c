//! Integration tests for the vector store contract and the semantic cache

use async_trait::async_trait;
use ragkit::{
    Clearable, Document, DocumentLister, InMemoryVectorStore, Result, SearchResult, SemanticCache,
    SemanticCacheConfig, VectorStore,
};
use std::sync::Arc;

fn doc(id: &str, embedding: Vec<f64>) -> Document {
    Document::new(id, format!("content of {id}")).with_embedding(embedding)
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Exact recall over three axis-aligned documents
#[tokio::test]
async fn test_exact_recall_ordering() {
    init_logging();
    let store = InMemoryVectorStore::new();
    let inv_sqrt2 = 1.0 / 2.0f64.sqrt();
    store
        .add(vec![
            doc("a", vec![1.0, 0.0]),
            doc("b", vec![0.0, 1.0]),
            doc("c", vec![inv_sqrt2, inv_sqrt2]),
        ])
        .await
        .unwrap();

    let results = store.search(&[1.0, 0.0], 3).await.unwrap();
    let ids: Vec<_> = results.iter().map(|r| r.document.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c", "b"]);

    assert!((results[0].score - 1.0).abs() < 1e-9);
    assert!((results[1].score - inv_sqrt2).abs() < 1e-9);
    assert!(results[2].score.abs() < 1e-9);

    // Universal result invariants
    for r in &results {
        assert!((0.0..=1.0).contains(&r.score));
        assert!((r.distance - (1.0 - r.score)).abs() < 1e-12);
    }
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_add_update_search_roundtrip() {
    let store = InMemoryVectorStore::new();
    let d = doc("roundtrip", vec![0.3, 0.4, 0.5]);
    store.add(vec![d.clone()]).await.unwrap();
    store.update(d.clone()).await.unwrap();

    let results = store.search(d.embedding.as_ref().unwrap(), 1).await.unwrap();
    assert_eq!(results[0].document.id, "roundtrip");
}

/// Cache hit at the threshold, miss on an orthogonal query
#[tokio::test]
async fn test_semantic_cache_hit_and_miss() {
    let store = Arc::new(InMemoryVectorStore::new());
    let cache = SemanticCache::new(
        store,
        SemanticCacheConfig {
            similarity_threshold: 0.9,
            ..SemanticCacheConfig::default()
        },
    );

    let d = Document::new("cached", "the cached answer").with_embedding(vec![1.0, 0.0, 0.0]);
    cache.set(d).await.unwrap();

    let hit = cache.get(&[1.0, 0.0, 0.0]).await.expect("expected a hit");
    assert_eq!(hit.id, "cached");
    assert_eq!(hit.content, "the cached answer");

    assert!(cache.get(&[0.0, 1.0, 0.0]).await.is_none());
}

/// A store wrapper that hides every capability except id listing
struct ListerOnlyStore {
    inner: InMemoryVectorStore,
}

#[async_trait]
impl VectorStore for ListerOnlyStore {
    async fn add(&self, docs: Vec<Document>) -> Result<()> {
        self.inner.add(docs).await
    }
    async fn search(&self, query: &[f64], k: usize) -> Result<Vec<SearchResult>> {
        self.inner.search(query, k).await
    }
    async fn delete(&self, ids: &[String]) -> Result<()> {
        self.inner.delete(ids).await
    }
    async fn update(&self, doc: Document) -> Result<()> {
        self.inner.update(doc).await
    }
    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
    fn as_document_lister(&self) -> Option<&dyn DocumentLister> {
        self.inner.as_document_lister()
    }
}

/// A store wrapper that hides both optional capabilities
struct BareStore {
    inner: InMemoryVectorStore,
}

#[async_trait]
impl VectorStore for BareStore {
    async fn add(&self, docs: Vec<Document>) -> Result<()> {
        self.inner.add(docs).await
    }
    async fn search(&self, query: &[f64], k: usize) -> Result<Vec<SearchResult>> {
        self.inner.search(query, k).await
    }
    async fn delete(&self, ids: &[String]) -> Result<()> {
        self.inner.delete(ids).await
    }
    async fn update(&self, doc: Document) -> Result<()> {
        self.inner.update(doc).await
    }
    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

async fn filled_store<S: VectorStore>(store: &S, n: usize) {
    let docs: Vec<Document> = (0..n)
        .map(|i| doc(&format!("doc-{i:04}"), vec![i as f64, 1.0]))
        .collect();
    store.add(docs).await.unwrap();
}

/// Bulk clear is preferred when the backend supports it
#[tokio::test]
async fn test_cache_clear_via_clearable() {
    let store = Arc::new(InMemoryVectorStore::new());
    filled_store(store.as_ref(), 200).await;
    assert!(store.as_clearable().is_some());

    let cache = SemanticCache::new(store.clone(), SemanticCacheConfig::default());
    cache.clear().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

/// Without bulk clear, the cache pages through the id lister and deletes
#[tokio::test]
async fn test_cache_clear_via_lister() {
    let store = Arc::new(ListerOnlyStore {
        inner: InMemoryVectorStore::new(),
    });
    filled_store(store.as_ref(), 250).await;
    assert!(store.as_clearable().is_none());
    assert!(store.as_document_lister().is_some());

    let cache = SemanticCache::new(store.clone(), SemanticCacheConfig::default());
    cache.clear().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

/// With neither capability, clear is a logged no-op
#[tokio::test]
async fn test_cache_clear_without_capabilities() {
    let store = Arc::new(BareStore {
        inner: InMemoryVectorStore::new(),
    });
    filled_store(store.as_ref(), 5).await;

    let cache = SemanticCache::new(store.clone(), SemanticCacheConfig::default());
    cache.clear().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 5);
}

#[tokio::test]
async fn test_boundary_behaviors() {
    let store = InMemoryVectorStore::new();

    // Empty batch and empty clear are successful no-ops
    store.add(vec![]).await.unwrap();
    store.as_clearable().unwrap().clear_all().await.unwrap();

    filled_store(&store, 3).await;

    // k = 0 yields empty, not an error
    assert!(store.search(&[1.0, 0.0], 0).await.unwrap().is_empty());

    let lister = store.as_document_lister().unwrap();
    assert!(lister.list_ids(0, 0).await.unwrap().is_empty());
    assert!(lister.list_ids(10, 3).await.unwrap().is_empty());
    assert_eq!(lister.list_ids(10, 0).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_add_then_delete_empties_store() {
    let store = InMemoryVectorStore::new();
    let docs: Vec<Document> = (0..20)
        .map(|i| doc(&format!("d{i}"), vec![i as f64, 2.0]))
        .collect();
    let ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();

    store.add(docs).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 20);
    store.delete(&ids).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

/// Writers serialize, readers run concurrently, and writes are visible to
/// reads issued after they return
#[tokio::test]
async fn test_concurrent_reads_and_writes() {
    let store = Arc::new(InMemoryVectorStore::new());

    let mut handles = Vec::new();
    for batch in 0..4 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..25 {
                let id = format!("w{batch}-{i}");
                store.add(vec![doc(&id, vec![batch as f64, i as f64])]).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.count().await.unwrap(), 100);
    let results = store.search(&[1.0, 1.0], 100).await.unwrap();
    assert_eq!(results.len(), 100);
}
