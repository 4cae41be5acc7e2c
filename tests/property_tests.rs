//! Property-based tests for the retrieval engine using proptest

use proptest::prelude::*;
use ragkit::{
    ChunkStrategy, ChunkingConfig, Document, DocumentChunker, HeuristicTokenCounter,
    InMemoryVectorStore, TokenCounter, VectorStore,
};

// Property test strategies

prop_compose! {
    fn arb_sentence()(
        words in prop::collection::vec("[a-z]{1,8}", 3..12)
    ) -> String {
        format!("{}.", words.join(" "))
    }
}

prop_compose! {
    fn arb_document_text()(
        sentences in prop::collection::vec(arb_sentence(), 1..40)
    ) -> String {
        sentences.join(" ")
    }
}

prop_compose! {
    fn arb_embedding(dim: usize)(
        values in prop::collection::vec(-10.0f64..10.0, dim..=dim)
    ) -> Vec<f64> {
        values
    }
}

prop_compose! {
    fn arb_docs(dim: usize)(
        embeddings in prop::collection::vec(arb_embedding(dim), 1..30)
    ) -> Vec<Document> {
        embeddings
            .into_iter()
            .enumerate()
            .map(|(i, e)| Document::new(format!("doc-{i}"), format!("text {i}")).with_embedding(e))
            .collect()
    }
}

fn recursive_chunker(chunk_size: usize) -> DocumentChunker {
    DocumentChunker::new(ChunkingConfig {
        strategy: ChunkStrategy::Recursive,
        chunk_size,
        chunk_overlap: 0,
        min_chunk_size: 1,
        ..ChunkingConfig::default()
    })
}

proptest! {
    /// Chunk offsets always delimit the chunk content within the source,
    /// on valid char boundaries, in order
    #[test]
    fn prop_chunk_offsets_are_exact(text in arb_document_text(), chunk_size in 8usize..64) {
        let chunks = recursive_chunker(chunk_size).chunk(&text);
        let mut cursor = 0;
        for chunk in &chunks {
            prop_assert!(text.is_char_boundary(chunk.start_pos));
            prop_assert!(text.is_char_boundary(chunk.end_pos));
            prop_assert!(chunk.start_pos <= chunk.end_pos);
            prop_assert!(chunk.start_pos >= cursor);
            prop_assert_eq!(&text[chunk.start_pos..chunk.end_pos], chunk.content.as_str());
            cursor = chunk.end_pos;
        }
    }

    /// Only whitespace is lost between and around chunks
    #[test]
    fn prop_chunks_lose_only_whitespace(text in arb_document_text(), chunk_size in 8usize..64) {
        let chunks = recursive_chunker(chunk_size).chunk(&text);
        prop_assert!(!chunks.is_empty());

        let mut cursor = 0;
        for chunk in &chunks {
            prop_assert!(text[cursor..chunk.start_pos].trim().is_empty());
            cursor = chunk.end_pos;
        }
        // A dropped under-minimum tail would show up here; min size is 1
        prop_assert!(text[cursor..].trim().is_empty());
    }

    /// Every chunk respects the token budget and is trimmed
    #[test]
    fn prop_chunk_budget_holds(text in arb_document_text(), chunk_size in 8usize..64) {
        let counter = HeuristicTokenCounter::new();
        let chunks = recursive_chunker(chunk_size).chunk(&text);
        for chunk in &chunks {
            prop_assert!(chunk.token_count <= chunk_size);
            prop_assert_eq!(chunk.token_count, counter.count_tokens(&chunk.content));
            prop_assert_eq!(chunk.content.as_str(), chunk.content.trim());
        }
    }

    /// Search results are bounded by k, sorted by descending score, with
    /// scores in [0, 1] and complementary distances
    #[test]
    fn prop_search_results_well_formed(docs in arb_docs(4), query in arb_embedding(4), k in 0usize..40) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let store = InMemoryVectorStore::new();
            store.add(docs.clone()).await.unwrap();

            let results = store.search(&query, k).await.unwrap();
            prop_assert!(results.len() <= k);
            prop_assert!(results.len() <= docs.len());

            for r in &results {
                prop_assert!((0.0..=1.0).contains(&r.score));
                prop_assert!((r.distance - (1.0 - r.score)).abs() < 1e-12);
            }
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            Ok(())
        })?;
    }

    /// Adding then deleting every document leaves an empty store
    #[test]
    fn prop_add_delete_empties(docs in arb_docs(3)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let store = InMemoryVectorStore::new();
            let ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();

            store.add(docs).await.unwrap();
            store.delete(&ids).await.unwrap();
            prop_assert_eq!(store.count().await.unwrap(), 0);
            Ok(())
        })?;
    }

    /// Pagination pages are disjoint, ordered, and cover the corpus
    #[test]
    fn prop_pagination_covers_store(docs in arb_docs(2), limit in 1usize..10) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let store = InMemoryVectorStore::new();
            let expected: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();
            store.add(docs).await.unwrap();

            let lister = store.as_document_lister().unwrap();
            let mut collected = Vec::new();
            let mut offset = 0;
            loop {
                let page = lister.list_ids(limit, offset).await.unwrap();
                if page.is_empty() {
                    break;
                }
                prop_assert!(page.len() <= limit);
                offset += page.len();
                collected.extend(page);
            }
            prop_assert_eq!(collected, expected);
            Ok(())
        })?;
    }
}
