//! Semantic chunking: group sentences until topical similarity drops
//!
//! Similarity between adjacent sentences is pluggable; the default is word
//! overlap, and an embedding-cosine implementation can be substituted behind
//! the same trait.

use super::{make_chunk, DocumentChunker, SENTENCE_TERMINATORS};
use crate::types::Chunk;
use std::collections::HashSet;

/// Similarity between two sentences, in `[0, 1]`
pub trait SentenceSimilarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Jaccard word overlap on lowercased whitespace tokens
#[derive(Debug, Clone, Default)]
pub struct JaccardSimilarity;

impl SentenceSimilarity for JaccardSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let words_a: HashSet<String> = a.split_whitespace().map(|w| w.to_lowercase()).collect();
        let words_b: HashSet<String> = b.split_whitespace().map(|w| w.to_lowercase()).collect();

        if words_a.is_empty() && words_b.is_empty() {
            return 1.0;
        }
        let intersection = words_a.intersection(&words_b).count();
        let union = words_a.union(&words_b).count();
        if union == 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }
}

pub(crate) fn chunk(chunker: &DocumentChunker, text: &str) -> Vec<Chunk> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Vec::new();
    }

    let config = chunker.config();
    let counter = chunker.counter();

    let mut chunks = Vec::new();
    let mut region = sentences[0];
    let mut prev_sentence = sentences[0];

    for &(ss, se) in &sentences[1..] {
        let sim = chunker
            .similarity_fn()
            .similarity(&text[prev_sentence.0..prev_sentence.1], &text[ss..se]);
        let would_overflow =
            counter.count_tokens(&text[region.0..se]) > config.chunk_size;

        if sim < config.similarity_threshold || would_overflow {
            if let Some(c) = make_chunk(counter, text, region.0, region.1) {
                chunks.push(c);
            }
            region = (ss, se);
        } else {
            region.1 = se;
        }
        prev_sentence = (ss, se);
    }

    if let Some(c) = make_chunk(counter, text, region.0, region.1) {
        chunks.push(c);
    }
    chunks
}

/// Sentence regions tiling the text, split after terminator + whitespace
fn split_sentences(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut prev = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((_, ch)) = iter.next() {
        if !SENTENCE_TERMINATORS.contains(&ch) {
            continue;
        }
        if let Some(&(j, next_ch)) = iter.peek() {
            if next_ch.is_whitespace() {
                let boundary = j + next_ch.len_utf8();
                out.push((prev, boundary));
                prev = boundary;
                iter.next();
            }
        }
    }
    if prev < text.len() {
        out.push((prev, text.len()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::{ChunkStrategy, ChunkingConfig, DocumentChunker};
    use super::*;
    use std::sync::Arc;

    fn chunker(threshold: f64) -> DocumentChunker {
        DocumentChunker::new(ChunkingConfig {
            strategy: ChunkStrategy::Semantic,
            chunk_size: 512,
            similarity_threshold: threshold,
            ..ChunkingConfig::default()
        })
    }

    #[test]
    fn test_jaccard_similarity() {
        let jaccard = JaccardSimilarity;
        assert_eq!(jaccard.similarity("the cat sat", "the cat sat"), 1.0);
        assert_eq!(jaccard.similarity("alpha beta", "gamma delta"), 0.0);

        // {the, cat} vs {the, dog}: intersection 1, union 3
        let sim = jaccard.similarity("The cat", "the dog");
        assert!((sim - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_topic_shift_starts_new_chunk() {
        let text = "The cat sat on the mat. The cat slept on the mat. \
                    Quantum computers use qubits. Quantum computers use gates.";
        let chunks = chunker(0.2).chunk(text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.contains("cat"));
        assert!(chunks[1].content.contains("Quantum"));
    }

    #[test]
    fn test_similar_sentences_stay_together() {
        let text = "The cat sat on the mat. The cat slept on the mat.";
        let chunks = chunker(0.2).chunk(text);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_budget_still_enforced() {
        let text = "alpha beta gamma delta epsilon zeta. ".repeat(30);
        let mut config = ChunkingConfig {
            strategy: ChunkStrategy::Semantic,
            chunk_size: 20,
            similarity_threshold: 0.0,
            ..ChunkingConfig::default()
        };
        config.chunk_overlap = 0;
        let chunks = DocumentChunker::new(config).chunk(&text);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.token_count <= 20);
        }
    }

    #[test]
    fn test_substituted_similarity() {
        struct AlwaysDifferent;
        impl SentenceSimilarity for AlwaysDifferent {
            fn similarity(&self, _: &str, _: &str) -> f64 {
                0.0
            }
        }

        let text = "One sentence here. Two sentence here. Three sentence here.";
        let chunks = chunker(0.5)
            .with_similarity(Arc::new(AlwaysDifferent))
            .chunk(text);
        assert_eq!(chunks.len(), 3);
    }
}
