//! Fixed-size chunking: byte-budget windows with overlap
//!
//! The window width follows the token budget through the four-characters-
//! per-token convention; cuts always land on code-point boundaries.

use super::{floor_char_boundary, make_chunk, DocumentChunker};
use crate::types::Chunk;

pub(crate) fn chunk(chunker: &DocumentChunker, text: &str) -> Vec<Chunk> {
    let config = chunker.config();
    let window = config.chunk_size.saturating_mul(4).max(1);
    let overlap = config.chunk_overlap.saturating_mul(4);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let end = floor_char_boundary(text, (start + window).min(text.len()));
        if let Some(c) = make_chunk(chunker.counter(), text, start, end) {
            chunks.push(c);
        }
        if end >= text.len() {
            break;
        }

        // Step back by the overlap, but always make forward progress
        let next = floor_char_boundary(text, end.saturating_sub(overlap));
        start = if next > start { next } else { end };
    }

    chunks
}
