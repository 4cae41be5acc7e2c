//! Recursive boundary-aware chunking
//!
//! Splits on a separator ladder (paragraph, line, sentence, word,
//! character), greedily packs pieces up to the token budget, and adjusts
//! emitted chunk boundaries to the nearest sentence end.

use super::{
    ceil_char_boundary, make_chunk, DocumentChunker, SENTENCE_TERMINATORS,
};
use crate::types::Chunk;

/// Separator priority ladder, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Paragraph,
    Line,
    Sentence,
    Word,
    Character,
}

impl Level {
    fn next(self) -> Option<Level> {
        match self {
            Level::Paragraph => Some(Level::Line),
            Level::Line => Some(Level::Sentence),
            Level::Sentence => Some(Level::Word),
            Level::Word => Some(Level::Character),
            Level::Character => None,
        }
    }
}

pub(crate) fn chunk(chunker: &DocumentChunker, text: &str) -> Vec<Chunk> {
    chunk_region(chunker, text, 0, text.len())
}

/// Chunk the source region `[start, end)`; offsets in the result are
/// absolute byte positions within `text`.
pub(crate) fn chunk_region(
    chunker: &DocumentChunker,
    text: &str,
    start: usize,
    end: usize,
) -> Vec<Chunk> {
    if start >= end {
        return Vec::new();
    }

    let mut pieces = Vec::new();
    flatten(chunker, text, start, end, Level::Paragraph, &mut pieces);

    let chunk_size = chunker.config().chunk_size;
    let counter = chunker.counter();

    // Greedy accumulation over a contiguous source region. Emitting cuts the
    // region at an adjusted boundary; the remainder carries into the next
    // chunk so no text is lost.
    let mut emitted: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for (ps, pe) in pieces {
        let (cs, ce) = match current {
            None => {
                current = Some((ps, pe));
                continue;
            }
            Some(region) => region,
        };

        if counter.count_tokens(&text[cs..pe]) <= chunk_size {
            current = Some((cs, pe));
            continue;
        }

        let boundary = adjust_boundary(text, cs, ce);
        emitted.push((cs, boundary));

        let carry_start = if boundary < ce { boundary } else { ps };
        if counter.count_tokens(&text[carry_start..pe]) <= chunk_size {
            current = Some((carry_start, pe));
        } else {
            // Carried remainder plus the new piece overflow together; the
            // remainder becomes its own chunk so the budget invariant holds.
            if carry_start < ps {
                emitted.push((carry_start, ps));
            }
            current = Some((ps, pe));
        }
    }

    let mut chunks: Vec<Chunk> = emitted
        .into_iter()
        .filter_map(|(s, e)| make_chunk(counter, text, s, e))
        .collect();

    // Tail rule: the final chunk must meet the minimum size unless it is the
    // only chunk of the document.
    if let Some((cs, ce)) = current {
        if let Some(tail) = make_chunk(counter, text, cs, ce) {
            if tail.token_count >= chunker.config().min_chunk_size || chunks.is_empty() {
                chunks.push(tail);
            }
        }
    }

    apply_overlap(chunker, &mut chunks);
    chunks
}

/// Prepend the tail of each previous chunk onto its successor
fn apply_overlap(chunker: &DocumentChunker, chunks: &mut [Chunk]) {
    let overlap = chunker.config().chunk_overlap;
    if overlap == 0 || chunks.len() < 2 {
        return;
    }

    let originals: Vec<(String, usize)> = chunks
        .iter()
        .map(|c| (c.content.clone(), c.start_pos))
        .collect();

    for i in 1..chunks.len() {
        let (prev_content, prev_start) = &originals[i - 1];
        let want_bytes = overlap * 4;
        let cut = prev_content.len().saturating_sub(want_bytes);
        let cut = ceil_char_boundary(prev_content, cut);
        let prefix = &prev_content[cut..];
        if prefix.is_empty() {
            continue;
        }

        let chunk = &mut chunks[i];
        chunk.start_pos = prev_start + cut;
        chunk.content = format!("{}{}", prefix, chunk.content);
        chunk.token_count = chunker.counter().count_tokens(&chunk.content);
    }
}

/// Split the region into pieces none of which exceed the token budget,
/// descending the separator ladder only where a piece overflows
fn flatten(
    chunker: &DocumentChunker,
    text: &str,
    start: usize,
    end: usize,
    level: Level,
    out: &mut Vec<(usize, usize)>,
) {
    for (ps, pe) in split_level(chunker, text, start, end, level) {
        let oversized =
            chunker.counter().count_tokens(&text[ps..pe]) > chunker.config().chunk_size;
        match (oversized, level.next()) {
            (true, Some(next)) => flatten(chunker, text, ps, pe, next, out),
            _ => out.push((ps, pe)),
        }
    }
}

fn split_level(
    chunker: &DocumentChunker,
    text: &str,
    start: usize,
    end: usize,
    level: Level,
) -> Vec<(usize, usize)> {
    match level {
        Level::Paragraph => split_on(text, start, end, "\n\n"),
        Level::Line => split_on(text, start, end, "\n"),
        Level::Sentence => split_sentences(text, start, end),
        Level::Word => split_on(text, start, end, " "),
        Level::Character => split_chars(chunker, text, start, end),
    }
}

/// Split on a literal separator; each non-final piece keeps its trailing
/// separator so the pieces tile the region exactly
fn split_on(text: &str, start: usize, end: usize, sep: &str) -> Vec<(usize, usize)> {
    let slice = &text[start..end];
    let mut out = Vec::new();
    let mut prev = 0;

    for (i, _) in slice.match_indices(sep) {
        out.push((start + prev, start + i + sep.len()));
        prev = i + sep.len();
    }
    if prev < slice.len() {
        out.push((start + prev, end));
    }
    out
}

/// Split after each sentence terminator that is followed by whitespace
fn split_sentences(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let slice = &text[start..end];
    let mut out = Vec::new();
    let mut prev = 0;
    let mut iter = slice.char_indices().peekable();

    while let Some((_, ch)) = iter.next() {
        if !SENTENCE_TERMINATORS.contains(&ch) {
            continue;
        }
        if let Some(&(j, next_ch)) = iter.peek() {
            if next_ch.is_whitespace() {
                let boundary = j + next_ch.len_utf8();
                out.push((start + prev, start + boundary));
                prev = boundary;
                iter.next();
            }
        }
    }
    if prev < slice.len() {
        out.push((start + prev, end));
    }
    out
}

/// Forced character-level split: cut whenever the token budget is exceeded
fn split_chars(
    chunker: &DocumentChunker,
    text: &str,
    start: usize,
    end: usize,
) -> Vec<(usize, usize)> {
    let slice = &text[start..end];
    let chunk_size = chunker.config().chunk_size;
    let mut out = Vec::new();
    let mut piece_start = 0;

    for (i, ch) in slice.char_indices() {
        let next_end = i + ch.len_utf8();
        if i > piece_start
            && chunker.counter().count_tokens(&slice[piece_start..next_end]) > chunk_size
        {
            out.push((start + piece_start, start + i));
            piece_start = i;
        }
    }
    if piece_start < slice.len() {
        out.push((start + piece_start, end));
    }
    out
}

/// Cut an overflowing chunk at the last sentence terminator in its latter
/// half, falling back to whitespace, falling back to the full region
fn adjust_boundary(text: &str, start: usize, end: usize) -> usize {
    let content = &text[start..end];
    let mid = ceil_char_boundary(content, content.len() / 2);
    let latter = &content[mid..];

    if let Some(pos) = latter.rfind(|c: char| SENTENCE_TERMINATORS.contains(&c)) {
        let term_len = latter[pos..].chars().next().map_or(1, |c| c.len_utf8());
        return start + mid + pos + term_len;
    }
    if let Some(pos) = latter.rfind(char::is_whitespace) {
        if mid + pos > 0 {
            return start + mid + pos;
        }
    }
    end
}
