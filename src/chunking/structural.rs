//! Structure-aware chunking for Markdown-ish documents
//!
//! Fenced code blocks and tables survive as single chunks regardless of
//! size; remaining text flows through the recursive strategy. Header lines
//! are tracked so text chunks can carry their governing section.

use super::{make_chunk, recursive, DocumentChunker};
use crate::types::Chunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Text,
    Code,
    Table,
}

/// A typed run of lines, as byte offsets into the source
#[derive(Debug)]
struct Block {
    kind: BlockKind,
    start: usize,
    end: usize,
    header: Option<(usize, usize)>,
}

pub(crate) fn chunk(chunker: &DocumentChunker, text: &str) -> Vec<Chunk> {
    let config = chunker.config();
    let blocks = scan_blocks(chunker, text);

    let mut chunks = Vec::new();
    for block in blocks {
        let header = block
            .header
            .filter(|_| config.preserve_headers)
            .map(|(hs, he)| text[hs..he].trim().to_string());

        match block.kind {
            BlockKind::Code | BlockKind::Table => {
                // Preserved blocks are never subdivided, whatever their size
                if let Some(c) = make_chunk(chunker.counter(), text, block.start, block.end) {
                    let tag = if block.kind == BlockKind::Code {
                        "code"
                    } else {
                        "table"
                    };
                    chunks.push(c.with_metadata("block_type", tag));
                }
            }
            BlockKind::Text => {
                for c in recursive::chunk_region(chunker, text, block.start, block.end) {
                    let mut c = c.with_metadata("block_type", "text");
                    if let Some(h) = &header {
                        c = c.with_metadata("header", h.clone());
                    }
                    chunks.push(c);
                }
            }
        }
    }
    chunks
}

/// Single pass over lines producing typed blocks that tile the document
fn scan_blocks(chunker: &DocumentChunker, text: &str) -> Vec<Block> {
    let config = chunker.config();
    let mut blocks: Vec<Block> = Vec::new();

    let mut current_header: Option<(usize, usize)> = None;
    let mut text_block: Option<Block> = None;
    let mut code_block: Option<Block> = None;
    let mut table_block: Option<Block> = None;

    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let line_start = offset;
        let line_end = offset + line.len();
        offset = line_end;
        let trimmed = line.trim_start();

        // Inside a code fence everything accumulates until the closing fence
        if let Some(mut block) = code_block.take() {
            block.end = line_end;
            if trimmed.starts_with("```") {
                blocks.push(block);
            } else {
                code_block = Some(block);
            }
            continue;
        }

        let is_fence = config.preserve_code_blocks && trimmed.starts_with("```");
        let is_table = config.preserve_tables && line.matches('|').count() >= 2;
        let is_header = trimmed.starts_with('#');

        if is_fence {
            if let Some(block) = text_block.take() {
                blocks.push(block);
            }
            if let Some(block) = table_block.take() {
                blocks.push(block);
            }
            code_block = Some(Block {
                kind: BlockKind::Code,
                start: line_start,
                end: line_end,
                header: current_header,
            });
            continue;
        }

        if is_table {
            if let Some(block) = text_block.take() {
                blocks.push(block);
            }
            match table_block.as_mut() {
                Some(block) => block.end = line_end,
                None => {
                    table_block = Some(Block {
                        kind: BlockKind::Table,
                        start: line_start,
                        end: line_end,
                        header: current_header,
                    });
                }
            }
            continue;
        }

        if let Some(block) = table_block.take() {
            blocks.push(block);
        }

        if is_header {
            // A header closes the running text block and governs what follows
            if let Some(block) = text_block.take() {
                blocks.push(block);
            }
            current_header = Some((line_start, line_end));
            text_block = Some(Block {
                kind: BlockKind::Text,
                start: line_start,
                end: line_end,
                header: current_header,
            });
            continue;
        }

        match text_block.as_mut() {
            Some(block) => block.end = line_end,
            None => {
                text_block = Some(Block {
                    kind: BlockKind::Text,
                    start: line_start,
                    end: line_end,
                    header: current_header,
                });
            }
        }
    }

    // An unterminated fence still becomes a code block
    for block in [text_block, table_block, code_block].into_iter().flatten() {
        blocks.push(block);
    }
    blocks.sort_by_key(|b| b.start);
    blocks
}

#[cfg(test)]
mod tests {
    use super::super::{ChunkStrategy, ChunkingConfig, DocumentChunker};

    fn chunker() -> DocumentChunker {
        DocumentChunker::new(ChunkingConfig {
            strategy: ChunkStrategy::Structural,
            chunk_size: 64,
            chunk_overlap: 0,
            min_chunk_size: 1,
            ..ChunkingConfig::default()
        })
    }

    #[test]
    fn test_code_fence_is_one_chunk() {
        let text = "Intro text before the code.\n\
                    ```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n\
                    Outro text after the code.";
        let chunks = chunker().chunk(text);

        let code: Vec<_> = chunks.iter().filter(|c| c.block_type() == Some("code")).collect();
        assert_eq!(code.len(), 1);
        assert!(code[0].content.starts_with("```rust"));
        assert!(code[0].content.ends_with("```"));
    }

    #[test]
    fn test_oversized_code_fence_never_subdivided() {
        let body = "let value = compute_something_long();\n".repeat(60);
        let text = format!("```\n{}```\n", body);
        let chunks = chunker().chunk(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].block_type(), Some("code"));
    }

    #[test]
    fn test_table_is_one_chunk() {
        let text = "Before the table.\n\
                    | a | b |\n|---|---|\n| 1 | 2 |\n\
                    After the table.";
        let chunks = chunker().chunk(text);

        let tables: Vec<_> = chunks.iter().filter(|c| c.block_type() == Some("table")).collect();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].content.lines().count(), 3);
    }

    #[test]
    fn test_headers_attached_to_text_chunks() {
        let text = "# Setup\nInstall the package first.\n\n# Usage\nCall the function.";
        let chunks = chunker().chunk(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.get("header").unwrap(), "# Setup");
        assert_eq!(chunks[1].metadata.get("header").unwrap(), "# Usage");
    }

    #[test]
    fn test_preserve_flags_disable_typing() {
        let text = "```\ncode here\n```\n| a | b |\n| 1 | 2 |";
        let config = ChunkingConfig {
            strategy: ChunkStrategy::Structural,
            preserve_code_blocks: false,
            preserve_tables: false,
            chunk_overlap: 0,
            min_chunk_size: 1,
            ..ChunkingConfig::default()
        };
        let chunks = DocumentChunker::new(config).chunk(text);
        assert!(chunks.iter().all(|c| c.block_type() == Some("text")));
    }

    #[test]
    fn test_plain_text_flows_through_recursive() {
        let text = "Just ordinary prose with no structure. More prose follows here.";
        let chunks = chunker().chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].block_type(), Some("text"));
        assert!(chunks[0].metadata.get("header").is_none());
    }
}
