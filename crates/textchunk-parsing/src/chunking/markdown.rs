//! Markdown content chunking
//!
//! Parses the text into documents and cuts every content block with the
//! chunker for its kind. Each block sees the header context that was active
//! when it opened.

use super::list::chunk_list;
use super::plaintext::chunk_plaintext;
use super::table::chunk_table;
use super::{ChunkBudget, ContentChunk};
use crate::parsing::{ContentKind, parse_documents};
use std::collections::HashSet;
use tracing::debug;

/// Content chunks for all blocks of `text`, in source order
///
/// Chunks with empty text, a single-offset span or a span already emitted
/// are skipped.
pub(crate) fn markdown_content_chunks(text: &str, budget: ChunkBudget) -> Vec<ContentChunk> {
    let documents = parse_documents(text);
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut chunks = Vec::new();

    for document in &documents {
        for content in &document.contents {
            let context = content.header_context();
            let block_chunks = match &content.kind {
                ContentKind::Table(table) => chunk_table(table, &context, budget),
                ContentKind::List(list) => chunk_list(list, &context, budget),
                ContentKind::Plaintext(paragraph) => {
                    chunk_plaintext(paragraph, content.block_start, &context, budget)
                }
            };
            chunks.extend(block_chunks.into_iter().filter(|chunk| {
                !chunk.text.is_empty()
                    && chunk.start != chunk.end
                    && seen.insert((chunk.start, chunk.end))
            }));
        }
    }

    debug!(
        documents = documents.len(),
        content_chunks = chunks.len(),
        "Chunked markdown contents"
    );
    chunks
}
