//! Plaintext chunker

use super::position::FragmentLocator;
use super::recursive_splitter::RecursiveCharacterSplitter;
use super::traits::TextSplitter;
use super::{ChunkBudget, ContentChunk};
use tracing::warn;

/// Split a paragraph run and place every fragment in the source
///
/// `block_start` is the offset of the paragraph's first character. Fragments
/// that cannot be placed are dropped with a warning.
pub(crate) fn chunk_plaintext(
    text: &str,
    block_start: usize,
    context: &str,
    budget: ChunkBudget,
) -> Vec<ContentChunk> {
    let splitter = RecursiveCharacterSplitter::new()
        .with_chunk_size(budget.size)
        .with_chunk_overlap(budget.overlap);

    let chars: Vec<char> = text.chars().collect();
    let mut locator = FragmentLocator::new(&chars);
    let mut chunks = Vec::new();

    for fragment in splitter.split_text(text) {
        let Some(span) = locator.next_span(&fragment) else {
            warn!(
                block_start,
                placed = locator.has_previous(),
                "Dropping plaintext fragment that could not be placed"
            );
            continue;
        };
        chunks.push(ContentChunk {
            header: context.to_string(),
            text: fragment,
            start: block_start.saturating_add(span.start),
            end: block_start.saturating_add(span.end),
        });
    }
    chunks
}
