//! Table chunker
//!
//! Every chunk repeats the table head. Rows are added greedily while the
//! head and rows stay below the budget; a short row just before a cut is
//! repeated at the top of the next chunk.

use super::{ChunkBudget, ContentChunk, char_len, join_context};
use crate::parsing::{Table, TableLine};

pub(crate) fn chunk_table(table: &Table, context: &str, budget: ChunkBudget) -> Vec<ContentChunk> {
    let head = join_context([
        context,
        table.header_text.as_str(),
        table.header_row.text.as_str(),
        table.separator.as_ref().map_or("", |s| s.text.as_str()),
    ]);

    if table.rows.is_empty() {
        return vec![head_only(table, context)];
    }

    let head_size = char_len(&head);
    let rows = &table.rows;
    let mut chunks = Vec::new();
    let mut previous_first: Option<usize> = None;
    let mut next = 0;

    while next < rows.len() {
        let overlap_row = next
            .checked_sub(1)
            .filter(|&row| previous_first.is_some_and(|first| first < row))
            .filter(|&row| rows.get(row).is_some_and(|r| r.size() < budget.overlap));
        let first = overlap_row.unwrap_or(next);

        let mut last = next;
        let mut size = rows
            .get(first..=last)
            .map_or(0, |taken| taken.iter().map(|r| r.size().saturating_add(1)).sum::<usize>())
            .saturating_add(head_size);
        while let Some(row) = rows.get(last.saturating_add(1)) {
            let grown = size.saturating_add(row.size()).saturating_add(1);
            if grown >= budget.size {
                break;
            }
            size = grown;
            last = last.saturating_add(1);
        }

        if let Some(chunk) = rows.get(first..=last).and_then(|taken| rows_chunk(&head, taken)) {
            chunks.push(chunk);
        }
        previous_first = Some(first);
        next = last.saturating_add(1);
    }
    chunks
}

fn rows_chunk(head: &str, rows: &[TableLine]) -> Option<ContentChunk> {
    let (first, last) = (rows.first()?, rows.last()?);
    Some(ContentChunk {
        header: head.to_string(),
        text: rows
            .iter()
            .map(|row| row.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        start: first.start,
        end: last.end(),
    })
}

/// A table with no data rows is emitted as its head
fn head_only(table: &Table, context: &str) -> ContentChunk {
    let text = match &table.separator {
        Some(separator) => format!("{}\n{}", table.header_row.text, separator.text),
        None => table.header_row.text.clone(),
    };
    ContentChunk {
        header: join_context([context, table.header_text.as_str()]),
        text,
        start: table.header_row.start,
        end: table.head_end().end(),
    }
}
