//! Chunk merger
//!
//! Content chunks are grouped left to right while the group stays within the
//! token budget. Inside a group a chunk whose header context differs from its
//! predecessor contributes only the changed header lines. A group that
//! follows a multi-chunk group is kept `overlap` tokens smaller, and starts
//! with the tail of that group repeated.

use super::traits::TokenCounter;
use super::{ChunkBudget, ContentChunk, TextChunk};
use std::ops::Range;
use tracing::{debug, warn};

pub(crate) fn merge_chunks(
    chunks: &[ContentChunk],
    counter: &dyn TokenCounter,
    budget: ChunkBudget,
) -> Vec<TextChunk> {
    let groups = group_chunks(chunks, counter, budget);
    debug!(
        content_chunks = chunks.len(),
        groups = groups.len(),
        "Grouped content chunks"
    );

    let mut merged = Vec::with_capacity(groups.len());
    let mut previous: Option<&Range<usize>> = None;
    for group in &groups {
        let overlap = previous
            .filter(|range| range.len() > 1)
            .and_then(|range| {
                let next_header = chunks.get(group.start).map(|c| c.header.as_str())?;
                overlap_tail(chunks, range, next_header, counter, budget.overlap)
            });
        if let Some(chunk) = materialize(chunks, group, overlap, counter, budget) {
            merged.push(chunk);
        }
        previous = Some(group);
    }
    merged
}

/// Phase one: contiguous ranges of chunks that fit the budget together
fn group_chunks(
    chunks: &[ContentChunk],
    counter: &dyn TokenCounter,
    budget: ChunkBudget,
) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let Some(first) = chunks.first() else {
        return groups;
    };

    let mut start = 0;
    let mut size = counter.count(&first.render());
    let mut previous_len = 0;

    for (index, pair) in chunks.windows(2).enumerate() {
        let [before, chunk] = pair else {
            continue;
        };
        let index = index.saturating_add(1);
        let diff = header_diff(&before.header, &chunk.header);
        let added = if diff.is_empty() {
            counter.count(&format!("\n{}", chunk.text))
        } else {
            counter.count(&format!("\n{diff}\n{}", chunk.text))
        };
        let ceiling = if previous_len > 1 {
            budget.size.saturating_sub(budget.overlap)
        } else {
            budget.size
        };

        if size.saturating_add(added) <= ceiling {
            size = size.saturating_add(added);
        } else {
            groups.push(start..index);
            previous_len = index.saturating_sub(start);
            start = index;
            size = counter.count(&chunk.render());
        }
    }
    groups.push(start..chunks.len());
    groups
}

/// Text repeated from the end of the previous group, with the offset where it
/// starts
///
/// Walks back from the group's last chunk, never reaching its first, while
/// the header context matches the next group's and the text stays within
/// `overlap` tokens.
fn overlap_tail(
    chunks: &[ContentChunk],
    previous: &Range<usize>,
    next_header: &str,
    counter: &dyn TokenCounter,
    overlap: usize,
) -> Option<(String, usize)> {
    let mut tail: Option<(String, usize)> = None;
    for index in (previous.start.saturating_add(1)..previous.end).rev() {
        let Some(chunk) = chunks.get(index) else {
            break;
        };
        if chunk.header != next_header {
            break;
        }
        let candidate = match &tail {
            Some((text, _)) => format!("{}\n{text}", chunk.text),
            None => chunk.text.clone(),
        };
        if counter.count(&candidate) > overlap {
            break;
        }
        tail = Some((candidate, chunk.start));
    }
    tail
}

/// Phase two: render one group as an output chunk
fn materialize(
    chunks: &[ContentChunk],
    group: &Range<usize>,
    overlap: Option<(String, usize)>,
    counter: &dyn TokenCounter,
    budget: ChunkBudget,
) -> Option<TextChunk> {
    let members = chunks.get(group.clone())?;
    let first = members.first()?;

    let mut lines: Vec<&str> = Vec::new();
    if !first.header.is_empty() {
        lines.push(&first.header);
    }
    let start = match &overlap {
        Some((text, start)) => {
            lines.push(text);
            *start
        }
        None => first.start,
    };
    lines.push(&first.text);

    let diffs: Vec<String> = members
        .windows(2)
        .map(|pair| match pair {
            [before, after] => header_diff(&before.header, &after.header),
            _ => String::new(),
        })
        .collect();
    for (chunk, diff) in members.iter().skip(1).zip(&diffs) {
        if !diff.is_empty() {
            lines.push(diff);
        }
        lines.push(&chunk.text);
    }

    let mut text = lines.join("\n");
    let mut token_count = counter.count(&text);
    if token_count > budget.size {
        warn!(
            token_count,
            chunk_size = budget.size,
            "Merged chunk exceeds the token budget, truncating"
        );
        text = counter.truncate(&text, budget.size);
        token_count = counter.count(&text);
    }

    let end = members.iter().map(|c| c.end).max().unwrap_or(first.end);
    Some(TextChunk {
        text,
        start_position: start,
        end_position: end,
        token_count,
    })
}

/// Header lines of `current` that are new relative to `previous`
///
/// The lines of `current` from the first one that differs; when `previous`
/// is a strict prefix, the lines `current` adds. Empty when nothing changed.
pub(crate) fn header_diff(previous: &str, current: &str) -> String {
    if previous == current || current.is_empty() {
        return String::new();
    }
    let before: Vec<&str> = if previous.is_empty() {
        Vec::new()
    } else {
        previous.split('\n').collect()
    };
    let after: Vec<&str> = current.split('\n').collect();

    after
        .iter()
        .enumerate()
        .find(|&(i, line)| before.get(i) != Some(line))
        .map(|(i, _)| after.get(i..).unwrap_or_default().join("\n"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TiktokenCounter;

    fn chunk(header: &str, text: &str, start: usize) -> ContentChunk {
        ContentChunk {
            header: header.to_string(),
            text: text.to_string(),
            start,
            end: start + text.chars().count() - 1,
        }
    }

    fn counter() -> TiktokenCounter {
        TiktokenCounter::new("gpt-3.5-turbo").expect("Should create counter")
    }

    #[test]
    fn test_header_diff() {
        assert_eq!(header_diff("# A\n## B", "# A\n## C"), "## C");
        assert_eq!(header_diff("# A", "# A\n## B\n### C"), "## B\n### C");
        assert_eq!(header_diff("# A\n## B", "# X\n## B"), "# X\n## B");
        assert_eq!(header_diff("", "# A"), "# A");
        assert_eq!(header_diff("# A\n## B", "# A"), "");
        assert_eq!(header_diff("# A", "# A"), "");
    }

    #[test]
    fn test_everything_fits_in_one_chunk() {
        let chunks = vec![
            chunk("# A", "alpha text", 4),
            chunk("# A\n## B", "beta text", 24),
            chunk("# A\n## B", "gamma text", 40),
        ];
        let merged = merge_chunks(&chunks, &counter(), ChunkBudget::new(512, 100));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "# A\nalpha text\n## B\nbeta text\ngamma text");
        assert_eq!(merged[0].start_position, 4);
        assert_eq!(merged[0].end_position, 49);
        assert_eq!(merged[0].token_count, counter().count(&merged[0].text));
    }

    #[test]
    fn test_groups_respect_budget_and_overlap() {
        let words = ["one", "two", "three", "four", "five", "six", "seven", "eight"];
        let mut start = 0;
        let chunks: Vec<ContentChunk> = words
            .iter()
            .map(|word| {
                let text = format!("{word} {word} {word}");
                let c = chunk("", &text, start);
                start = c.end + 2;
                c
            })
            .collect();
        let counter = counter();
        let merged = merge_chunks(&chunks, &counter, ChunkBudget::new(10, 3));

        assert!(merged.len() > 1);
        for chunk in &merged {
            assert!(chunk.token_count <= 10, "{chunk:?}");
        }
        for pair in merged.windows(2) {
            assert!(pair[1].start_position > pair[0].start_position);
        }
        // the second group opens with the tail of the first
        let first_tail = merged[0].text.lines().last().expect("Should have lines");
        assert!(merged[1].text.starts_with(first_tail));
    }

    #[test]
    fn test_overlap_never_repeats_a_group_first_chunk() {
        // "one" alone would fit the overlap, but it opens the first group
        let chunks = vec![
            chunk("", "one", 0),
            chunk("", "one two three four five six", 4),
            chunk("", "seven eight nine", 32),
        ];
        let merged = merge_chunks(&chunks, &counter(), ChunkBudget::new(10, 3));

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "one\none two three four five six");
        assert_eq!(merged[1].text, "seven eight nine");
        assert_eq!(merged[1].start_position, 32);
    }

    #[test]
    fn test_single_chunk_over_budget_is_truncated() {
        let long = "word ".repeat(40);
        let chunks = vec![chunk("", long.trim_end(), 0)];
        let merged = merge_chunks(&chunks, &counter(), ChunkBudget::new(10, 2));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].token_count, 10);
        assert!(long.starts_with(&merged[0].text));
    }

    #[test]
    fn test_no_chunks_no_output() {
        assert!(merge_chunks(&[], &counter(), ChunkBudget::new(10, 2)).is_empty());
    }
}
