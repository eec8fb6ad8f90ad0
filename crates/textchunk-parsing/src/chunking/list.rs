//! List chunker
//!
//! Items are accumulated while they fit. When one does not, the pending chunk
//! is flushed and the transition is classified to decide which item, if any,
//! is repeated at the top of the next chunk. An item larger than the budget
//! on its own is cut into word pieces, or character pieces when a word is
//! too long.

use super::{ChunkBudget, ContentChunk, char_len, join_context};
use crate::parsing::{ListBlock, ListItem};
use tracing::warn;

/// Attempts at one item before overlap is given up
const MAX_RETRIES: usize = 5;
/// Longest word an oversized item is cut around
const MAX_WORD_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListChunkState {
    /// Add the current item to the pending chunk
    Accumulate,
    /// Flush, then restart at the current item
    FlushNoOverlap,
    /// Flush, then restart at the current item led by its previous sibling
    FlushPreviousList,
    /// Flush, then restart at the final item of the flushed chunk
    FlushLastChunkFinal,
}

struct Pending {
    ancestors: String,
    /// Earlier sibling repeated in front of the items
    lead: Option<usize>,
    items: Vec<usize>,
    size: usize,
}

pub(crate) fn chunk_list(list: &ListBlock, context: &str, budget: ChunkBudget) -> Vec<ContentChunk> {
    ListChunker {
        list,
        context,
        budget,
        chunks: Vec::new(),
    }
    .run()
}

struct ListChunker<'a> {
    list: &'a ListBlock,
    context: &'a str,
    budget: ChunkBudget,
    chunks: Vec<ContentChunk>,
}

impl ListChunker<'_> {
    fn run(mut self) -> Vec<ContentChunk> {
        let list = self.list;
        let mut retries = vec![0usize; list.items.len()];
        let mut pending: Option<Pending> = None;
        let mut lead: Option<usize> = None;
        let mut state = ListChunkState::Accumulate;
        let mut index = 0;

        while let Some(item) = list.get(index) {
            match state {
                ListChunkState::Accumulate => {
                    if item.size() > self.budget.size {
                        self.flush(pending.take());
                        self.split_oversized(index);
                        index = index.saturating_add(1);
                        continue;
                    }
                    match pending.as_mut() {
                        None => {
                            pending = Some(self.open(index, lead.take()));
                            index = index.saturating_add(1);
                        }
                        Some(open)
                            if open.size.saturating_add(item.size()).saturating_add(1)
                                < self.budget.size =>
                        {
                            open.items.push(index);
                            open.size = open.size.saturating_add(item.size()).saturating_add(1);
                            index = index.saturating_add(1);
                        }
                        Some(open) => {
                            let attempts = retries.get_mut(index).map_or(MAX_RETRIES, |count| {
                                *count = count.saturating_add(1);
                                *count
                            });
                            state = if attempts > MAX_RETRIES {
                                warn!(item = index, "List item retried too often, dropping overlap");
                                ListChunkState::FlushNoOverlap
                            } else {
                                self.classify(index, open)
                            };
                        }
                    }
                }
                ListChunkState::FlushNoOverlap => {
                    self.flush(pending.take());
                    state = ListChunkState::Accumulate;
                }
                ListChunkState::FlushPreviousList => {
                    self.flush(pending.take());
                    lead = item.previous;
                    state = ListChunkState::Accumulate;
                }
                ListChunkState::FlushLastChunkFinal => {
                    self.flush(pending.take());
                    index = index.saturating_sub(1);
                    state = ListChunkState::Accumulate;
                }
            }
        }
        self.flush(pending.take());
        self.chunks
    }

    /// Decide how the chunk after the cut before `index` starts
    fn classify(&self, index: usize, flushed: &Pending) -> ListChunkState {
        let (Some(item), Some(final_index)) = (self.list.get(index), flushed.items.last().copied())
        else {
            return ListChunkState::FlushNoOverlap;
        };
        let Some(last) = self.list.get(final_index).filter(|_| index > 0) else {
            return ListChunkState::FlushNoOverlap;
        };

        if last.indentation > item.indentation {
            let sibling_fits = item
                .previous
                .and_then(|previous| self.list.get(previous))
                .is_some_and(|previous| previous.size() <= self.budget.overlap);
            return if sibling_fits {
                ListChunkState::FlushPreviousList
            } else {
                ListChunkState::FlushNoOverlap
            };
        }

        if last.indentation == item.indentation && last.is_numeric != item.is_numeric {
            return ListChunkState::FlushNoOverlap;
        }

        let reopened = self
            .opening_size(final_index, None)
            .saturating_add(item.size())
            .saturating_add(1);
        let repeat_final = final_index.saturating_add(1) == index
            && flushed.items.len() > 1
            && last.size() <= self.budget.overlap
            && reopened < self.budget.size;
        if repeat_final {
            ListChunkState::FlushLastChunkFinal
        } else {
            ListChunkState::FlushNoOverlap
        }
    }

    fn open(&self, index: usize, lead: Option<usize>) -> Pending {
        let item_size = self.list.get(index).map_or(0, ListItem::size);
        let lead = lead.filter(|&lead| {
            self.opening_size(index, Some(lead))
                .saturating_add(item_size)
                < self.budget.size
        });
        Pending {
            ancestors: self.ancestor_chain(index),
            lead,
            items: vec![index],
            size: self.opening_size(index, lead).saturating_add(item_size),
        }
    }

    /// Size of a chunk opened at `index` before the item itself is added
    fn opening_size(&self, index: usize, lead: Option<usize>) -> usize {
        let header = join_context([self.context, self.ancestor_chain(index).as_str()]);
        let header_size = match char_len(&header) {
            0 => 0,
            size => size.saturating_add(1),
        };
        let lead_size = lead
            .and_then(|lead| self.list.get(lead))
            .map_or(0, |lead| lead.size().saturating_add(1));
        header_size.saturating_add(lead_size)
    }

    /// Ancestor lines of an item, outermost first, leaving out any line that
    /// alone exceeds the budget
    fn ancestor_chain(&self, index: usize) -> String {
        let mut lines: Vec<&str> = self
            .list
            .ancestors(index)
            .filter(|ancestor| ancestor.size() <= self.budget.size)
            .map(|ancestor| ancestor.text.as_str())
            .collect();
        lines.reverse();
        join_context(lines)
    }

    fn flush(&mut self, pending: Option<Pending>) {
        let Some(pending) = pending else {
            return;
        };
        let first = pending.items.first().and_then(|&i| self.list.get(i));
        let last = pending.items.last().and_then(|&i| self.list.get(i));
        let (Some(first), Some(last)) = (first, last) else {
            return;
        };

        let text = pending
            .lead
            .iter()
            .chain(&pending.items)
            .filter_map(|&i| self.list.get(i))
            .map(|item| item.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let intro = self.list.header_text.as_str();
        let intro_fits = pending
            .size
            .saturating_add(char_len(intro))
            .saturating_add(1)
            < self.budget.size;

        self.chunks.push(ContentChunk {
            header: join_context([
                self.context,
                if intro_fits { intro } else { "" },
                pending.ancestors.as_str(),
            ]),
            text,
            start: first.start,
            end: last.end,
        });
    }

    /// Cut one item that exceeds the budget into overlapping pieces
    fn split_oversized(&mut self, index: usize) {
        let Some(item) = self.list.get(index) else {
            return;
        };
        let ancestors = self.ancestor_chain(index);
        let header = join_context([
            self.context,
            self.list.header_text.as_str(),
            ancestors.as_str(),
        ]);

        let mut limit = self.budget.size.saturating_sub(char_len(&header));
        if limit == 0 || limit <= self.budget.overlap {
            limit = self.budget.size;
        }

        let chars: Vec<char> = item.text.chars().collect();
        let pieces = pieces(&chars, limit);
        let span_len = |from: usize, to: usize| to.saturating_sub(from).saturating_add(1);

        let mut first = 0;
        while let Some(&(start, _)) = pieces.get(first) {
            let mut last = first;
            while let Some(&(_, end)) = pieces.get(last.saturating_add(1)) {
                if span_len(start, end) > limit {
                    break;
                }
                last = last.saturating_add(1);
            }
            let end = pieces.get(last).map_or(start, |&(_, end)| end);

            let text: String = chars.get(start..=end).unwrap_or_default().iter().collect();
            if !text.trim().is_empty() {
                self.chunks.push(ContentChunk {
                    header: header.clone(),
                    text,
                    start: item.start.saturating_add(start),
                    end: item.start.saturating_add(end),
                });
            }

            let mut next = last.saturating_add(1);
            if next >= pieces.len() {
                break;
            }
            while let Some(candidate) = next.checked_sub(1).filter(|&c| c > first) {
                let Some(&(candidate_start, _)) = pieces.get(candidate) else {
                    break;
                };
                if span_len(candidate_start, end) > self.budget.overlap {
                    break;
                }
                next = candidate;
            }
            first = next;
        }
    }
}

/// Inclusive character ranges of the words in `chars`, or of every character
/// when some word is longer than `limit` or [`MAX_WORD_LEN`]
fn pieces(chars: &[char], limit: usize) -> Vec<(usize, usize)> {
    let mut words = Vec::new();
    let mut word_start: Option<usize> = None;
    for (i, c) in chars.iter().enumerate() {
        match (c.is_whitespace(), word_start) {
            (true, Some(start)) => {
                words.push((start, i.saturating_sub(1)));
                word_start = None;
            }
            (false, None) => word_start = Some(i),
            _ => {}
        }
    }
    if let Some(start) = word_start {
        words.push((start, chars.len().saturating_sub(1)));
    }

    let max_word = MAX_WORD_LEN.min(limit);
    let too_long = words
        .iter()
        .any(|&(start, end)| end.saturating_sub(start).saturating_add(1) > max_word);
    if too_long {
        (0..chars.len()).map(|i| (i, i)).collect()
    } else {
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{ContentKind, parse_documents};

    fn list(text: &str) -> ListBlock {
        let documents = parse_documents(text);
        match documents.first().and_then(|d| d.contents.first()).map(|c| &c.kind) {
            Some(ContentKind::List(list)) => list.clone(),
            other => panic!("Expected a list, got {other:?}"),
        }
    }

    fn assert_slices_match(text: &str, chunks: &[ContentChunk]) {
        let chars: Vec<char> = text.chars().collect();
        for chunk in chunks {
            let slice: String = chars[chunk.start..=chunk.end].iter().collect();
            assert!(chunk.text.ends_with(&slice) || slice == chunk.text, "{chunk:?}");
        }
    }

    #[test]
    fn test_small_list_is_one_chunk_with_intro() {
        let text = "Intro:\n- a\n- b\n  - c";
        let chunks = chunk_list(&list(text), "# H", ChunkBudget::new(512, 100));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].header, "# H\nIntro:");
        assert_eq!(chunks[0].text, "- a\n- b\n  - c");
        assert_eq!(chunks[0].start, 7);
        assert_eq!(chunks[0].end, text.chars().count() - 1);
    }

    #[test]
    fn test_final_item_repeats_after_cut() {
        let text = "- one\n- two\n- three\n- four";
        let chunks = chunk_list(&list(text), "", ChunkBudget::new(16, 10));

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["- one\n- two", "- two\n- three", "- three\n- four"]);
        for pair in chunks.windows(2) {
            assert!(pair[1].start > pair[0].start);
        }
        assert_slices_match(text, &chunks);
    }

    #[test]
    fn test_shallower_item_is_led_by_previous_sibling() {
        let text = "- a\n  - b1\n  - b2\n- c";
        let chunks = chunk_list(&list(text), "", ChunkBudget::new(14, 5));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "- a\n  - b1");
        assert_eq!(chunks[1].header, "- a");
        assert_eq!(chunks[1].text, "  - b2");
        assert_eq!(chunks[1].start, 11);
        assert_eq!(chunks[2].text, "- a\n- c");
        assert_eq!(chunks[2].start, 18);
        assert_slices_match(text, &chunks);
    }

    #[test]
    fn test_oversized_item_is_cut_by_words() {
        let text = "- parent\n  - alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = chunk_list(&list(text), "", ChunkBudget::new(30, 8));

        assert_eq!(chunks[0].text, "- parent");
        let pieces = &chunks[1..];
        assert!(pieces.len() >= 2);
        for piece in pieces {
            assert_eq!(piece.header, "- parent");
            assert!(piece.text.chars().count() <= 22, "{piece:?}");
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].start > pair[0].start);
        }
        assert_eq!(pieces.last().map(|c| c.end), Some(text.chars().count() - 1));
        assert_slices_match(text, &chunks);
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let chars: Vec<char> = "ab cdefgh".chars().collect();
        assert_eq!(pieces(&chars, 10), vec![(0, 1), (3, 8)]);
        assert_eq!(pieces(&chars, 4).len(), chars.len());
    }
}
