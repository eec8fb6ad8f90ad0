//! Recursive separator-based splitting
//!
//! Sizes are measured in characters. The first separator present in the text
//! cuts it into pieces; pieces below the chunk size are merged back together
//! up to the chunk size, larger ones are cut again with the separators that
//! follow.

use super::char_len;
use super::traits::TextSplitter;
use textchunk_config::DEFAULT_SEPARATORS;
use tracing::trace;

/// Splits text on an ordered list of separators
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    keep_separator: bool,
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self {
            chunk_size: textchunk_config::DEFAULT_CHUNK_SIZE,
            chunk_overlap: textchunk_config::DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(ToString::to_string).collect(),
            keep_separator: false,
        }
    }
}

impl RecursiveCharacterSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub const fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    #[must_use]
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Re-attach each separator to the front of the piece that follows it
    #[must_use]
    pub const fn with_keep_separator(mut self, keep_separator: bool) -> Self {
        self.keep_separator = keep_separator;
        self
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, remaining) = choose_separator(text, separators);

        let mut splits = split_on(text, separator);
        let join_with = if self.keep_separator {
            splits = reattach(splits, separator);
            ""
        } else {
            separator
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();
        for split in splits {
            if char_len(&split) < self.chunk_size {
                fitting.push(split);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge_splits(&fitting, join_with));
                fitting.clear();
            }
            if remaining.is_empty() {
                chunks.push(split);
            } else {
                chunks.extend(self.split_recursive(&split, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge_splits(&fitting, join_with));
        }
        chunks
    }

    /// Greedily join small splits up to the chunk size, carrying a tail of at
    /// most `chunk_overlap` characters into the next chunk
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for split in splits {
            let split_len = char_len(split);
            let joined_len = if current.is_empty() {
                split_len
            } else {
                total.saturating_add(split_len).saturating_add(separator_len)
            };

            if joined_len > self.chunk_size && !current.is_empty() {
                if total > self.chunk_size {
                    trace!(total, chunk_size = self.chunk_size, "Created chunk larger than chunk size");
                }
                push_joined(&mut docs, &current, separator);

                while self.should_pop(total, split_len, separator_len, current.len()) {
                    let Some(first) = current.first() else { break };
                    total = total.saturating_sub(char_len(first));
                    if current.len() > 1 {
                        total = total.saturating_sub(separator_len);
                    }
                    current.remove(0);
                }
            }

            current.push(split);
            total = total.saturating_add(split_len);
            if current.len() > 1 {
                total = total.saturating_add(separator_len);
            }
        }
        push_joined(&mut docs, &current, separator);
        docs
    }

    const fn should_pop(
        &self,
        total: usize,
        split_len: usize,
        separator_len: usize,
        current_len: usize,
    ) -> bool {
        let separator_len = if current_len < 2 { 0 } else { separator_len };
        current_len > 0
            && (total > self.chunk_overlap
                || (total.saturating_add(split_len).saturating_add(separator_len)
                    > self.chunk_size
                    && total > 0))
    }
}

impl TextSplitter for RecursiveCharacterSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }
}

/// The first separator that is empty or occurs in `text`, with the ones after
/// it; the last separator with nothing after it when none matches
fn choose_separator<'s>(text: &str, separators: &'s [String]) -> (&'s str, &'s [String]) {
    separators
        .iter()
        .position(|s| s.is_empty() || text.contains(s.as_str()))
        .and_then(|i| {
            let chosen = separators.get(i)?;
            Some((chosen.as_str(), separators.get(i.saturating_add(1)..).unwrap_or_default()))
        })
        .unwrap_or_else(|| (separators.last().map_or("", String::as_str), &[]))
}

fn split_on(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator).map(ToString::to_string).collect()
    }
}

fn reattach(splits: Vec<String>, separator: &str) -> Vec<String> {
    splits
        .into_iter()
        .enumerate()
        .map(|(i, split)| if i == 0 { split } else { format!("{separator}{split}") })
        .collect()
}

fn push_joined(docs: &mut Vec<String>, parts: &[&str], separator: &str) {
    let doc = parts.join(separator);
    let doc = doc.trim();
    if !doc.is_empty() {
        docs.push(doc.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_split_at_chunk_size() {
        let splitter = RecursiveCharacterSplitter::new()
            .with_chunk_size(5)
            .with_separators([" ", "."]);
        assert_eq!(splitter.split_text("Hello world."), vec!["Hello", "world"]);
    }

    #[test]
    fn test_small_text_is_one_chunk() {
        let splitter = RecursiveCharacterSplitter::new();
        assert_eq!(
            splitter.split_text("First paragraph.\n\nSecond paragraph."),
            vec!["First paragraph.\n\nSecond paragraph."]
        );
    }

    #[test]
    fn test_paragraphs_are_preferred_cut_points() {
        let splitter = RecursiveCharacterSplitter::new()
            .with_chunk_size(20)
            .with_chunk_overlap(0);
        let chunks = splitter.split_text("aaaa bbbb cccc\n\ndddd eeee ffff");
        assert_eq!(chunks, vec!["aaaa bbbb cccc", "dddd eeee ffff"]);
    }

    #[test]
    fn test_overlap_repeats_trailing_words() {
        let splitter = RecursiveCharacterSplitter::new()
            .with_chunk_size(10)
            .with_chunk_overlap(4)
            .with_separators([" "]);
        let chunks = splitter.split_text("aa bb cc dd ee ff");
        assert_eq!(chunks, vec!["aa bb cc", "cc dd ee", "ee ff"]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn test_empty_separator_splits_characters() {
        let splitter = RecursiveCharacterSplitter::new()
            .with_chunk_size(3)
            .with_chunk_overlap(0)
            .with_separators([""]);
        assert_eq!(splitter.split_text("abcdefg"), vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_keep_separator_prefixes_following_piece() {
        let splitter = RecursiveCharacterSplitter::new()
            .with_chunk_size(7)
            .with_chunk_overlap(0)
            .with_separators(["."])
            .with_keep_separator(true);
        assert_eq!(splitter.split_text("one.two.three"), vec!["one.two", ".three"]);
    }

    #[test]
    fn test_unmatched_separators_fall_back_to_last() {
        let separators = vec!["|".to_string(), ";".to_string()];
        let (chosen, rest) = choose_separator("plain", &separators);
        assert_eq!(chosen, ";");
        assert!(rest.is_empty());

        let (chosen, rest) = choose_separator("a|b", &separators);
        assert_eq!(chosen, "|");
        assert_eq!(rest, &[";".to_string()]);
    }

    #[test]
    fn test_whitespace_only_text_yields_nothing() {
        assert!(RecursiveCharacterSplitter::new().split_text("  \n\n ").is_empty());
    }
}
