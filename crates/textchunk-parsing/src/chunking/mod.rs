//! Chunking strategies and the types they produce
//!
//! Plain text goes straight through a [`TextSplitter`]. Markdown is parsed
//! into documents first; each content block is cut by its own chunker into
//! [`ContentChunk`]s, which the merger regroups up to the token budget.

mod list;
mod markdown;
mod merge;
mod plaintext;
pub mod position;
mod recursive_splitter;
mod service;
mod table;
mod tiktoken_counter;
mod token_splitter;
pub mod traits;

pub use position::{FragmentLocator, Span};
pub use recursive_splitter::RecursiveCharacterSplitter;
pub use service::{ChunkingService, chunk_text};
pub use tiktoken_counter::{SPECIAL_TOKENS, TiktokenCounter};
pub use token_splitter::TokenSplitter;
pub use traits::{TextSplitter, TokenCounter};

use serde::{Deserialize, Serialize};

/// Size limits handed to the block chunkers, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBudget {
    pub size: usize,
    pub overlap: usize,
}

impl ChunkBudget {
    pub const fn new(size: usize, overlap: usize) -> Self {
        Self { size, overlap }
    }
}

/// A piece of one content block, before merging
///
/// `text` is source text running from `start` to `end` (inclusive character
/// offsets); list chunks may lead with an earlier sibling repeated for
/// context. `header` holds the context lines that belong in front of it:
/// active markdown headers, a table's head or a list item's ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    pub header: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl ContentChunk {
    /// The chunk as it reads on its own: header lines, then the text
    pub fn render(&self) -> String {
        if self.header.is_empty() {
            self.text.clone()
        } else {
            format!("{}\n{}", self.header, self.text)
        }
    }
}

/// One output chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TextChunk {
    pub text: String,
    /// Inclusive character offset of the first character
    pub start_position: usize,
    /// Inclusive character offset of the last character
    pub end_position: usize,
    pub token_count: usize,
}

/// Result of one chunking call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChunkOutput {
    pub chunks: Vec<TextChunk>,
    pub chunk_count: usize,
    /// Tokens in the whole input
    pub total_token_count: usize,
    /// Sum of the chunks' token counts
    pub chunks_token_count: usize,
}

impl ChunkOutput {
    /// Wrap `chunks` and fill in the counters
    pub fn new(chunks: Vec<TextChunk>, total_token_count: usize) -> Self {
        let chunks_token_count = chunks.iter().map(|c| c.token_count).sum();
        Self {
            chunk_count: chunks.len(),
            chunks,
            total_token_count,
            chunks_token_count,
        }
    }
}

/// Join the non-blank context parts, one per line
pub(crate) fn join_context<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_puts_header_on_its_own_line() {
        let chunk = ContentChunk {
            header: "# Title".to_string(),
            text: "Body".to_string(),
            start: 8,
            end: 11,
        };
        assert_eq!(chunk.render(), "# Title\nBody");

        let bare = ContentChunk {
            header: String::new(),
            ..chunk
        };
        assert_eq!(bare.render(), "Body");
    }

    #[test]
    fn test_output_counters_and_keys() {
        let output = ChunkOutput::new(
            vec![
                TextChunk {
                    text: "Hello".to_string(),
                    start_position: 0,
                    end_position: 4,
                    token_count: 1,
                },
                TextChunk {
                    text: "world".to_string(),
                    start_position: 6,
                    end_position: 10,
                    token_count: 1,
                },
            ],
            3,
        );
        assert_eq!(output.chunk_count, 2);
        assert_eq!(output.chunks_token_count, 2);

        let json = serde_json::to_value(&output).expect("Should serialize");
        assert_eq!(json["total-token-count"], 3);
        assert_eq!(json["chunks"][1]["start-position"], 6);
        assert_eq!(json["chunks"][1]["token-count"], 1);
    }
}
