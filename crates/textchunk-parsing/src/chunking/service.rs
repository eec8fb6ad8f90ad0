//! Chunking service: the entry point tying settings, tokenizer and
//! strategies together

use super::markdown::markdown_content_chunks;
use super::merge::merge_chunks;
use super::position::FragmentLocator;
use super::recursive_splitter::RecursiveCharacterSplitter;
use super::tiktoken_counter::TiktokenCounter;
use super::token_splitter::TokenSplitter;
use super::traits::{TextSplitter, TokenCounter};
use super::{ChunkBudget, ChunkOutput, TextChunk};
use crate::error::ParsingResult;
use textchunk_common::RunId;
use textchunk_config::{ChunkMethod, ChunkSettings, Validate};
use tracing::{debug, info, info_span, warn};

/// Chunks text according to one set of validated settings
///
/// Building the service loads the tokenizer once; [`ChunkingService::chunk`]
/// can then be called for any number of inputs, from several threads.
#[derive(Debug)]
pub struct ChunkingService {
    settings: ChunkSettings,
    counter: TiktokenCounter,
}

impl ChunkingService {
    /// Validate `settings` and load the tokenizer they name
    ///
    /// # Errors
    /// Returns `ParsingError::Validation` for unusable sizes and
    /// `ParsingError::Tokenization` for an unknown model
    pub fn new(settings: ChunkSettings) -> ParsingResult<Self> {
        settings.validate()?;
        let counter = TiktokenCounter::from_settings(&settings)?;
        Ok(Self { settings, counter })
    }

    pub const fn settings(&self) -> &ChunkSettings {
        &self.settings
    }

    pub const fn counter(&self) -> &TiktokenCounter {
        &self.counter
    }

    /// Chunk `text` with the configured method
    ///
    /// Non-empty input always yields at least one chunk: when the method
    /// produces none, the whole input is returned as a single chunk.
    ///
    /// # Errors
    /// Returns `ParsingError::DisallowedSpecialToken` when the text contains a
    /// special token the settings do not allow
    pub fn chunk(&self, text: &str) -> ParsingResult<ChunkOutput> {
        let run_id = RunId::new();
        let span = info_span!(
            "chunk",
            %run_id,
            method = %self.settings.chunk_method,
            model = self.counter.name(),
            chunk_size = self.settings.chunk_size
        );
        let _guard = span.enter();

        self.counter.ensure_allowed(text)?;

        let mut chunks = match self.settings.chunk_method {
            ChunkMethod::Token => {
                let splitter = TokenSplitter::new(
                    &self.counter,
                    self.settings.chunk_size,
                    self.settings.chunk_overlap,
                );
                self.place_fragments(text, &splitter)
            }
            ChunkMethod::Recursive => {
                let splitter = RecursiveCharacterSplitter::new()
                    .with_chunk_size(self.settings.chunk_size)
                    .with_chunk_overlap(self.settings.chunk_overlap)
                    .with_separators(self.settings.separators.iter().cloned())
                    .with_keep_separator(self.settings.keep_separator);
                self.place_fragments(text, &splitter)
            }
            ChunkMethod::Markdown => self.chunk_markdown(text),
        };

        if chunks.is_empty() && !text.is_empty() {
            debug!("No chunks produced, returning the whole input");
            chunks.push(self.whole_text(text));
        }

        let output = ChunkOutput::new(chunks, self.counter.count(text));
        info!(
            chunks = output.chunk_count,
            total_tokens = output.total_token_count,
            "Chunked text"
        );
        Ok(output)
    }

    /// Split with `splitter` and recover each fragment's offsets
    fn place_fragments(&self, text: &str, splitter: &dyn TextSplitter) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let mut locator = FragmentLocator::new(&chars);

        splitter
            .split_text(text)
            .into_iter()
            .filter_map(|fragment| {
                let Some(span) = locator.next_span(&fragment) else {
                    warn!(
                        fragment_chars = fragment.chars().count(),
                        "Dropping fragment that could not be placed"
                    );
                    return None;
                };
                Some(TextChunk {
                    token_count: self.counter.count(&fragment),
                    text: fragment,
                    start_position: span.start,
                    end_position: span.end,
                })
            })
            .collect()
    }

    fn chunk_markdown(&self, text: &str) -> Vec<TextChunk> {
        let budget = ChunkBudget::new(self.settings.chunk_size, self.settings.chunk_overlap);
        let content_chunks = markdown_content_chunks(text, budget);
        merge_chunks(&content_chunks, &self.counter, budget)
    }

    fn whole_text(&self, text: &str) -> TextChunk {
        TextChunk {
            text: text.to_string(),
            start_position: 0,
            end_position: text.chars().count().saturating_sub(1),
            token_count: self.counter.count(text),
        }
    }
}

/// Chunk `text` with `settings` in one call
///
/// Prefer [`ChunkingService`] when chunking many inputs with the same
/// settings; it loads the tokenizer only once.
///
/// # Errors
/// See [`ChunkingService::new`] and [`ChunkingService::chunk`]
pub fn chunk_text(text: &str, settings: &ChunkSettings) -> ParsingResult<ChunkOutput> {
    ChunkingService::new(settings.clone())?.chunk(text)
}
