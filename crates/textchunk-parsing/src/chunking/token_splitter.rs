//! Fixed-size token windows

use super::tiktoken_counter::TiktokenCounter;
use super::traits::TextSplitter;

/// Cuts text into windows of `chunk_size` tokens sharing `chunk_overlap`
/// tokens with the previous window
#[derive(Debug)]
pub struct TokenSplitter<'a> {
    counter: &'a TiktokenCounter,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl<'a> TokenSplitter<'a> {
    pub const fn new(counter: &'a TiktokenCounter, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            counter,
            chunk_size,
            chunk_overlap,
        }
    }
}

impl TextSplitter for TokenSplitter<'_> {
    fn split_text(&self, text: &str) -> Vec<String> {
        self.counter
            .windows(text, self.chunk_size, self.chunk_overlap)
    }
}
