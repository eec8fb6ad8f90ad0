//! Trait definitions for token counting and text splitting

/// Trait for counting tokens in text
///
/// Implementations provide model-specific token counting. The merger only
/// needs counts and a way to cut text down to a token budget.
pub trait TokenCounter: Send + Sync {
    /// Get the name/identifier of this counter
    fn name(&self) -> &str;

    /// Count tokens in the given text
    ///
    /// This should be fast and deterministic for the same input
    fn count(&self, text: &str) -> usize;

    /// Longest prefix of `text` that encodes to at most `max_tokens` tokens
    /// and decodes to valid UTF-8
    fn truncate(&self, text: &str, max_tokens: usize) -> String;
}

/// Splits text into ordered fragments
///
/// Fragments are substrings of the input (possibly trimmed), in input order.
pub trait TextSplitter {
    fn split_text(&self, text: &str) -> Vec<String>;
}
