//! Shared test utilities for textchunk integration tests
//!
//! Sample documents plus assertions over chunk offsets. The helpers take
//! plain `(start, end)` pairs so they do not depend on the crates under test.
//!
//! ## Usage
//!
//! In your test crate's `Cargo.toml`:
//! ```toml
//! [dev-dependencies]
//! textchunk-test-utils = { path = "../textchunk-test-utils" }
//! ```
//!
//! In your tests:
//! ```ignore
//! let spans: Vec<(usize, usize)> = output.chunks.iter()
//!     .map(|c| (c.start_position, c.end_position))
//!     .collect();
//! textchunk_test_utils::assert_starts_increase(&spans);
//! textchunk_test_utils::assert_covers(text, &spans);
//! ```

use textchunk_config::{ChunkMethod, ChunkSettings};

/// A small guide with prose, a table and a nested list under two levels of
/// headers
pub const GUIDE_MARKDOWN: &str = "# Install Guide

Follow these steps to get a working setup on a fresh machine.
Each step is short.

## Requirements

| Tool | Version |
|------|---------|
| rustc | 1.85 |
| git | 2.40 |

## Steps

- Download the archive
  - Verify the checksum
  - Unpack it somewhere on your path
- Run the installer
- Restart the shell

# Troubleshooting

If the installer fails, read the log file and try again.
";

/// Plain prose with repeated sentences and no markdown structure
pub const PLAIN_PROSE: &str = "The quick brown fox jumps over the lazy dog. \
It was a bright cold day in April, and the clocks were striking thirteen. \
All happy families are alike; each unhappy family is unhappy in its own way. \
Call me Ishmael. Some years ago, never mind how long precisely, having little \
or no money in my purse, I thought I would sail about a little.

It is a truth universally acknowledged that a single man in possession of a \
good fortune must be in want of a wife. The quick brown fox jumps over the lazy dog.";

/// CJK text and emoji runs mixed with a few ASCII words
///
/// Most characters take several bytes and many split across tokens.
pub const MIXED_SCRIPT: &str = "日本語のテキスト、東京。🙂🙃🎉 emoji run 🚀🌍✨ and more 漢字の練習";

/// Markdown list whose second item is far longer than a small budget
pub fn oversized_list_markdown(words: usize) -> String {
    let long_item = vec!["lorem"; words].join(" ");
    format!("# Notes\n\n- parent item\n  - {long_item}\n- closing item\n")
}

/// Settings for `method` with explicit size and overlap
pub fn settings(method: ChunkMethod, chunk_size: usize, chunk_overlap: usize) -> ChunkSettings {
    ChunkSettings::for_method(method)
        .with_chunk_size(chunk_size)
        .with_chunk_overlap(chunk_overlap)
}

/// Characters `start..=end` of `text`
pub fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars()
        .skip(start)
        .take(end.saturating_sub(start).saturating_add(1))
        .collect()
}

/// Every span has `start < end` and lies inside a text of `char_len`
/// characters
///
/// # Panics
/// Panics when a span violates either rule
pub fn assert_spans_within(spans: &[(usize, usize)], char_len: usize) {
    for &(start, end) in spans {
        assert!(
            start < end && end < char_len,
            "span ({start}, {end}) is invalid for text of {char_len} characters"
        );
    }
}

/// Chunk starts strictly increase
///
/// # Panics
/// Panics on the first start that does not exceed its predecessor
pub fn assert_starts_increase(spans: &[(usize, usize)]) {
    for pair in spans.windows(2) {
        if let [(previous, _), (next, _)] = pair {
            assert!(next > previous, "chunk start {next} does not follow {previous}");
        }
    }
}

/// Every non-whitespace character of `text` lies inside some inclusive span
///
/// # Panics
/// Panics on the first character no span covers
pub fn assert_covers(text: &str, spans: &[(usize, usize)]) {
    for (index, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            continue;
        }
        assert!(
            spans.iter().any(|&(start, end)| start <= index && index <= end),
            "character {index} ({c:?}) is not covered by any chunk"
        );
    }
}
