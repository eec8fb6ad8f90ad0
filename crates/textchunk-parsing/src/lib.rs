//! textchunk parsing and chunking crate
//!
//! Splits plain or markdown text into token-bounded chunks that keep exact
//! character offsets into the input. Markdown is first parsed into documents
//! of tables, lists and paragraphs under their active headers; each block is
//! chunked with a strategy suited to its kind and the pieces are merged back
//! up to the token budget with overlap between neighbours.

pub mod chunking;
pub mod error;
pub mod parsing;

// Re-export main types
pub use chunking::{
    ChunkBudget, ChunkOutput, ChunkingService, ContentChunk, RecursiveCharacterSplitter,
    TextChunk, TextSplitter, TiktokenCounter, TokenCounter, TokenSplitter, chunk_text,
};
pub use error::{ParsingError, ParsingResult};
pub use parsing::{CellValue, Content, ContentKind, Header, MarkdownDocument, StructuredTable, parse_documents};
