//! Markdown structure parsing
//!
//! [`parse_documents`] turns raw text into [`MarkdownDocument`]s: runs of
//! content blocks (tables, lists, paragraphs) under the markdown headers that
//! were active when each block opened.

mod cells;
mod document;
mod list;
mod table;

pub use cells::{CellValue, StructuredTable};
pub use document::{Content, ContentKind, Header, MarkdownDocument, parse_documents};
pub use list::{ListBlock, ListItem};
pub use table::{Table, TableLine};

pub(crate) use document::SourceLine;
