//! Document parser
//!
//! The input is read line by line. Blank lines and header lines delimit
//! blocks; every block is classified as a table, a list or plain text.
//! Consecutive plain text blocks form one paragraph content until a header,
//! table or list interrupts them.

use super::list::{ListBlock, is_list_start};
use super::table::{Table, is_row, is_separator};
use tracing::debug;

const MAX_HEADER_LEVEL: usize = 6;
/// How many leading lines of a block are checked for a list marker
const LIST_PROBE_LINES: usize = 5;

/// One input line and the offset of its first character
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceLine {
    pub text: String,
    pub start: usize,
}

impl SourceLine {
    fn end(&self) -> usize {
        self.start
            .saturating_add(self.text.chars().count())
            .saturating_sub(1)
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A markdown heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// 1 for `#`, up to 6
    pub level: usize,
    /// The heading line without surrounding blanks, markers included
    pub text: String,
    /// Length of `text` in characters
    pub size: usize,
}

impl Header {
    /// Parse a heading line: leading blanks, then one to six `#` followed by
    /// whitespace or the end of the line
    pub fn parse(line: &str) -> Option<Self> {
        let stripped = line.trim_start_matches([' ', '\t']);
        let level = stripped.chars().take_while(|&c| c == '#').count();
        if level == 0 || level > MAX_HEADER_LEVEL {
            return None;
        }
        let rest = stripped.get(level..).unwrap_or_default();
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }

        let text = line.trim().to_string();
        Some(Self {
            level,
            size: text.chars().count(),
            text,
        })
    }
}

/// Kinds of content block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Table(Table),
    List(ListBlock),
    /// Verbatim source of the paragraph run
    Plaintext(String),
}

/// One content block of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub kind: ContentKind,
    /// Offset of the first character of the block
    pub block_start: usize,
    /// Offset of the last character of the block
    pub block_end: usize,
    /// Headers active when the block opened, shallowest first
    pub headers: Vec<Header>,
}

impl Content {
    /// The active headers as context lines
    pub fn header_context(&self) -> String {
        join_headers(&self.headers)
    }
}

/// A run of content under one header context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownDocument {
    /// Headers still active when the document closed, one per level,
    /// shallowest first
    pub headers: Vec<Header>,
    pub contents: Vec<Content>,
}

impl MarkdownDocument {
    pub fn header_context(&self) -> String {
        join_headers(&self.headers)
    }
}

fn join_headers(headers: &[Header]) -> String {
    headers
        .iter()
        .filter(|header| !header.text.trim().is_empty())
        .map(|header| header.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `text` into documents
///
/// A new document starts when a header re-declares a level that is already
/// active in a document that has content. Shallower headers carry over.
pub fn parse_documents(text: &str) -> Vec<MarkdownDocument> {
    let chars: Vec<char> = text.chars().collect();
    let mut builder = DocumentBuilder::new(&chars);
    let mut block: Vec<SourceLine> = Vec::new();

    for line in split_lines(&chars) {
        if line.is_blank() {
            builder.push_block(&block);
            block.clear();
        } else if let Some(header) = Header::parse(&line.text) {
            builder.push_block(&block);
            block.clear();
            builder.push_header(header);
        } else {
            block.push(line);
        }
    }
    builder.push_block(&block);

    let documents = builder.finish();
    debug!(documents = documents.len(), "Parsed markdown documents");
    documents
}

fn split_lines(chars: &[char]) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut start = 0;
    for piece in chars.split(|&c| c == '\n') {
        lines.push(SourceLine {
            text: piece.iter().collect(),
            start,
        });
        start = start.saturating_add(piece.len()).saturating_add(1);
    }
    lines
}

struct Paragraph {
    start: usize,
    end: usize,
    headers: Vec<Header>,
}

struct DocumentBuilder<'a> {
    source: &'a [char],
    active: [Option<Header>; MAX_HEADER_LEVEL],
    last_level: usize,
    paragraph: Option<Paragraph>,
    current: MarkdownDocument,
    documents: Vec<MarkdownDocument>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(source: &'a [char]) -> Self {
        Self {
            source,
            active: Default::default(),
            last_level: 0,
            paragraph: None,
            current: MarkdownDocument::default(),
            documents: Vec::new(),
        }
    }

    fn active_headers(&self) -> Vec<Header> {
        self.active.iter().flatten().cloned().collect()
    }

    fn push_header(&mut self, header: Header) {
        self.flush_paragraph();

        let slot = header.level.saturating_sub(1);
        let redeclared = self.active.get(slot).is_some_and(Option::is_some);
        if redeclared && !self.current.contents.is_empty() {
            self.finish_document();
        }

        for (index, active) in self.active.iter_mut().enumerate().skip(slot) {
            *active = if index == slot { Some(header.clone()) } else { None };
        }
        self.last_level = header.level;
    }

    fn push_block(&mut self, lines: &[SourceLine]) {
        let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
            return;
        };
        let (block_start, block_end) = (first.start, last.end());

        let kind = if lines.iter().all(|line| is_row(&line.text)) {
            Table::from_lines(&[], lines).map(ContentKind::Table)
        } else if lines
            .iter()
            .take(LIST_PROBE_LINES)
            .any(|line| is_list_start(&line.text))
        {
            Some(ContentKind::List(ListBlock::from_lines(lines)))
        } else {
            captioned_table(lines).map(ContentKind::Table)
        };

        match kind {
            Some(kind) => {
                self.flush_paragraph();
                let headers = self.active_headers();
                self.current.contents.push(Content {
                    kind,
                    block_start,
                    block_end,
                    headers,
                });
            }
            None => self.extend_paragraph(block_start, block_end),
        }
    }

    fn extend_paragraph(&mut self, start: usize, end: usize) {
        match self.paragraph.as_mut() {
            Some(paragraph) => paragraph.end = end,
            None => {
                self.paragraph = Some(Paragraph {
                    start,
                    end,
                    headers: self.active_headers(),
                });
            }
        }
    }

    fn flush_paragraph(&mut self) {
        let Some(paragraph) = self.paragraph.take() else {
            return;
        };
        let text: String = self
            .source
            .get(paragraph.start..=paragraph.end)
            .unwrap_or_default()
            .iter()
            .collect();
        self.current.contents.push(Content {
            kind: ContentKind::Plaintext(text),
            block_start: paragraph.start,
            block_end: paragraph.end,
            headers: paragraph.headers,
        });
    }

    fn finish_document(&mut self) {
        for active in self.active.iter_mut().skip(self.last_level) {
            *active = None;
        }
        let mut document = std::mem::take(&mut self.current);
        document.headers = self.active_headers();
        if !document.contents.is_empty() {
            self.documents.push(document);
        }
    }

    fn finish(mut self) -> Vec<MarkdownDocument> {
        self.flush_paragraph();
        self.finish_document();
        self.documents
    }
}

/// A block of caption lines directly followed by at least two pipe lines,
/// one of them a separator
fn captioned_table(lines: &[SourceLine]) -> Option<Table> {
    let first_row = lines.iter().position(|line| is_row(&line.text))?;
    let (caption, rows) = lines.split_at(first_row);
    let is_table = rows.len() >= 2
        && rows.iter().all(|line| is_row(&line.text))
        && rows.iter().any(|line| is_separator(&line.text));
    if is_table {
        Table::from_lines(caption, rows)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plaintext(content: &Content) -> &str {
        match &content.kind {
            ContentKind::Plaintext(text) => text,
            other => panic!("Expected plaintext, got {other:?}"),
        }
    }

    fn header_texts(headers: &[Header]) -> Vec<&str> {
        headers.iter().map(|h| h.text.as_str()).collect()
    }

    #[test]
    fn test_header_parsing() {
        let header = Header::parse("## Section").expect("Should parse header");
        assert_eq!(header.level, 2);
        assert_eq!(header.text, "## Section");
        assert_eq!(header.size, 10);

        assert_eq!(Header::parse("  # Indented").map(|h| h.level), Some(1));
        assert_eq!(Header::parse("###").map(|h| h.level), Some(3));
        assert!(Header::parse("#hashtag").is_none());
        assert!(Header::parse("####### too deep").is_none());
        assert!(Header::parse("plain").is_none());
    }

    #[test]
    fn test_text_without_headers_is_one_content() {
        let text = "First paragraph.\n\nSecond paragraph\nwith two lines.";
        let documents = parse_documents(text);

        assert_eq!(documents.len(), 1);
        let contents = &documents[0].contents;
        assert_eq!(contents.len(), 1);
        assert_eq!(plaintext(&contents[0]), text);
        assert_eq!(contents[0].block_start, 0);
        assert_eq!(contents[0].block_end, text.chars().count() - 1);
        assert!(documents[0].headers.is_empty());
    }

    #[test]
    fn test_blank_input_has_no_documents() {
        assert!(parse_documents("").is_empty());
        assert!(parse_documents("\n  \n\t\n").is_empty());
    }

    #[test]
    fn test_header_then_paragraph() {
        let documents = parse_documents("# Title\nBody text here.");
        assert_eq!(documents.len(), 1);
        let content = &documents[0].contents[0];
        assert_eq!(plaintext(content), "Body text here.");
        assert_eq!(content.block_start, 8);
        assert_eq!(content.header_context(), "# Title");
        assert_eq!(documents[0].header_context(), "# Title");
    }

    #[test]
    fn test_redeclared_level_starts_new_document() {
        let text = "# A\nalpha\n## B\nbeta\n## C\ngamma\n# D\ndelta";
        let documents = parse_documents(text);

        assert_eq!(documents.len(), 3);
        assert_eq!(header_texts(&documents[0].headers), vec!["# A", "## B"]);
        assert_eq!(header_texts(&documents[0].contents[0].headers), vec!["# A"]);
        assert_eq!(header_texts(&documents[0].contents[1].headers), vec!["# A", "## B"]);

        assert_eq!(header_texts(&documents[1].headers), vec!["# A", "## C"]);
        assert_eq!(plaintext(&documents[1].contents[0]), "gamma");

        assert_eq!(header_texts(&documents[2].headers), vec!["# D"]);
    }

    #[test]
    fn test_shallower_header_clears_deeper_ones() {
        let documents = parse_documents("## Deep\nx\n# Top\ny");
        assert_eq!(documents.len(), 1);
        assert_eq!(header_texts(&documents[0].contents[0].headers), vec!["## Deep"]);
        assert_eq!(header_texts(&documents[0].contents[1].headers), vec!["# Top"]);
        assert_eq!(header_texts(&documents[0].headers), vec!["# Top"]);
    }

    #[test]
    fn test_table_and_list_blocks_split_paragraphs() {
        let text = "Intro line.\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n- one\n- two\n\nOutro.";
        let documents = parse_documents(text);
        assert_eq!(documents.len(), 1);

        let contents = &documents[0].contents;
        assert_eq!(contents.len(), 4);
        assert_eq!(plaintext(&contents[0]), "Intro line.");
        assert!(matches!(&contents[1].kind, ContentKind::Table(t) if t.rows.len() == 1));
        assert_eq!(contents[1].block_start, 13);
        assert!(matches!(&contents[2].kind, ContentKind::List(l) if l.items.len() == 2));
        assert_eq!(plaintext(&contents[3]), "Outro.");
    }

    #[test]
    fn test_caption_directly_above_table() {
        let documents = parse_documents("Prices\n| item | cost |\n|---|---|\n| tea | 3 |");
        let ContentKind::Table(table) = &documents[0].contents[0].kind else {
            panic!("Expected a table");
        };
        assert_eq!(table.header_text, "Prices");
        assert_eq!(table.rows[0].start, 33);
    }

    #[test]
    fn test_positions_count_characters() {
        let text = "# Überschrift\nGrüße aus Köln.";
        let documents = parse_documents(text);
        let content = &documents[0].contents[0];
        assert_eq!(content.block_start, 14);
        let chars: Vec<char> = text.chars().collect();
        let slice: String = chars[content.block_start..=content.block_end].iter().collect();
        assert_eq!(slice, plaintext(content));
    }
}
