//! Pipe table model

use super::SourceLine;

/// One line of a table with the character offset of its first character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLine {
    pub text: String,
    pub start: usize,
}

impl TableLine {
    /// Length in characters
    pub fn size(&self) -> usize {
        self.text.chars().count()
    }

    /// Offset of the last character
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.size()).saturating_sub(1)
    }
}

impl From<&SourceLine> for TableLine {
    fn from(line: &SourceLine) -> Self {
        Self {
            text: line.text.clone(),
            start: line.start,
        }
    }
}

/// A markdown table
///
/// `header_text` is the caption written directly above the table, if any.
/// The first pipe line is the header row; data rows follow the separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header_text: String,
    pub header_row: TableLine,
    pub separator: Option<TableLine>,
    pub rows: Vec<TableLine>,
}

impl Table {
    /// Build a table from its caption lines and its pipe lines
    ///
    /// Returns `None` when there are no pipe lines.
    pub(crate) fn from_lines(caption: &[SourceLine], lines: &[SourceLine]) -> Option<Self> {
        let mut header_row: Option<TableLine> = None;
        let mut separator: Option<TableLine> = None;
        let mut rows = Vec::new();

        for line in lines {
            if separator.is_none() && is_separator(&line.text) {
                separator = Some(line.into());
            } else if header_row.is_none() {
                header_row = Some(line.into());
            } else {
                rows.push(line.into());
            }
        }

        let header_text = caption
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        // A table that is only a separator keeps it as its header row
        let header_row = match header_row {
            Some(row) => row,
            None => separator.take()?,
        };

        Some(Self {
            header_text,
            header_row,
            separator,
            rows,
        })
    }

    /// The last line of the table head: the separator, else the header row
    pub fn head_end(&self) -> &TableLine {
        self.separator.as_ref().unwrap_or(&self.header_row)
    }
}

/// A line with at least one pipe
pub fn is_row(line: &str) -> bool {
    line.contains('|')
}

/// A line made only of pipes, dashes, colons and blanks, with a dash
pub fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}
