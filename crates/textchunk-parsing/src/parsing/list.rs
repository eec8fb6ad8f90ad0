//! List model
//!
//! Items live in one ordered arena. Relations between items are indices into
//! that arena: `previous`/`next` link siblings at the same indentation and
//! numbering style, `parent`/`children` link to the nearest shallower item.

use super::SourceLine;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const BULLET_MARKERS: [char; 3] = ['-', '*', '+'];

/// Numbered item marker regex - returns None if regex compilation fails
fn numbered_marker() -> Option<&'static Regex> {
    static NUMBERED: OnceLock<Option<Regex>> = OnceLock::new();
    NUMBERED.get_or_init(|| Regex::new(r"^\s*\d+\.").ok()).as_ref()
}

/// One list item with its continuation lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Verbatim source from the marker line to the last continuation line
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Leading spaces and tabs before the marker
    pub indentation: usize,
    pub is_numeric: bool,
    pub previous: Option<usize>,
    pub next: Option<usize>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl ListItem {
    /// Length of the item text in characters
    pub fn size(&self) -> usize {
        self.text.chars().count()
    }
}

/// A list block: optional intro text followed by its items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBlock {
    /// Lines before the first item
    pub header_text: String,
    pub items: Vec<ListItem>,
}

impl ListBlock {
    pub(crate) fn from_lines(lines: &[SourceLine]) -> Self {
        let first_item = lines
            .iter()
            .position(|line| is_list_start(&line.text))
            .unwrap_or(lines.len());
        let (intro, body) = lines.split_at(first_item);

        let header_text = intro
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut items: Vec<ListItem> = Vec::new();
        for line in body {
            if !is_list_start(&line.text) {
                if let Some(item) = items.last_mut() {
                    item.text.push('\n');
                    item.text.push_str(&line.text);
                    item.end = item.start.saturating_add(item.size()).saturating_sub(1);
                }
                continue;
            }
            let size = line.text.chars().count();
            items.push(ListItem {
                text: line.text.clone(),
                start: line.start,
                end: line.start.saturating_add(size).saturating_sub(1),
                indentation: indentation(&line.text),
                is_numeric: is_numeric_item(&line.text),
                previous: None,
                next: None,
                parent: None,
                children: Vec::new(),
            });
        }

        let mut block = Self { header_text, items };
        block.link();
        block
    }

    fn link(&mut self) {
        let mut last_at_indent: HashMap<usize, usize> = HashMap::new();
        let mut indent_stack: Vec<usize> = Vec::new();

        for index in 0..self.items.len() {
            let Some((indent, numeric)) = self.items.get(index).map(|i| (i.indentation, i.is_numeric))
            else {
                continue;
            };

            let sibling = last_at_indent
                .get(&indent)
                .copied()
                .filter(|&s| self.items.get(s).is_some_and(|s| s.is_numeric == numeric));
            if let Some(sibling) = sibling {
                self.set_sibling(sibling, index);
            }

            let shallower = indent_stack
                .iter()
                .rev()
                .find(|&&d| d < indent)
                .copied()
                .unwrap_or(0);
            let parent = last_at_indent
                .get(&shallower)
                .copied()
                .filter(|&p| self.items.get(p).is_some_and(|p| p.indentation != indent));
            if let Some(parent) = parent {
                self.set_parent(parent, index);
            }

            last_at_indent.insert(indent, index);
            if indent_stack.last() != Some(&indent) {
                indent_stack.push(indent);
            }
        }
    }

    fn set_sibling(&mut self, previous: usize, index: usize) {
        if let Some(item) = self.items.get_mut(previous) {
            item.next = Some(index);
        }
        if let Some(item) = self.items.get_mut(index) {
            item.previous = Some(previous);
        }
    }

    fn set_parent(&mut self, parent: usize, index: usize) {
        if let Some(item) = self.items.get_mut(parent) {
            item.children.push(index);
        }
        if let Some(item) = self.items.get_mut(index) {
            item.parent = Some(parent);
        }
    }

    pub fn get(&self, index: usize) -> Option<&ListItem> {
        self.items.get(index)
    }

    /// Ancestors of an item, nearest first
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = &ListItem> + '_ {
        let mut current = self.get(index).and_then(|item| item.parent);
        std::iter::from_fn(move || {
            let item = self.get(current?)?;
            current = item.parent;
            Some(item)
        })
    }
}

/// A line whose first non-blank character is a bullet, or that starts with
/// a number followed by a dot
pub fn is_list_start(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(BULLET_MARKERS) || is_numeric_item(trimmed)
}

/// A line that starts with a number followed by a dot
pub fn is_numeric_item(line: &str) -> bool {
    numbered_marker().map_or_else(
        || {
            let digits = line.trim_start().split('.').next().unwrap_or_default();
            line.contains('.') && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        },
        |regex| regex.is_match(line),
    )
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| matches!(c, ' ' | '\t')).count()
}
