//! Structured table cells and their markdown rendering

use crate::error::{ParsingError, ParsingResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl CellValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl From<&Value> for CellValue {
    /// Arrays and objects have no cell form and become `Null`
    fn from(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::String(text.clone()),
            Value::Number(number) => number.as_f64().map_or(Self::Null, Self::Number),
            Value::Bool(flag) => Self::Boolean(*flag),
            Value::Null | Value::Array(_) | Value::Object(_) => Self::Null,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(text) => f.write_str(text),
            Self::Number(number) if number.fract().abs() < f64::EPSILON && number.abs() < 1e15 => {
                write!(f, "{number:.0}")
            }
            Self::Number(number) => write!(f, "{number}"),
            Self::Boolean(flag) => write!(f, "{flag}"),
            Self::Null => Ok(()),
        }
    }
}

/// A table given as a header row and data rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredTable {
    pub header: Vec<CellValue>,
    pub rows: Vec<Vec<CellValue>>,
}

impl StructuredTable {
    /// Read a table from JSON
    ///
    /// Accepts `{"header": [...], "rows": [[...], ...]}` or an array of rows
    /// whose first row is the header.
    ///
    /// # Errors
    /// Returns `ParsingError::ChunkingError` when the value has neither shape
    pub fn from_json(value: &Value) -> ParsingResult<Self> {
        match value {
            Value::Object(map) => {
                let header = map
                    .get("header")
                    .and_then(Value::as_array)
                    .ok_or_else(|| ParsingError::chunking_error("table has no 'header' array"))?;
                let rows = match map.get("rows") {
                    Some(Value::Array(rows)) => rows.iter().map(row_cells).collect(),
                    Some(_) => {
                        return Err(ParsingError::chunking_error("table 'rows' is not an array"));
                    }
                    None => Vec::new(),
                };
                Ok(Self {
                    header: header.iter().map(CellValue::from).collect(),
                    rows,
                })
            }
            Value::Array(rows) => {
                let mut rows = rows.iter().map(row_cells);
                let header = rows
                    .next()
                    .ok_or_else(|| ParsingError::chunking_error("table has no rows"))?;
                Ok(Self {
                    header,
                    rows: rows.collect(),
                })
            }
            _ => Err(ParsingError::chunking_error(
                "table must be an object or an array of rows",
            )),
        }
    }

    /// Render as a markdown pipe table
    ///
    /// Columns whose header cell is not a string are left out.
    pub fn to_markdown(&self) -> String {
        let columns: Vec<(usize, &str)> = self
            .header
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.as_str().map(|name| (index, name)))
            .collect();
        if columns.is_empty() {
            return String::new();
        }

        let mut lines = Vec::with_capacity(self.rows.len().saturating_add(2));
        lines.push(pipe_row(columns.iter().map(|(_, name)| escape(name))));
        lines.push(pipe_row(columns.iter().map(|_| "---".to_string())));
        for row in &self.rows {
            lines.push(pipe_row(columns.iter().map(|&(index, _)| {
                row.get(index)
                    .map(|cell| escape(&cell.to_string()))
                    .unwrap_or_default()
            })));
        }
        lines.join("\n")
    }
}

fn row_cells(row: &Value) -> Vec<CellValue> {
    match row {
        Value::Array(cells) => cells.iter().map(CellValue::from).collect(),
        other => vec![CellValue::from(other)],
    }
}

fn pipe_row(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.collect();
    format!("| {} |", cells.join(" | "))
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
