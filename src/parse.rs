//! Line splitting and row extraction under user-adjustable settings.
//!
//! The parser is deliberately forgiving: blank lines vanish, ragged rows pass
//! through untouched, and a header row pointing past the end of the file
//! yields an empty table instead of an error. Anything stricter would turn a
//! mis-set spinner in the import dialog into a dead end.

use serde::{Deserialize, Serialize};

use crate::sniff::Separator;

/// User-facing parse controls shared by every file in a batch.
///
/// `header_row` is 1-based. Zero is accepted and treated as row one so the
/// setting can never point below the start of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseSettings {
    pub separator: Separator,
    pub header_row: usize,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            separator: Separator::Comma,
            header_row: 1,
        }
    }
}

/// Header fields plus every data row after them, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

/// Split normalized text into headers and data rows.
///
/// Lines break on `\n` with any trailing `\r` stripped, then lines that are
/// empty after trimming are discarded before the header row is located. Rows
/// are not width-checked against the header; short and long rows survive for
/// the projection step to reconcile.
pub fn parse(text: &str, settings: &ParseSettings) -> ParsedTable {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect();
    let header_idx = settings.header_row.saturating_sub(1);
    if header_idx >= lines.len() {
        return ParsedTable::default();
    }
    let headers = split_line(lines[header_idx], settings.separator);
    let rows = lines[header_idx + 1..]
        .iter()
        .map(|line| split_line(line, settings.separator))
        .collect();
    ParsedTable { headers, rows }
}

/// Split one line into trimmed fields.
///
/// Comma lines honor double quotes: commas inside a quoted region do not
/// split, and the quote characters themselves are dropped. A stray quote
/// simply toggles the quoted state; there is no escaping or nesting. The
/// other separators split literally.
pub fn split_line(line: &str, separator: Separator) -> Vec<String> {
    match separator {
        Separator::Comma => split_quote_aware(line),
        other => line
            .split(other.as_char())
            .map(|field| field.trim().to_string())
            .collect(),
    }
}

fn split_quote_aware(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
        .into_iter()
        .map(|field| field.trim().to_string())
        .collect()
}
