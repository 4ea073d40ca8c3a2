//! File decoding into a normalized text blob.
//!
//! All input kinds converge on one representation: delimited text. Plain
//! text files pass through a character-set decode; workbooks are flattened
//! to a comma-delimited rendering of their first sheet, quoted only where a
//! cell would otherwise break the line shape.

use std::{io::Cursor, path::Path};

use anyhow::{Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::error::IngestError;

/// Decoder selected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Delimited,
    Workbook,
}

/// Classify a file by extension. Bare names are treated as delimited text
/// because exported telemetry dumps often arrive without one; anything with
/// an extension outside the supported set is rejected up front.
pub fn detect_kind(file_name: &str) -> Result<FileKind, IngestError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("xlsx") | Some("xls") => Ok(FileKind::Workbook),
        Some("csv") | Some("tsv") | Some("txt") | None => Ok(FileKind::Delimited),
        Some(other) => Err(IngestError::UnsupportedFormat(format!(
            "'{file_name}' has unrecognized extension '.{other}'"
        ))),
    }
}

/// Look up an `encoding_rs` encoding by label, defaulting to UTF-8.
pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Decode one file's raw bytes into normalized text.
pub fn decode(
    file_name: &str,
    bytes: &[u8],
    encoding: &'static Encoding,
) -> Result<String, IngestError> {
    match detect_kind(file_name)? {
        FileKind::Delimited => decode_text(file_name, bytes, encoding),
        FileKind::Workbook => decode_workbook(file_name, bytes),
    }
}

fn decode_text(
    file_name: &str,
    bytes: &[u8],
    encoding: &'static Encoding,
) -> Result<String, IngestError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(IngestError::DecodeFailed {
            name: file_name.to_string(),
            reason: format!("text is not valid {}", encoding.name()),
        });
    }
    Ok(text.into_owned())
}

/// Flatten the first sheet of a workbook into comma-delimited text.
///
/// Date cells are rendered from their underlying date value rather than the
/// sheet's display string, keeping the output independent of the authoring
/// locale.
fn decode_workbook(file_name: &str, bytes: &[u8]) -> Result<String, IngestError> {
    let decode_failed = |reason: String| IngestError::DecodeFailed {
        name: file_name.to_string(),
        reason,
    };
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| decode_failed(err.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::UnsupportedFormat(format!("'{file_name}' has no sheets")))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| decode_failed(err.to_string()))?;

    let mut writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    for row in range.rows() {
        let record: Vec<String> = row.iter().map(cell_text).collect();
        writer
            .write_record(&record)
            .map_err(|err| decode_failed(err.to_string()))?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| decode_failed(err.to_string()))?;
    String::from_utf8(buffer).map_err(|err| decode_failed(err.to_string()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => flatten_text(s),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Whole floats print as integers so counters keep their shape.
            if f.fract() == 0.0 && f.abs() < 9e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| naive.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Keeps cell text on one line. Rows are split on line breaks before quotes
/// are examined, so a break inside a cell would fracture its row. Same
/// replacement as the table renderer.
fn flatten_text(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect()
}
