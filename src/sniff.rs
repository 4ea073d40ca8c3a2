//! Separator detection for delimited text.

use serde::{Deserialize, Serialize};

/// Non-empty lines examined when sniffing a separator.
pub const SNIFF_SAMPLE_LINES: usize = 5;

/// Field separators the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    Tab,
    Comma,
    Semicolon,
    Space,
}

impl Separator {
    pub fn as_char(self) -> char {
        match self {
            Separator::Tab => '\t',
            Separator::Comma => ',',
            Separator::Semicolon => ';',
            Separator::Space => ' ',
        }
    }

    /// Printable name for logs and tables.
    pub fn label(self) -> &'static str {
        match self {
            Separator::Tab => "tab",
            Separator::Comma => "comma",
            Separator::Semicolon => "semicolon",
            Separator::Space => "space",
        }
    }
}

impl Default for Separator {
    fn default() -> Self {
        Separator::Comma
    }
}

/// Pick the most likely separator by counting candidates over the first
/// [`SNIFF_SAMPLE_LINES`] non-empty lines.
///
/// Tab wins only when it strictly beats both comma and semicolon; semicolon
/// wins only when it strictly beats comma; everything else, including empty
/// input, falls back to comma. Space is never auto-detected: it occurs inside
/// too many telemetry point names to be trusted as a separator.
pub fn detect(text: &str) -> Separator {
    let mut tabs = 0usize;
    let mut commas = 0usize;
    let mut semicolons = 0usize;
    let sample = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_SAMPLE_LINES);
    for line in sample {
        for ch in line.chars() {
            match ch {
                '\t' => tabs += 1,
                ',' => commas += 1,
                ';' => semicolons += 1,
                _ => {}
            }
        }
    }
    if tabs > commas && tabs > semicolons {
        Separator::Tab
    } else if semicolons > commas {
        Separator::Semicolon
    } else {
        Separator::Comma
    }
}
