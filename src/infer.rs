//! Column type inference over sampled values.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Non-empty values examined per column before inference commits to a type.
pub const TYPE_SAMPLE_VALUES: usize = 20;

/// Leading `YYYY-MM-DD` or `YYYY/MM/DD`; anything after the prefix is free
/// form so timestamps with arbitrary time-of-day layouts still qualify.
static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}[-/]\d{2}[-/]\d{2}").expect("literal date prefix pattern compiles")
});

/// Structural numeric literal: sign, digits with optional fraction (or a bare
/// fraction), optional exponent. Matched structurally rather than through
/// `f64::from_str`, which would also admit `inf` and `NaN`.
static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$")
        .expect("literal numeric pattern compiles")
});

const BOOLEAN_TOKENS: [&str; 6] = ["true", "false", "0", "1", "yes", "no"];

/// Types a column can be interpreted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    DateTime,
    Float,
    Int,
    String,
    Boolean,
}

impl DataType {
    /// Printable name for logs and tables.
    pub fn label(self) -> &'static str {
        match self {
            DataType::DateTime => "datetime",
            DataType::Float => "float",
            DataType::Int => "int",
            DataType::String => "string",
            DataType::Boolean => "boolean",
        }
    }
}

impl Default for DataType {
    fn default() -> Self {
        DataType::String
    }
}

/// Collect up to [`TYPE_SAMPLE_VALUES`] non-empty values from one column,
/// walking rows in order. Short rows simply contribute nothing.
pub fn sample_column(rows: &[Vec<String>], column: usize) -> Vec<&str> {
    rows.iter()
        .filter_map(|row| row.get(column))
        .map(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .take(TYPE_SAMPLE_VALUES)
        .collect()
}

/// Decide a column type from its sampled values.
///
/// Precedence is DateTime, then numeric (Float when any sample carries a
/// decimal point, Int otherwise), then Boolean, then String. A sample set
/// with no values stays String: there is nothing to contradict the safest
/// choice.
pub fn infer_data_type(samples: &[&str]) -> DataType {
    if samples.is_empty() {
        return DataType::String;
    }
    if samples.iter().all(|value| DATE_PREFIX.is_match(value)) {
        return DataType::DateTime;
    }
    if samples.iter().all(|value| NUMERIC_LITERAL.is_match(value)) {
        if samples.iter().any(|value| value.contains('.')) {
            return DataType::Float;
        }
        return DataType::Int;
    }
    if is_boolean_sample(samples) {
        return DataType::Boolean;
    }
    DataType::String
}

/// Boolean when every sample is a recognized token and the distinct set is
/// at most two. The distinct-set bound keeps mixed token vocabularies such
/// as `yes/no/1/0` from collapsing into Boolean by accident.
fn is_boolean_sample(samples: &[&str]) -> bool {
    let mut distinct: Vec<String> = Vec::new();
    for value in samples {
        let token = value.to_ascii_lowercase();
        if !BOOLEAN_TOKENS.contains(&token.as_str()) {
            return false;
        }
        if !distinct.contains(&token) {
            distinct.push(token);
        }
    }
    distinct.len() <= 2
}

/// Seed a strftime hint from the first sampled value of a DateTime column.
/// The hint is a starting point for the user, not a validated format.
pub fn date_format_hint(sample: &str) -> String {
    if sample.contains('T') {
        "%Y-%m-%dT%H:%M:%S".to_string()
    } else if sample.contains('/') {
        "%Y/%m/%d %H:%M:%S".to_string()
    } else {
        "%Y-%m-%d %H:%M:%S".to_string()
    }
}
