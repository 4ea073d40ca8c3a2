//! Per-column interpretation metadata and the visible-column projection.
//!
//! The interpretation list is rebuilt wholesale whenever parse settings
//! change and edited field by field in between. Every edit addresses a column
//! by its original position; the index space comes from the same header array
//! the list was built from, so an out-of-range index is a caller bug and
//! panics rather than degrading.

use serde::{Deserialize, Serialize};

use crate::{
    infer::{self, DataType},
    parse::ParsedTable,
};

/// Declarative intra-cell split rule. Acting on it is the commit consumer's
/// job; the pipeline only records the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitRule {
    None,
    Tab,
    Comma,
    Semicolon,
    Space,
}

impl Default for SplitRule {
    fn default() -> Self {
        SplitRule::None
    }
}

impl SplitRule {
    pub fn label(self) -> &'static str {
        match self {
            SplitRule::None => "none",
            SplitRule::Tab => "tab",
            SplitRule::Comma => "comma",
            SplitRule::Semicolon => "semicolon",
            SplitRule::Space => "space",
        }
    }
}

/// How one parsed column is displayed, typed, and carried through commit.
///
/// `original_name` is fixed at build time and keyed to the column's position
/// in the header row; everything else is user-editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInterpretation {
    pub original_name: String,
    pub display_name: String,
    pub visible: bool,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default)]
    pub split_by: SplitRule,
}

impl ColumnInterpretation {
    fn new(original_name: &str) -> Self {
        Self {
            original_name: original_name.to_string(),
            display_name: original_name.to_string(),
            visible: true,
            data_type: DataType::String,
            date_format: None,
            split_by: SplitRule::None,
        }
    }
}

/// Build the default interpretation list for a parsed table: one entry per
/// header in header order, visible, display name equal to the original, type
/// seeded by inference over the table's rows.
pub fn build_columns(table: &ParsedTable) -> Vec<ColumnInterpretation> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let mut column = ColumnInterpretation::new(header);
            let samples = infer::sample_column(&table.rows, idx);
            column.data_type = infer::infer_data_type(&samples);
            if column.data_type == DataType::DateTime {
                column.date_format = samples.first().map(|sample| infer::date_format_hint(sample));
            }
            column
        })
        .collect()
}

pub fn toggle_visibility(columns: &mut [ColumnInterpretation], index: usize) {
    columns[index].visible = !columns[index].visible;
}

pub fn set_all_visible(columns: &mut [ColumnInterpretation], visible: bool) {
    for column in columns.iter_mut() {
        column.visible = visible;
    }
}

pub fn rename(columns: &mut [ColumnInterpretation], index: usize, name: &str) {
    columns[index].display_name = name.to_string();
}

pub fn set_data_type(columns: &mut [ColumnInterpretation], index: usize, data_type: DataType) {
    columns[index].data_type = data_type;
}

pub fn set_date_format(columns: &mut [ColumnInterpretation], index: usize, format: Option<&str>) {
    columns[index].date_format = format.map(str::to_string);
}

pub fn set_split_by(columns: &mut [ColumnInterpretation], index: usize, rule: SplitRule) {
    columns[index].split_by = rule;
}

/// The visible-column projection of a parsed table: headers become display
/// names, rows keep only visible positions. Recomputable at any time from
/// the raw parse plus the current interpretation list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedResult {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Project a parsed table through the visible columns.
///
/// Column order follows the interpretation list, which itself follows the
/// original header order, so hiding and re-showing columns can never reorder
/// the survivors. Ragged rows are reconciled here: a missing cell projects
/// as an empty string.
pub fn project(table: &ParsedTable, columns: &[ColumnInterpretation]) -> ParsedResult {
    let visible: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, column)| column.visible)
        .map(|(idx, _)| idx)
        .collect();
    let headers = visible
        .iter()
        .map(|&idx| columns[idx].display_name.clone())
        .collect();
    let rows = table
        .rows
        .iter()
        .map(|row| {
            visible
                .iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    ParsedResult { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{self, ParseSettings};

    fn sample_table() -> ParsedTable {
        parse::parse(
            "time,power,site\n2024-01-01 00:00,1.5,alpha\n2024-01-01 00:15,2.0,beta\n",
            &ParseSettings::default(),
        )
    }

    #[test]
    fn build_seeds_names_visibility_and_types() {
        let columns = build_columns(&sample_table());
        assert_eq!(columns.len(), 3);
        assert!(columns.iter().all(|c| c.visible));
        assert!(columns.iter().all(|c| c.display_name == c.original_name));
        assert_eq!(columns[0].data_type, DataType::DateTime);
        assert_eq!(columns[1].data_type, DataType::Float);
        assert_eq!(columns[2].data_type, DataType::String);
    }

    #[test]
    fn datetime_columns_get_a_format_hint() {
        let columns = build_columns(&sample_table());
        assert_eq!(columns[0].date_format.as_deref(), Some("%Y-%m-%d %H:%M:%S"));
        assert_eq!(columns[1].date_format, None);
    }

    #[test]
    fn empty_table_builds_an_empty_list() {
        assert!(build_columns(&ParsedTable::default()).is_empty());
    }

    #[test]
    fn edits_touch_only_the_addressed_column() {
        let mut columns = build_columns(&sample_table());
        rename(&mut columns, 1, "Power (kW)");
        set_data_type(&mut columns, 2, DataType::Boolean);
        set_split_by(&mut columns, 2, SplitRule::Semicolon);
        set_date_format(&mut columns, 0, Some("%d.%m.%Y"));
        assert_eq!(columns[1].display_name, "Power (kW)");
        assert_eq!(columns[1].original_name, "power");
        assert_eq!(columns[2].data_type, DataType::Boolean);
        assert_eq!(columns[2].split_by, SplitRule::Semicolon);
        assert_eq!(columns[0].date_format.as_deref(), Some("%d.%m.%Y"));
    }

    #[test]
    fn projection_substitutes_display_names_and_drops_hidden_columns() {
        let table = sample_table();
        let mut columns = build_columns(&table);
        rename(&mut columns, 0, "Timestamp");
        toggle_visibility(&mut columns, 1);
        let result = project(&table, &columns);
        assert_eq!(result.headers, vec!["Timestamp", "site"]);
        assert_eq!(result.rows[0], vec!["2024-01-01 00:00", "alpha"]);
    }

    #[test]
    fn hiding_then_showing_preserves_column_order() {
        let table = sample_table();
        let mut columns = build_columns(&table);
        toggle_visibility(&mut columns, 0);
        toggle_visibility(&mut columns, 2);
        toggle_visibility(&mut columns, 0);
        toggle_visibility(&mut columns, 2);
        let result = project(&table, &columns);
        assert_eq!(result.headers, vec!["time", "power", "site"]);
    }

    #[test]
    fn projection_pads_short_rows_with_empty_strings() {
        let table = parse::parse("a,b,c\n1,2\n", &ParseSettings::default());
        let columns = build_columns(&table);
        let result = project(&table, &columns);
        assert_eq!(result.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn set_all_visible_flips_every_column() {
        let mut columns = build_columns(&sample_table());
        set_all_visible(&mut columns, false);
        assert!(columns.iter().all(|c| !c.visible));
        let table = sample_table();
        let result = project(&table, &columns);
        assert!(result.headers.is_empty());
        assert_eq!(result.rows.len(), 2);
        assert!(result.rows.iter().all(|row| row.is_empty()));
        set_all_visible(&mut columns, true);
        assert!(columns.iter().all(|c| c.visible));
    }

    #[test]
    #[should_panic]
    fn editing_past_the_end_is_a_caller_bug() {
        let mut columns = build_columns(&sample_table());
        rename(&mut columns, 99, "nope");
    }
}
