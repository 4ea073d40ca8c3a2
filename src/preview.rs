use std::fs;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PreviewArgs,
    columns, decode,
    parse::{self, ParseSettings},
    profile::ImportProfile,
    sniff, table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let bytes =
        fs::read(&args.input).with_context(|| format!("Reading input file {:?}", args.input))?;
    let encoding = decode::resolve_encoding(args.input_encoding.as_deref())?;
    let file_name = crate::input_file_name(&args.input)?;
    let text = decode::decode(file_name, &bytes, encoding)?;

    let profile = match &args.profile {
        Some(path) => Some(
            ImportProfile::load(path)
                .with_context(|| format!("Loading profile from {path:?}"))?,
        ),
        None => None,
    };
    let separator = args
        .separator
        .or(profile.as_ref().map(|p| p.separator))
        .unwrap_or_else(|| sniff::detect(&text));
    let header_row = args
        .header_row
        .or(profile.as_ref().map(|p| p.header_row))
        .unwrap_or(1);
    let settings = ParseSettings {
        separator,
        header_row,
    };

    let parsed = parse::parse(&text, &settings);
    if parsed.is_empty() {
        info!(
            "Header row {} is past the end of {:?}; nothing to preview",
            settings.header_row, args.input
        );
        return Ok(());
    }
    let column_list = match profile {
        Some(profile) if !profile.columns.is_empty() => profile.columns,
        _ => columns::build_columns(&parsed),
    };
    let result = columns::project(&parsed, &column_list);
    let shown: Vec<Vec<String>> = result.rows.iter().take(args.rows).cloned().collect();
    table::print_table(&result.headers, &shown);
    info!(
        "Displayed {} of {} row(s) from {:?} (separator '{}')",
        shown.len(),
        result.rows.len(),
        args.input,
        settings.separator.label()
    );
    Ok(())
}
