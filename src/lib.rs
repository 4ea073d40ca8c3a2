pub mod batch;
pub mod cli;
pub mod columns;
pub mod decode;
pub mod error;
pub mod import;
pub mod infer;
pub mod parse;
pub mod preview;
pub mod profile;
pub mod runner;
pub mod sniff;
pub mod table;

use std::{env, fs, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("scada_ingest", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub async fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sniff(args) => handle_sniff(&args),
        Commands::Probe(args) => handle_probe(&args),
        Commands::Columns(args) => handle_columns(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Import(args) => import::execute(&args).await,
    }
}

fn handle_sniff(args: &cli::SniffArgs) -> Result<()> {
    let bytes =
        fs::read(&args.input).with_context(|| format!("Reading input file {:?}", args.input))?;
    let encoding = decode::resolve_encoding(args.input_encoding.as_deref())?;
    let file_name = input_file_name(&args.input)?;
    let text = decode::decode(file_name, &bytes, encoding)?;
    let separator = sniff::detect(&text);
    info!(
        "Detected separator '{}' for {:?}",
        separator.label(),
        args.input
    );
    println!("{}", separator.label());
    Ok(())
}

fn handle_probe(args: &cli::ProbeArgs) -> Result<()> {
    let bytes =
        fs::read(&args.input).with_context(|| format!("Reading input file {:?}", args.input))?;
    let encoding = decode::resolve_encoding(args.input_encoding.as_deref())?;
    let file_name = input_file_name(&args.input)?;
    let text = decode::decode(file_name, &bytes, encoding)?;
    let separator = args.separator.unwrap_or_else(|| sniff::detect(&text));
    let settings = parse::ParseSettings {
        separator,
        header_row: args.header_row,
    };
    let parsed = parse::parse(&text, &settings);
    let column_list = columns::build_columns(&parsed);
    let profile = profile::ImportProfile::from_parts(settings, &column_list);
    profile
        .save(&args.profile)
        .with_context(|| format!("Writing profile to {:?}", args.profile))?;
    info!(
        "Inferred {} column(s) from {:?} written to {:?}",
        column_list.len(),
        args.input,
        args.profile
    );
    Ok(())
}

fn handle_columns(args: &cli::ColumnsArgs) -> Result<()> {
    let profile = profile::ImportProfile::load(&args.profile)
        .with_context(|| format!("Loading profile from {:?}", args.profile))?;
    if profile.columns.is_empty() {
        info!("Profile {:?} does not define any columns", args.profile);
        return Ok(());
    }
    let headers = vec![
        "#".to_string(),
        "original".to_string(),
        "display".to_string(),
        "type".to_string(),
        "visible".to_string(),
        "split".to_string(),
    ];
    let rows: Vec<Vec<String>> = profile
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                (idx + 1).to_string(),
                column.original_name.clone(),
                column.display_name.clone(),
                column.data_type.label().to_string(),
                if column.visible { "yes" } else { "no" }.to_string(),
                column.split_by.label().to_string(),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
    Ok(())
}

pub(crate) fn input_file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Input path {path:?} has no usable file name"))
}
