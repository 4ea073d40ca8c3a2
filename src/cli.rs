use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::sniff::Separator;

#[derive(Debug, Parser)]
#[command(author, version, about = "Import SCADA telemetry exports in batches", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect the field separator of a delimited or workbook file
    Sniff(SniffArgs),
    /// Infer parse settings and column types into a profile file
    Probe(ProbeArgs),
    /// Show the column interpretations stored in a profile
    Columns(ColumnsArgs),
    /// Preview a file's projected rows in a formatted table
    Preview(PreviewArgs),
    /// Upload, parse, and commit a batch of files
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct SniffArgs {
    /// Input file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination profile file path
    #[arg(short, long)]
    pub profile: PathBuf,
    /// Field separator (tab, comma, semicolon, space); sniffed when omitted
    #[arg(long, value_parser = parse_separator)]
    pub separator: Option<Separator>,
    /// 1-based header row position
    #[arg(long = "header-row", default_value_t = 1)]
    pub header_row: usize,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Profile file to display
    #[arg(short, long)]
    pub profile: PathBuf,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Profile file carrying parse settings and column interpretations
    #[arg(short, long)]
    pub profile: Option<PathBuf>,
    /// Field separator (tab, comma, semicolon, space); sniffed when omitted
    #[arg(long, value_parser = parse_separator)]
    pub separator: Option<Separator>,
    /// 1-based header row position
    #[arg(long = "header-row")]
    pub header_row: Option<usize>,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// One or more files to import
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Profile file carrying parse settings and column interpretations
    #[arg(short, long)]
    pub profile: Option<PathBuf>,
    /// Field separator override (tab, comma, semicolon, space)
    #[arg(long, value_parser = parse_separator)]
    pub separator: Option<Separator>,
    /// 1-based header row override
    #[arg(long = "header-row")]
    pub header_row: Option<usize>,
    /// Key grouping this batch's uploads (random when omitted)
    #[arg(long = "batch-key")]
    pub batch_key: Option<String>,
    /// Directory receiving raw file uploads
    #[arg(long = "storage-dir")]
    pub storage_dir: PathBuf,
    /// Directory receiving committed row documents
    #[arg(long = "commit-dir")]
    pub commit_dir: PathBuf,
    /// Associate a file with an external entity as `FILE=ID` (repeatable)
    #[arg(long = "associate", value_parser = parse_association, action = clap::ArgAction::Append)]
    pub associations: Vec<(String, String)>,
    /// Character encoding for delimited input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_separator(value: &str) -> Result<Separator, String> {
    match value {
        "tab" | "\t" => Ok(Separator::Tab),
        "comma" | "," => Ok(Separator::Comma),
        "semicolon" | ";" => Ok(Separator::Semicolon),
        "space" | " " => Ok(Separator::Space),
        other => Err(format!(
            "Unknown separator '{other}' (expected tab, comma, semicolon, or space)"
        )),
    }
}

pub fn parse_association(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((file, id)) if !file.trim().is_empty() && !id.trim().is_empty() => {
            Ok((file.trim().to_string(), id.trim().to_string()))
        }
        _ => Err("Association must be of the form FILE=ID".to_string()),
    }
}
