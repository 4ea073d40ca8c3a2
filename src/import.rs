//! The `import` command: assemble a batch, run the orchestrator against
//! local-filesystem backends, and report per-file outcomes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::info;
use serde_json::json;
use uuid::Uuid;

use crate::{
    batch::BatchRegistry,
    cli::ImportArgs,
    columns::ColumnInterpretation,
    decode,
    profile::ImportProfile,
    runner::{self, CommitBackend, StorageBackend},
    table,
};

/// Stores raw uploads under `<root>/<batch_key>/<file_name>`.
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StorageBackend for DirStorage {
    async fn upload(&self, batch_key: &str, file_name: &str, bytes: &[u8]) -> Result<String> {
        let dir = self.root.join(batch_key);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Creating upload directory {dir:?}"))?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Writing upload {path:?}"))?;
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Writes one JSON document per committed file under `<root>`.
pub struct JsonCommit {
    root: PathBuf,
}

impl JsonCommit {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl CommitBackend for JsonCommit {
    async fn commit(
        &self,
        file_name: &str,
        association_id: Option<&str>,
        headers: &[String],
        rows: &[Vec<String>],
        columns: &[ColumnInterpretation],
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Creating commit directory {:?}", self.root))?;
        let document = json!({
            "file_name": file_name,
            "association_id": association_id,
            "headers": headers,
            "rows": rows,
            "columns": columns,
        });
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(file_name);
        let path = self.root.join(format!("{stem}.json"));
        let payload =
            serde_json::to_vec_pretty(&document).context("Serializing commit document")?;
        tokio::fs::write(&path, payload)
            .await
            .with_context(|| format!("Writing commit document {path:?}"))?;
        Ok(())
    }
}

pub async fn execute(args: &ImportArgs) -> Result<()> {
    if args.inputs.is_empty() {
        bail!("At least one input file must be provided");
    }
    let encoding = decode::resolve_encoding(args.input_encoding.as_deref())?;
    let batch_key = args
        .batch_key
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut registry = BatchRegistry::new(&batch_key);
    registry.set_encoding(encoding);

    // Uploads and commit documents are keyed by file name, so two inputs
    // sharing a basename would silently overwrite each other.
    let mut seen_names = HashSet::new();
    for input in &args.inputs {
        let file_name = crate::input_file_name(input)?;
        if !seen_names.insert(file_name.to_string()) {
            bail!(
                "Duplicate input file name '{file_name}' \
                 (files are keyed by name within a batch)"
            );
        }
        let bytes =
            std::fs::read(input).with_context(|| format!("Reading input file {input:?}"))?;
        registry.add_file(file_name, bytes);
    }

    for (file, id) in &args.associations {
        let index = registry
            .position_by_name(file)
            .with_context(|| format!("Association target '{file}' is not among the inputs"))?;
        registry
            .associate(index, Some(id.clone()))
            .with_context(|| format!("Associating '{file}'"))?;
    }

    registry.stage_all();

    // User corrections override whatever staging sniffed or inferred.
    if let Some(path) = &args.profile {
        let profile = ImportProfile::load(path)
            .with_context(|| format!("Loading profile from {path:?}"))?;
        registry.set_settings(profile.settings());
        *registry.columns_mut() = profile.columns;
    }
    if args.separator.is_some() || args.header_row.is_some() {
        let mut settings = registry.settings();
        if let Some(separator) = args.separator {
            settings.separator = separator;
        }
        if let Some(header_row) = args.header_row {
            settings.header_row = header_row;
        }
        registry.set_settings(settings);
    }

    let storage = DirStorage::new(&args.storage_dir);
    let committer = JsonCommit::new(&args.commit_dir);
    runner::run_batch(&mut registry, &storage, &committer).await;

    print_batch_table(&registry);
    let progress = registry.progress();
    info!(
        "Batch '{}' finished: {} done, {} failed, {} total",
        batch_key, progress.done, progress.errored, progress.total
    );
    if progress.errored > 0 {
        bail!(
            "{} of {} file(s) failed to import",
            progress.errored,
            progress.total
        );
    }
    Ok(())
}

fn print_batch_table(registry: &BatchRegistry) {
    let headers = vec![
        "file".to_string(),
        "status".to_string(),
        "association".to_string(),
        "message".to_string(),
    ];
    let rows: Vec<Vec<String>> = registry
        .entries()
        .iter()
        .map(|entry| {
            vec![
                entry.file_name().to_string(),
                entry.status().label().to_string(),
                entry.association_id().unwrap_or("").to_string(),
                entry.error().unwrap_or("").to_string(),
            ]
        })
        .collect();
    table::print_table(&headers, &rows);
}
