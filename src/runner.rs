//! Sequential batch orchestration across the upload and commit backends.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};

use crate::{
    batch::{BatchRegistry, FileStatus},
    columns::{self, ColumnInterpretation},
    error::IngestError,
    parse,
};

/// Destination for a file's raw bytes.
#[async_trait]
pub trait StorageBackend {
    /// Store one file under the batch key, returning the stored path.
    async fn upload(&self, batch_key: &str, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// Consumer of a file's projected rows.
#[async_trait]
pub trait CommitBackend {
    /// Receive the final, visible-column-projected data for one file.
    async fn commit(
        &self,
        file_name: &str,
        association_id: Option<&str>,
        headers: &[String],
        rows: &[Vec<String>],
        columns: &[ColumnInterpretation],
    ) -> Result<()>;
}

/// Outcome counts for one orchestrator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Drive every staged entry through upload, parse, and commit, one file at a
/// time in batch order.
///
/// Failures never escape a file's own turn: an upload or commit error becomes
/// that entry's terminal `error` state and the loop moves to the next file.
/// Entries already `done` or `error` are skipped, so re-running after a
/// partial failure only touches what is left. The run suspends at exactly two
/// points per file, the upload call and the commit call, which bounds
/// concurrent backend load to a single file no matter the batch size.
pub async fn run_batch<S, C>(
    registry: &mut BatchRegistry,
    storage: &S,
    committer: &C,
) -> BatchSummary
where
    S: StorageBackend,
    C: CommitBackend,
{
    let batch_key = registry.batch_key().to_string();
    let settings = registry.settings();
    let columns = registry.columns().to_vec();
    let mut summary = BatchSummary::default();

    for entry in registry.entries_mut() {
        if entry.status() != FileStatus::Staged {
            debug!(
                "Skipping '{}' in state {}",
                entry.file_name(),
                entry.status().label()
            );
            continue;
        }
        summary.attempted += 1;

        entry.advance(FileStatus::Uploading);
        info!("Uploading '{}'", entry.file_name());
        let uploaded = storage
            .upload(&batch_key, entry.file_name(), entry.bytes())
            .await;
        match uploaded {
            Ok(path) => debug!("Stored '{}' at {path}", entry.file_name()),
            Err(err) => {
                let failure = IngestError::UploadFailed {
                    name: entry.file_name().to_string(),
                    reason: format!("{err:#}"),
                };
                entry.fail(failure.to_string());
                summary.failed += 1;
                continue;
            }
        }

        entry.advance(FileStatus::Parsing);
        let text = match entry.content() {
            Some(text) => text.to_string(),
            None => {
                entry.fail("decoded content is missing".to_string());
                summary.failed += 1;
                continue;
            }
        };
        let table = parse::parse(&text, &settings);
        let result = columns::project(&table, &columns);
        let committed = committer
            .commit(
                entry.file_name(),
                entry.association_id(),
                &result.headers,
                &result.rows,
                &columns,
            )
            .await;
        match committed {
            Ok(()) => {
                entry.advance(FileStatus::Done);
                info!(
                    "✓ Committed '{}' ({} row(s))",
                    entry.file_name(),
                    result.rows.len()
                );
                summary.completed += 1;
            }
            Err(err) => {
                let failure = IngestError::CommitFailed {
                    name: entry.file_name().to_string(),
                    reason: format!("{err:#}"),
                };
                entry.fail(failure.to_string());
                summary.failed += 1;
            }
        }
    }
    summary
}
