//! Batch registry: the files of one import session plus their shared
//! parse settings and column interpretations.
//!
//! The registry is the single source of truth for a session. Entries move
//! through their lifecycle one way only; settings and columns are batch
//! global and rebuilt together. Progress is always derived from entry
//! statuses, never counted separately, so it cannot drift.

use encoding_rs::{Encoding, UTF_8};
use itertools::Itertools;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::{
    columns::{self, ColumnInterpretation},
    decode,
    error::IngestError,
    parse::{self, ParseSettings},
    sniff,
};

/// Lifecycle position of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    Pending,
    Staged,
    Uploading,
    Parsing,
    Done,
    Error,
}

impl FileStatus {
    pub fn label(self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Staged => "staged",
            FileStatus::Uploading => "uploading",
            FileStatus::Parsing => "parsing",
            FileStatus::Done => "done",
            FileStatus::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FileStatus::Done | FileStatus::Error)
    }

    /// Legal forward moves. Anything else is a caller bug.
    fn can_advance_to(self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (FileStatus::Pending, FileStatus::Staged)
                | (FileStatus::Pending, FileStatus::Error)
                | (FileStatus::Staged, FileStatus::Uploading)
                | (FileStatus::Uploading, FileStatus::Parsing)
                | (FileStatus::Uploading, FileStatus::Error)
                | (FileStatus::Parsing, FileStatus::Done)
                | (FileStatus::Parsing, FileStatus::Error)
        )
    }
}

/// One user-supplied file and everything the pipeline knows about it.
///
/// Fields stay private so status can only move through [`FileEntry::advance`],
/// which enforces the one-way lifecycle.
#[derive(Debug, Clone)]
pub struct FileEntry {
    id: Uuid,
    file_name: String,
    bytes: Vec<u8>,
    association_id: Option<String>,
    status: FileStatus,
    error: Option<String>,
    content: Option<String>,
}

impl FileEntry {
    fn new(file_name: String, bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name,
            bytes,
            association_id: None,
            status: FileStatus::Pending,
            error: None,
            content: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn association_id(&self) -> Option<&str> {
        self.association_id.as_deref()
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Decoded text, present from `staged` onward.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub(crate) fn advance(&mut self, next: FileStatus) {
        assert!(
            self.status.can_advance_to(next),
            "illegal status transition {} -> {} for '{}'",
            self.status.label(),
            next.label(),
            self.file_name
        );
        self.status = next;
    }

    /// Terminal failure: record the message and move to `error`.
    pub(crate) fn fail(&mut self, message: String) {
        warn!("✗ '{}': {message}", self.file_name);
        self.error = Some(message);
        self.advance(FileStatus::Error);
    }
}

/// Derived progress counts for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub total: usize,
    pub done: usize,
    pub errored: usize,
}

impl BatchProgress {
    /// Files that reached a terminal state, successful or not.
    pub fn processed(&self) -> usize {
        self.done + self.errored
    }

    pub fn is_complete(&self) -> bool {
        self.processed() == self.total
    }
}

/// All state for one import session.
pub struct BatchRegistry {
    batch_key: String,
    encoding: &'static Encoding,
    entries: Vec<FileEntry>,
    settings: ParseSettings,
    columns: Vec<ColumnInterpretation>,
    sniffed: bool,
}

impl BatchRegistry {
    pub fn new(batch_key: impl Into<String>) -> Self {
        Self {
            batch_key: batch_key.into(),
            encoding: UTF_8,
            entries: Vec::new(),
            settings: ParseSettings::default(),
            columns: Vec::new(),
            sniffed: false,
        }
    }

    /// Character set used when decoding delimited text. Takes effect for
    /// files staged after the call.
    pub fn set_encoding(&mut self, encoding: &'static Encoding) {
        self.encoding = encoding;
    }

    pub fn batch_key(&self) -> &str {
        &self.batch_key
    }

    pub fn settings(&self) -> ParseSettings {
        self.settings
    }

    pub fn columns(&self) -> &[ColumnInterpretation] {
        &self.columns
    }

    /// Edit surface for the functions in [`crate::columns`]. Structural
    /// rebuilds still belong to the registry.
    pub fn columns_mut(&mut self) -> &mut Vec<ColumnInterpretation> {
        &mut self.columns
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [FileEntry] {
        &mut self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Add a file in `pending` state. Bytes are owned by the entry from here
    /// on; they are released to the storage backend during upload.
    pub fn add_file(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Uuid {
        let entry = FileEntry::new(file_name.into(), bytes);
        let id = entry.id;
        debug!(
            "Added '{}' to batch '{}' ({} bytes)",
            entry.file_name,
            self.batch_key,
            entry.bytes.len()
        );
        self.entries.push(entry);
        id
    }

    pub fn position_by_name(&self, file_name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.file_name == file_name)
    }

    /// Decode every `pending` entry. Each file fails independently; the
    /// first successful decode also triggers the one-shot separator sniff
    /// and seeds the column model.
    pub fn stage_all(&mut self) {
        for idx in 0..self.entries.len() {
            if self.entries[idx].status == FileStatus::Pending {
                self.stage_entry(idx);
            }
        }
    }

    fn stage_entry(&mut self, idx: usize) {
        let result = {
            let entry = &self.entries[idx];
            decode::decode(&entry.file_name, &entry.bytes, self.encoding)
        };
        match result {
            Ok(content) => {
                if !self.sniffed {
                    self.settings.separator = sniff::detect(&content);
                    self.sniffed = true;
                    info!(
                        "Detected separator '{}' from '{}'",
                        self.settings.separator.label(),
                        self.entries[idx].file_name
                    );
                }
                let entry = &mut self.entries[idx];
                entry.content = Some(content);
                entry.advance(FileStatus::Staged);
                info!("✓ Staged '{}'", entry.file_name);
                if self.columns.is_empty() {
                    self.rebuild_columns();
                }
            }
            Err(err) => self.entries[idx].fail(err.to_string()),
        }
    }

    /// Replace the batch settings. The column model is rebuilt wholesale
    /// from the preview file, discarding any per-column edits, and the
    /// automatic sniff is considered spent.
    pub fn set_settings(&mut self, settings: ParseSettings) {
        self.settings = settings;
        self.sniffed = true;
        self.rebuild_columns();
        debug!(
            "Parse settings now separator '{}', header row {}",
            self.settings.separator.label(),
            self.settings.header_row
        );
    }

    /// Re-run separator detection against the preview file and rebuild the
    /// column model under the detected separator.
    pub fn resniff(&mut self) {
        let detected = self
            .entries
            .iter()
            .find_map(|entry| entry.content())
            .map(sniff::detect);
        if let Some(separator) = detected {
            self.settings.separator = separator;
            self.sniffed = true;
            self.rebuild_columns();
            info!("Re-sniffed separator '{}'", separator.label());
        }
    }

    /// First decoded file's text, the basis for previews and column builds.
    pub fn preview_content(&self) -> Option<&str> {
        self.entries.iter().find_map(|entry| entry.content())
    }

    fn rebuild_columns(&mut self) {
        let table = self
            .entries
            .iter()
            .find_map(|entry| entry.content())
            .map(|text| parse::parse(text, &self.settings));
        self.columns = match table {
            Some(table) => columns::build_columns(&table),
            None => Vec::new(),
        };
    }

    /// Assign or clear the association for the entry at `index`.
    ///
    /// Uniqueness is enforced at selection time only: taking an id held by
    /// another entry is rejected, never stolen. Clearing always succeeds.
    pub fn associate(
        &mut self,
        index: usize,
        association_id: Option<String>,
    ) -> Result<(), IngestError> {
        if let Some(wanted) = association_id.as_deref() {
            let holder = self
                .entries
                .iter()
                .enumerate()
                .find(|(other, entry)| {
                    *other != index && entry.association_id.as_deref() == Some(wanted)
                })
                .map(|(_, entry)| entry.file_name.clone());
            if let Some(holder) = holder {
                debug!("Association '{wanted}' already held by '{holder}'");
                return Err(IngestError::AssociationTaken(wanted.to_string()));
            }
        }
        self.entries[index].association_id = association_id;
        Ok(())
    }

    pub fn progress(&self) -> BatchProgress {
        let counts = self.entries.iter().counts_by(|entry| entry.status);
        BatchProgress {
            total: self.entries.len(),
            done: counts.get(&FileStatus::Done).copied().unwrap_or(0),
            errored: counts.get(&FileStatus::Error).copied().unwrap_or(0),
        }
    }

    /// Abandon the session: every entry, setting, and column is dropped and
    /// the next staged file sniffs from scratch.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.columns.clear();
        self.settings = ParseSettings::default();
        self.sniffed = false;
        info!("Batch '{}' reset", self.batch_key);
    }
}
