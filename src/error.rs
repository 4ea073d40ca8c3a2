use thiserror::Error;

/// Failures a single file can hit on its way through the pipeline.
///
/// The batch runner never propagates these; it folds them into the owning
/// entry's error message and moves on to the next file, so one bad export
/// cannot sink the rest of the batch.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file name maps to no decoder, or a workbook arrived without sheets.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    /// The raw bytes could not be turned into tabular text.
    #[error("Decoding '{name}' failed: {reason}")]
    DecodeFailed { name: String, reason: String },
    /// The storage backend rejected the raw upload.
    #[error("Uploading '{name}' failed: {reason}")]
    UploadFailed { name: String, reason: String },
    /// The commit backend rejected the parsed rows.
    #[error("Committing '{name}' failed: {reason}")]
    CommitFailed { name: String, reason: String },
    /// The requested association id is already held by another file in the batch.
    #[error("Association id '{0}' is already assigned to another file")]
    AssociationTaken(String),
}
