//! Collaborator boundary: where documents come from and where records go.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CvRecord, DocumentKind};

pub mod s3;

pub use s3::S3Storage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("unsupported document type: {0}")]
    Unsupported(String),

    #[error("object store error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A document as fetched from the source system.
#[derive(Debug)]
pub struct FetchedDocument {
    pub file_id: String,
    pub file_name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, file_id: &str) -> Result<FetchedDocument, StorageError>;
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persists one record and returns the key it was written under.
    async fn persist(&self, record: &CvRecord) -> Result<String, StorageError>;
}

/// `<prefix><dir>/<stem>_extracted.json` for a source file id. The source's
/// directory is kept so same-named files from different folders never share
/// a key.
pub fn record_key(prefix: &str, file_id: &str) -> String {
    let file_id = file_id.trim_start_matches('/');
    let (dir, base) = match file_id.rsplit_once('/') {
        Some((dir, base)) => (format!("{dir}/"), base),
        None => (String::new(), file_id),
    };
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };
    format!("{prefix}{dir}{stem}_extracted.json")
}
