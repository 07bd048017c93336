use std::path::PathBuf;

use thiserror::Error;

use crate::model::PageId;

/// Faults raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt datastore {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("backend returned an inserted record without an id")]
    MissingId,
}

/// Faults raised by page operations.
/// A missing page is never one of them.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("page {parent} cannot become the parent of {page}: it would create a cycle")]
    Cycle { page: PageId, parent: PageId },
}

pub type StorageResult<T> = Result<T, StorageError>;
pub type PageResult<T> = Result<T, PageError>;
