//! Leafwiki Core Library
//!
//! Page documents with a block-editor body, a title derived from the first
//! header block, and a parent/child forest resolved through storage queries.
//!

mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod store;
pub mod utils;

pub use config::{LoggingConfig, StorageBackend, StorageConfig, WikiConfig};
pub use error::{PageError, PageResult, StorageError, StorageResult};
pub use model::{Block, Body, Page, PageId, PageRecord};
pub use storage::{open_storage, DocumentStorage, JsonFileStorage, MemoryStorage, Query};
pub use store::{PageStore, Pages};
