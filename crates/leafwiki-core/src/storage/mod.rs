use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::StorageResult;
use crate::model::{PageId, PageRecord};

mod file;
mod memory;

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

/// Record filter understood by every backend
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Query {
    /// Every record
    #[default]
    All,
    /// The record with this id
    Id(PageId),
    /// Records whose parent is this id
    ParentId(PageId),
    /// Records without a parent
    Roots,
}

impl Query {
    pub fn matches(&self, record: &PageRecord) -> bool {
        match self {
            Query::All => true,
            Query::Id(id) => record.id.as_ref() == Some(id),
            Query::ParentId(parent) => record.parent_id.as_ref() == Some(parent),
            Query::Roots => record.parent_id.is_none(),
        }
    }
}

/// Key-document storage the page store runs against.
///
/// Lookups return `None` on a miss instead of a sentinel record. Results
/// come back in insertion order. Any `Err` is a backend fault and is passed
/// to callers unchanged.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn find_one(&self, query: &Query) -> StorageResult<Option<PageRecord>>;

    async fn find(&self, query: &Query) -> StorageResult<Vec<PageRecord>>;

    /// Store a new record and return it with its assigned id
    async fn insert(&self, record: PageRecord) -> StorageResult<PageRecord>;

    /// Replace the content of matching records, keeping their ids.
    /// Returns the number of records touched.
    async fn update(&self, query: &Query, record: PageRecord) -> StorageResult<usize>;

    /// Returns the number of records removed
    async fn remove(&self, query: &Query) -> StorageResult<usize>;
}

/// Open the backend selected by configuration
pub async fn open_storage(config: &StorageConfig) -> StorageResult<Arc<dyn DocumentStorage>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageBackend::File => Ok(Arc::new(JsonFileStorage::open(&config.path).await?)),
    }
}

/// Apply an update to an in-memory record list
pub(crate) fn apply_update(
    records: &mut [PageRecord],
    query: &Query,
    record: &PageRecord,
) -> usize {
    let mut touched = 0;
    for stored in records.iter_mut().filter(|stored| query.matches(stored)) {
        *stored = PageRecord {
            id: stored.id.clone(),
            ..record.clone()
        };
        touched += 1;
    }
    touched
}

/// Apply a removal to an in-memory record list
pub(crate) fn apply_remove(records: &mut Vec<PageRecord>, query: &Query) -> usize {
    let before = records.len();
    records.retain(|stored| !query.matches(stored));
    before - records.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, parent: Option<&str>) -> PageRecord {
        PageRecord {
            id: Some(PageId::from(id)),
            parent_id: parent.map(PageId::from),
            ..PageRecord::default()
        }
    }

    #[test]
    fn test_query_matching() {
        let root = record("a", None);
        let child = record("b", Some("a"));

        assert!(Query::All.matches(&root));
        assert!(Query::Id(PageId::from("a")).matches(&root));
        assert!(!Query::Id(PageId::from("a")).matches(&child));
        assert!(Query::ParentId(PageId::from("a")).matches(&child));
        assert!(!Query::ParentId(PageId::from("a")).matches(&root));
        assert!(Query::Roots.matches(&root));
        assert!(!Query::Roots.matches(&child));
    }

    #[test]
    fn test_update_keeps_ids() {
        let mut records = vec![record("a", None), record("b", Some("a"))];
        let replacement = PageRecord {
            id: Some(PageId::from("zzz")),
            title: "New".to_string(),
            ..PageRecord::default()
        };

        let touched = apply_update(&mut records, &Query::Id(PageId::from("b")), &replacement);

        assert_eq!(touched, 1);
        assert_eq!(records[1].id, Some(PageId::from("b")));
        assert_eq!(records[1].title, "New");
        assert_eq!(records[1].parent_id, None);
        assert_eq!(records[0], record("a", None));
    }

    #[test]
    fn test_remove_only_matching() {
        let mut records = vec![record("a", None), record("b", Some("a")), record("c", Some("a"))];

        assert_eq!(apply_remove(&mut records, &Query::Id(PageId::from("missing"))), 0);
        assert_eq!(apply_remove(&mut records, &Query::ParentId(PageId::from("a"))), 2);
        assert_eq!(records, vec![record("a", None)]);
    }
}
