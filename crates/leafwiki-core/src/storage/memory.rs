use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{apply_remove, apply_update, DocumentStorage, Query};
use crate::error::StorageResult;
use crate::model::PageRecord;
use crate::utils::id::generate_id;

/// Volatile backend, kept in insertion order
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<Vec<PageRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStorage for MemoryStorage {
    async fn find_one(&self, query: &Query) -> StorageResult<Option<PageRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| query.matches(record)).cloned())
    }

    async fn find(&self, query: &Query) -> StorageResult<Vec<PageRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }

    async fn insert(&self, mut record: PageRecord) -> StorageResult<PageRecord> {
        record.id = Some(generate_id());
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update(&self, query: &Query, record: PageRecord) -> StorageResult<usize> {
        let mut records = self.records.write().await;
        Ok(apply_update(&mut records, query, &record))
    }

    async fn remove(&self, query: &Query) -> StorageResult<usize> {
        let mut records = self.records.write().await;
        Ok(apply_remove(&mut records, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageId;

    #[tokio::test]
    async fn test_insert_assigns_fresh_ids() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty().await);

        let first = storage.insert(PageRecord::default()).await.unwrap();
        let second = storage.insert(PageRecord::default()).await.unwrap();

        let first_id = first.id.unwrap();
        assert!(!first_id.as_str().is_empty());
        assert_ne!(Some(first_id), second.id);
        assert_eq!(storage.len().await, 2);
    }

    #[tokio::test]
    async fn test_insert_replaces_caller_id() {
        let storage = MemoryStorage::new();
        let stored = storage
            .insert(PageRecord {
                id: Some(PageId::from("chosen")),
                ..PageRecord::default()
            })
            .await
            .unwrap();

        assert_ne!(stored.id, Some(PageId::from("chosen")));
    }

    #[tokio::test]
    async fn test_find_one_miss_is_none() {
        let storage = MemoryStorage::new();
        let found = storage
            .find_one(&Query::Id(PageId::from("nope")))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let storage = MemoryStorage::new();
        let mut ids = Vec::new();
        for title in ["one", "two", "three"] {
            let stored = storage
                .insert(PageRecord {
                    title: title.to_string(),
                    ..PageRecord::default()
                })
                .await
                .unwrap();
            ids.push(stored.id);
        }

        let found: Vec<_> = storage
            .find(&Query::All)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(found, ids);
    }
}
