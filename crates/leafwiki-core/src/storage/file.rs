use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::RwLock;

use super::{apply_remove, apply_update, DocumentStorage, Query};
use crate::error::{StorageError, StorageResult};
use crate::model::PageRecord;
use crate::utils::id::generate_id;

/// Single-file datastore.
///
/// All records live in memory and the whole set is written back as a JSON
/// array after every mutation. The write goes to a sibling temp file that
/// is renamed over the datastore, so a crash leaves the previous state.
pub struct JsonFileStorage {
    path: PathBuf,
    records: RwLock<Vec<PageRecord>>,
}

impl JsonFileStorage {
    /// Load the datastore at `path`. A missing or empty file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Opened datastore {:?} with {} pages", path, records.len());

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    async fn persist(&self, records: &[PageRecord]) -> StorageResult<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let buffer = serde_json::to_vec_pretty(records)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &buffer).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!("Could not remove {:?}: {}", tmp, cleanup);
            }
            return Err(e.into());
        }

        debug!("Persisted {} pages to {:?}", records.len(), self.path);
        Ok(())
    }

    /// Run a mutation on a copy and only keep it once it is on disk
    async fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut Vec<PageRecord>) -> T,
    ) -> StorageResult<T> {
        let mut records = self.records.write().await;
        let mut next = records.clone();
        let outcome = mutate(&mut next);
        self.persist(&next).await?;
        *records = next;
        Ok(outcome)
    }
}

#[async_trait]
impl DocumentStorage for JsonFileStorage {
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
        let stored = record.clone();
        self.commit(move |records| records.push(record)).await?;
        Ok(stored)
    }

    async fn update(&self, query: &Query, record: PageRecord) -> StorageResult<usize> {
        self.commit(|records| apply_update(records, query, &record)).await
    }

    async fn remove(&self, query: &Query) -> StorageResult<usize> {
        self.commit(|records| apply_remove(records, query)).await
    }
}
