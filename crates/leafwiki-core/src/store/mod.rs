use std::collections::HashSet;
use std::iter::FusedIterator;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{PageError, PageResult, StorageError};
use crate::model::{Page, PageId, PageRecord};
use crate::storage::{DocumentStorage, Query};


/// Page lifecycle and hierarchy navigation over an injected backend.
///
/// Lookups are miss-tolerant: `get` and `parent` hand back an empty, unsaved
/// `Page` when nothing matches, so callers check `Page::id()` to tell a
/// missing page from an empty one. `find` is the `Option` flavour of `get`.
/// Backend faults are returned unchanged and never retried.
///
/// The hierarchy is never cached: `parent` and `children` query the backend
/// on every call.
#[derive(Clone)]
pub struct PageStore {
    storage: Arc<dyn DocumentStorage>,
}

impl PageStore {
    pub fn new(storage: Arc<dyn DocumentStorage>) -> Self {
        Self { storage }
    }

    /// The page with this id, or an unsaved page on a miss
    pub async fn get(&self, id: &PageId) -> PageResult<Page> {
        Ok(Page::from_lookup(self.lookup(id).await?))
    }

    pub async fn find(&self, id: &PageId) -> PageResult<Option<Page>> {
        Ok(self.lookup(id).await?.map(Page::from_record))
    }

    /// Pages matching `query`, in backend order. Each page is built as the
    /// iterator reaches it.
    pub async fn get_all(&self, query: Query) -> PageResult<Pages> {
        debug!("find {:?}", query);
        let records = self.storage.find(&query).await?;
        Ok(Pages::new(records))
    }

    /// Insert an unsaved page and adopt the assigned id, or update the
    /// record of a persisted one. The id of a persisted page never changes.
    pub async fn save<'a>(&self, page: &'a mut Page) -> PageResult<&'a mut Page> {
        let record = page.to_record();

        match page.id().cloned() {
            Some(id) => {
                debug!("update {}", id);
                let touched = self.storage.update(&Query::Id(id.clone()), record).await?;
                if touched == 0 {
                    warn!("Saved page {} has no backing record", id);
                }
            }
            None => {
                let inserted = self
                    .storage
                    .insert(PageRecord { id: None, ..record })
                    .await?;
                let id = inserted.id.ok_or(StorageError::MissingId)?;
                debug!("inserted {}", id);
                page.assign_id(id);
            }
        }

        Ok(page)
    }

    /// Remove the backing record and return the page to the unsaved state.
    /// Unsaved pages are left alone and nothing is sent to the backend.
    pub async fn destroy<'a>(&self, page: &'a mut Page) -> PageResult<&'a mut Page> {
        let Some(id) = page.id().cloned() else {
            debug!("destroy on unsaved page skipped");
            return Ok(page);
        };

        debug!("remove {}", id);
        self.storage.remove(&Query::Id(id)).await?;
        page.clear_id();
        Ok(page)
    }

    /// The parent page; unsaved when the page is a root or the link dangles
    pub async fn parent(&self, page: &Page) -> PageResult<Page> {
        let Some(parent_id) = page.parent_id() else {
            return Ok(Page::new());
        };

        let record = self.lookup(parent_id).await?;
        if record.is_none() {
            warn!("Parent {} of page {:?} not found", parent_id, page.id());
        }
        Ok(Page::from_lookup(record))
    }

    /// Pages whose parent is this page; empty for an unsaved page
    pub async fn children(&self, page: &Page) -> PageResult<Vec<Page>> {
        let Some(id) = page.id() else {
            return Ok(Vec::new());
        };

        Ok(self.get_all(Query::ParentId(id.clone())).await?.collect())
    }

    /// Parent chain from the nearest ancestor up to the root.
    ///
    /// Stops early at a dangling link or when an id repeats, so stored cycles
    /// do not loop forever.
    pub async fn ancestors(&self, page: &Page) -> PageResult<Vec<Page>> {
        let mut chain = Vec::new();
        let mut seen: HashSet<PageId> = page.id().cloned().into_iter().collect();
        let mut next = page.parent_id().cloned();

        while let Some(parent_id) = next {
            if !seen.insert(parent_id.clone()) {
                warn!("Cycle in parent chain at page {}", parent_id);
                break;
            }

            let Some(record) = self.lookup(&parent_id).await? else {
                warn!("Parent {} not found, chain ends", parent_id);
                break;
            };

            let parent = Page::from_record(record);
            next = parent.parent_id().cloned();
            chain.push(parent);
        }

        Ok(chain)
    }

    /// Checked parent assignment.
    ///
    /// Refuses a parent that is the page itself or one of its descendants.
    /// Only the in-memory page changes; call `save` to persist.
    pub async fn reparent(&self, page: &mut Page, parent: &Page) -> PageResult<()> {
        if let (Some(id), Some(parent_id)) = (page.id(), parent.id()) {
            let cyclic = id == parent_id
                || self
                    .ancestors(parent)
                    .await?
                    .iter()
                    .any(|ancestor| ancestor.id() == Some(id));

            if cyclic {
                warn!("Refused to move page {} under {}", id, parent_id);
                return Err(PageError::Cycle {
                    page: id.clone(),
                    parent: parent_id.clone(),
                });
            }
        }

        page.set_parent(parent);
        Ok(())
    }

    async fn lookup(&self, id: &PageId) -> PageResult<Option<PageRecord>> {
        debug!("find_one {}", id);
        Ok(self.storage.find_one(&Query::Id(id.clone())).await?)
    }
}

/// Single-pass sequence of pages from one backend query
pub struct Pages {
    records: std::vec::IntoIter<PageRecord>,
}

impl Pages {
    fn new(records: Vec<PageRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl Iterator for Pages {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        self.records.next().map(Page::from_record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl DoubleEndedIterator for Pages {
    fn next_back(&mut self) -> Option<Page> {
        self.records.next_back().map(Page::from_record)
    }
}

impl ExactSizeIterator for Pages {}

impl FusedIterator for Pages {}
