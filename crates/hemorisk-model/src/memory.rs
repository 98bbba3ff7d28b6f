//! In-memory record sources
//!
//! `InMemoryRecordSource` is the only source implementation the engine
//! ships; anything provider-backed implements [`RecordSource`] outside
//! this crate. `FailingRecordSource` exists for degradation testing.

use crate::error::SourceError;
use crate::source::{PageCursor, RecordPage, RecordSource};
use async_trait::async_trait;
use hemorisk_types::{ClinicalRecord, ResourceKind};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A record source over a fixed list of records, split into pages.
pub struct InMemoryRecordSource {
    kind: ResourceKind,
    pages: Vec<Vec<ClinicalRecord>>,
    served: AtomicUsize,
}

impl InMemoryRecordSource {
    /// Source serving `records` in pages of at most `page_size`
    pub fn new(kind: ResourceKind, records: Vec<ClinicalRecord>, page_size: usize) -> Self {
        let pages = records
            .chunks(page_size.max(1))
            .map(<[ClinicalRecord]>::to_vec)
            .collect();
        Self {
            kind,
            pages,
            served: AtomicUsize::new(0),
        }
    }

    /// Source serving exactly the given pages
    pub fn from_pages(kind: ResourceKind, pages: Vec<Vec<ClinicalRecord>>) -> Self {
        Self {
            kind,
            pages,
            served: AtomicUsize::new(0),
        }
    }

    /// Number of pages served so far, across restarts
    pub fn pages_served(&self) -> usize {
        self.served.load(Ordering::Relaxed)
    }

    fn page_at(&self, index: usize) -> RecordPage {
        self.served.fetch_add(1, Ordering::Relaxed);
        let records = self.pages.get(index).cloned().unwrap_or_default();
        let next = if index + 1 < self.pages.len() {
            Some(PageCursor::new((index + 1).to_string()))
        } else {
            None
        };
        RecordPage { records, next }
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn first_page(&self) -> Result<RecordPage, SourceError> {
        Ok(self.page_at(0))
    }

    async fn next_page(&self, cursor: &PageCursor) -> Result<RecordPage, SourceError> {
        let index: usize = cursor
            .as_str()
            .parse()
            .map_err(|_| SourceError::InvalidCursor {
                cursor: cursor.to_string(),
            })?;
        if index >= self.pages.len() {
            return Err(SourceError::InvalidCursor {
                cursor: cursor.to_string(),
            });
        }
        Ok(self.page_at(index))
    }
}

/// A source that serves its pages and then fails on the next fetch.
///
/// With no pages at all, even the first fetch fails.
pub struct FailingRecordSource {
    inner: InMemoryRecordSource,
    message: String,
}

impl FailingRecordSource {
    /// Source failing on the fetch after `pages` are exhausted
    pub fn after_pages(kind: ResourceKind, pages: Vec<Vec<ClinicalRecord>>) -> Self {
        Self {
            inner: InMemoryRecordSource::from_pages(kind, pages),
            message: "simulated provider failure".to_string(),
        }
    }

    /// Source whose first fetch already fails
    pub fn immediate(kind: ResourceKind) -> Self {
        Self::after_pages(kind, Vec::new())
    }

    /// Number of pages served before the failure
    pub fn pages_served(&self) -> usize {
        self.inner.pages_served()
    }
}

#[async_trait]
impl RecordSource for FailingRecordSource {
    fn kind(&self) -> ResourceKind {
        self.inner.kind()
    }

    async fn first_page(&self) -> Result<RecordPage, SourceError> {
        if self.inner.pages.is_empty() {
            return Err(SourceError::fetch_failed(self.message.clone()));
        }
        let mut page = self.inner.first_page().await?;
        if page.next.is_none() {
            // Point past the real pages so the following fetch fails.
            page.next = Some(PageCursor::new(self.inner.pages.len().to_string()));
        }
        Ok(page)
    }

    async fn next_page(&self, cursor: &PageCursor) -> Result<RecordPage, SourceError> {
        let index: usize = cursor
            .as_str()
            .parse()
            .map_err(|_| SourceError::InvalidCursor {
                cursor: cursor.to_string(),
            })?;
        if index >= self.inner.pages.len() {
            return Err(SourceError::fetch_failed(self.message.clone()));
        }
        let mut page = self.inner.page_at(index);
        if page.next.is_none() {
            page.next = Some(PageCursor::new(self.inner.pages.len().to_string()));
        }
        Ok(page)
    }
}
