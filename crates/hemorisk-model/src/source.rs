//! Record source trait
//!
//! A record source serves one resource kind's corpus as a sequence of
//! pages. Pagination is restartable: every evaluation begins at the first
//! page, so a source must be able to serve the walk repeatedly.

use crate::error::SourceError;
use async_trait::async_trait;
use hemorisk_types::{ClinicalRecord, ResourceKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque continuation token for the next page.
///
/// The engine never inspects the token; it only hands it back to the
/// source that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wrap a provider-specific token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The provider-specific token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of records plus the cursor for the page after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPage {
    /// Records on this page, in provider order
    pub records: Vec<ClinicalRecord>,
    /// Cursor for the next page; `None` on the last page
    pub next: Option<PageCursor>,
}

impl RecordPage {
    /// A final page holding the given records
    pub fn last(records: Vec<ClinicalRecord>) -> Self {
        Self {
            records,
            next: None,
        }
    }

    /// A page holding the given records, continued by `cursor`
    pub fn continued(records: Vec<ClinicalRecord>, cursor: PageCursor) -> Self {
        Self {
            records,
            next: Some(cursor),
        }
    }
}

/// A paginated provider of clinical records for one resource kind.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Kind of record this source serves
    fn kind(&self) -> ResourceKind;

    /// Fetch the first page, restarting the walk
    async fn first_page(&self) -> Result<RecordPage, SourceError>;

    /// Fetch the page identified by a cursor from a previous page
    async fn next_page(&self, cursor: &PageCursor) -> Result<RecordPage, SourceError>;
}
