//! Record source and extraction errors

use thiserror::Error;

/// Errors raised while fetching record pages.
///
/// A source error never aborts an assessment; the evaluator degrades to
/// the score derived from the pages fetched so far.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    /// The provider could not serve the requested page
    #[error("Fetch failed: {message}")]
    FetchFailed { message: String },

    /// The cursor does not identify a page this source can serve
    #[error("Invalid page cursor: {cursor}")]
    InvalidCursor { cursor: String },
}

impl SourceError {
    /// Create a fetch-failed error
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::FetchFailed {
            message: message.into(),
        }
    }
}

/// Errors raised while extracting a clinical record from provider JSON.
///
/// Extraction failures are per record; the surrounding bundle walk skips
/// the record and continues.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    /// The JSON value is not an object or has no `resourceType`
    #[error("Resource has no resourceType")]
    MissingResourceType,

    /// The resource type does not map onto a supported record kind
    #[error("Unsupported resource type: {resource_type}")]
    UnsupportedType { resource_type: String },

    /// The bundle is not shaped like a FHIR Bundle
    #[error("Malformed bundle: {message}")]
    MalformedBundle { message: String },
}
