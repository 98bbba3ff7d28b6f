//! Record source abstraction
//!
//! This crate defines how the engine obtains clinical records:
//! - The paginated, restartable [`RecordSource`] trait
//! - In-memory sources for bundles and tests
//! - Record extraction from FHIR R4 JSON

pub mod error;
pub mod fhir;
pub mod memory;
pub mod source;

pub use error::{ExtractError, SourceError};
pub use fhir::{record_from_json, records_from_bundle};
pub use memory::{FailingRecordSource, InMemoryRecordSource};
pub use source::{PageCursor, RecordPage, RecordSource};
