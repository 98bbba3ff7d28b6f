//! Terminology set resolution
//!
//! This crate resolves terminology set references to concrete code sets:
//! - An expiring in-memory cache keyed by set reference
//! - A FHIR `ValueSet/$expand` HTTP client
//! - A cache-first resolver that degrades on failure instead of erroring

pub mod cache;
pub mod client;
pub mod error;
pub mod resolver;

pub use cache::{Clock, DEFAULT_TTL, ManualClock, SystemClock, TerminologyCache};
pub use client::{
    DEFAULT_REQUEST_TIMEOUT, FailingLookup, HttpTerminologyClient, StaticLookup, TerminologyLookup,
};
pub use error::TerminologyError;
pub use resolver::{ServerContext, TerminologyResolver};
