//! Configuration errors
//!
//! Malformed or missing rule-set fields are fatal at load time; nothing
//! scoring-relevant is silently defaulted.

use thiserror::Error;

/// Errors raised while loading or validating a rule set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration JSON could not be deserialized
    #[error("Malformed rule set: {message}")]
    Malformed { message: String },

    /// A rule carries a score outside 1..=ceiling
    #[error("Rule score {score} out of range for {kind} rules (ceiling {ceiling})")]
    ScoreOutOfRange {
        kind: &'static str,
        score: u32,
        ceiling: u32,
    },

    /// A per-kind ceiling of zero would disable the whole category
    #[error("Ceiling for {kind} rules must be at least 1")]
    ZeroCeiling { kind: &'static str },

    /// A rule field that must carry text is empty
    #[error("Empty {field} in {kind} rule")]
    EmptyField { kind: &'static str, field: &'static str },

    /// A local-set rule references a key with no configured set
    #[error("Local set '{key}' referenced by a {kind} rule is not configured")]
    UnknownLocalSet { kind: &'static str, key: String },

    /// A temporal window is internally inconsistent
    #[error("Temporal window on a {kind} rule is invalid: {message}")]
    InvalidWindow { kind: &'static str, message: String },

    /// The scoring section failed validation
    #[error("Scoring configuration invalid: {message}")]
    InvalidScoring { message: String },

    /// The page bound must permit at least one page
    #[error("max_pages must be at least 1")]
    ZeroMaxPages,
}

impl ConfigError {
    /// Create a malformed-configuration error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create a scoring-section error
    pub fn scoring(message: impl Into<String>) -> Self {
        Self::InvalidScoring {
            message: message.into(),
        }
    }
}
