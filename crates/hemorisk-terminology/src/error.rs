//! Terminology resolution errors
//!
//! Every failure here is soft: a set that cannot be resolved is treated
//! as a non-match by the evaluator, never as an aborted assessment.

use thiserror::Error;

/// Errors raised while expanding a terminology set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerminologyError {
    /// The request could not be sent or did not complete
    #[error("Terminology request failed: {message}")]
    RequestFailed { message: String },

    /// The server answered with a non-success status
    #[error("Terminology server returned status {status}")]
    ServerStatus { status: u16 },

    /// The response body is not a usable expansion
    #[error("Malformed expansion response: {message}")]
    MalformedResponse { message: String },
}

impl TerminologyError {
    /// Create a request-failed error
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::RequestFailed {
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}
