//! CLI functionality for the hemorisk tool
//!
//! This module contains all CLI-related functionality including:
//! - Running assessments from JSON files
//! - Rule-set validation
//! - Output formatting

#[cfg(feature = "cli")]
pub mod assess;
#[cfg(feature = "cli")]
pub mod output;
#[cfg(feature = "cli")]
pub mod validate;
