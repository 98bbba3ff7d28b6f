//! Bleeding-risk assessment engine
//!
//! This crate assembles the full assessment pipeline:
//! - Rule-based scoring of condition, medication and procedure records
//! - Terminology set resolution with TTL caching
//! - Interchangeable numeric strategies (stepped, linear, hazard-ratio)
//! - Best-effort degradation: only an invalid configuration is fatal
//!
//! # Example
//!
//! ```ignore
//! use hemorisk::terminology::ServerContext;
//! use hemorisk::{PatientSources, RiskAssessor, default_rule_set};
//!
//! let assessor = RiskAssessor::new(default_rule_set())?;
//! let inputs = serde_json::from_str(r#"{"age_years": 80.0, "egfr": 25.0}"#)?;
//!
//! let result = assessor
//!     .assess(&inputs, &PatientSources::none(), &ServerContext::none())
//!     .await;
//! println!("{} ({})", result.total, result.category);
//! ```

// Re-export the pipeline crates
pub use hemorisk_eval as eval;
pub use hemorisk_model as model;
pub use hemorisk_score as score;
pub use hemorisk_terminology as terminology;
pub use hemorisk_types as types;

pub mod assessor;
pub mod defaults;

// Convenience re-exports
pub use assessor::{PatientSources, RiskAssessor};
pub use defaults::{default_hazard_scoring, default_linear_scoring, default_rule_set};
pub use hemorisk_types::{
    CompositeRiskResult, ConfigError, PatientInputs, RiskCategory, RuleSet,
};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
