//! Data model for bleeding-risk assessment
//!
//! This crate defines the shared vocabulary of the engine:
//! - Clinical records, codings and statuses as retrieved from a provider
//! - Matching rules and the validated rule-set configuration
//! - Patient inputs (demographics, labs, categorical flags)
//! - Numeric model configuration for the three scoring strategies
//! - Assessment results with per-component availability markers

pub mod error;
pub mod inputs;
pub mod record;
pub mod result;
pub mod rules;
pub mod scoring;

pub use error::ConfigError;
pub use inputs::{LabComponent, PatientInputs, RiskFlag, Sex};
pub use record::{ClinicalRecord, ClinicalStatus, CodeSet, Coding, ResourceKind};
pub use result::{
    ComponentBreakdown, ComponentScore, CompositeRiskResult, KindScore, KindScores, RiskCategory,
    RiskTotal, ScoreEvidence,
};
pub use rules::{
    DAYS_PER_MONTH, DEFAULT_MAX_PAGES, KindRules, MatchRule, RuleSet, TemporalFilter,
    WINDOW_TOLERANCE_DAYS,
};
pub use scoring::{
    Band, CategoryCutoff, FactorTrigger, FlagPoints, HazardFactor, HazardModel, LinearModel,
    LinearTerm, RecordChannels, RiskDirection, ScoringConfig, SteppedModel, SteppedTerm,
};
