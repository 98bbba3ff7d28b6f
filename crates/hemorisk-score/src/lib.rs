//! Numeric risk models
//!
//! This crate turns patient inputs and per-kind record scores into a
//! composite risk result. Three interchangeable strategies share one
//! entry point:
//!
//! - **Truncated linear**: clamped inputs times per-unit coefficients
//! - **Stepped threshold**: banded integer points per crossed threshold
//! - **Hazard ratio**: multiplicative factors over a baseline event rate
//!
//! Every strategy reports a per-component breakdown alongside the total,
//! marking missing inputs "not available" rather than failing.

mod hazard;
mod linear;
mod stepped;
mod support;

use hemorisk_types::{CompositeRiskResult, KindScores, PatientInputs, ScoringConfig};
use log::debug;

/// Evaluate the configured scoring strategy.
///
/// The configuration selects the model; inputs and record scores feed
/// whichever terms the model declares. Callers should have validated the
/// configuration already, so this never fails: unknown values surface as
/// `ComponentScore::NotAvailable` entries in the breakdown.
pub fn evaluate(
    config: &ScoringConfig,
    inputs: &PatientInputs,
    kind_scores: &KindScores,
) -> CompositeRiskResult {
    let result = match config {
        ScoringConfig::TruncatedLinear(model) => linear::evaluate(model, inputs, kind_scores),
        ScoringConfig::SteppedThreshold(model) => stepped::evaluate(model, inputs, kind_scores),
        ScoringConfig::HazardRatio(model) => hazard::evaluate(model, inputs, kind_scores),
    };
    debug!(
        "{} strategy scored {} ({})",
        config.strategy_name(),
        result.total,
        result.category
    );
    result
}
