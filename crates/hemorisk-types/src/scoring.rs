//! Numeric model configuration
//!
//! Three selectable strategies share one tagged configuration type:
//!
//! - `truncated_linear`: clamped continuous terms times a coefficient
//! - `hazard_ratio`: multiplicative ratios converted to a probability
//! - `stepped_threshold`: banded integer points per component
//!
//! All strategies are validated at load time. Evaluation lives in the
//! scoring crate; these types only describe the model.

use crate::inputs::{LabComponent, RiskFlag, Sex};
use crate::record::ResourceKind;
use crate::result::RiskCategory;
use serde::{Deserialize, Serialize};

/// Which side of a threshold carries risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDirection {
    /// Values above the threshold add risk (e.g. age)
    Above,
    /// Values below the threshold add risk (e.g. eGFR)
    Below,
}

/// Maps a numeric score onto a category once it reaches `at`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryCutoff {
    /// Lowest score (or probability percentage) mapping to `category`
    pub at: f64,
    pub category: RiskCategory,
}

/// One clamped continuous term of the linear model.
///
/// The input is clamped to `[clamp_min, clamp_max]` first, so values past
/// the clamp contribute exactly as much as the clamp itself. Only the risk
/// side of `direction` contributes; the safe side contributes zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearTerm {
    pub component: LabComponent,
    pub direction: RiskDirection,
    pub threshold: f64,
    /// Threshold used instead of `threshold` for female patients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_female: Option<f64>,
    pub clamp_min: f64,
    pub clamp_max: f64,
    pub coefficient: f64,
}

impl LinearTerm {
    /// Threshold applicable for the given sex
    pub fn threshold_for(&self, sex: Option<Sex>) -> f64 {
        match (sex, self.threshold_female) {
            (Some(Sex::Female), Some(t)) => t,
            _ => self.threshold,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !self.clamp_min.is_finite() || !self.clamp_max.is_finite() {
            return Err(format!("{} clamp bounds must be finite", self.component));
        }
        if self.clamp_min >= self.clamp_max {
            return Err(format!(
                "{} clamp_min {} must be below clamp_max {}",
                self.component, self.clamp_min, self.clamp_max
            ));
        }
        if !self.threshold.is_finite() {
            return Err(format!("{} threshold must be finite", self.component));
        }
        if let Some(t) = self.threshold_female {
            if !t.is_finite() {
                return Err(format!("{} threshold_female must be finite", self.component));
            }
        }
        if !self.coefficient.is_finite() || self.coefficient <= 0.0 {
            return Err(format!(
                "{} coefficient must be a positive number, got {}",
                self.component, self.coefficient
            ));
        }
        Ok(())
    }
}

/// One band of a stepped term: reached once the value crosses `threshold`
/// on the term's risk side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub threshold: f64,
    pub points: f64,
}

/// One banded component of the stepped model.
///
/// Bands are listed from least to most severe; the most severe band the
/// value crosses wins. For `Above` that means strictly ascending
/// thresholds, for `Below` strictly descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteppedTerm {
    pub component: LabComponent,
    pub direction: RiskDirection,
    pub bands: Vec<Band>,
    /// Bands used instead of `bands` for female patients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands_female: Option<Vec<Band>>,
}

impl SteppedTerm {
    /// Bands applicable for the given sex
    pub fn bands_for(&self, sex: Option<Sex>) -> &[Band] {
        match (sex, &self.bands_female) {
            (Some(Sex::Female), Some(bands)) => bands,
            _ => &self.bands,
        }
    }

    fn validate(&self) -> Result<(), String> {
        Self::validate_bands(self.component, self.direction, &self.bands)?;
        if let Some(bands) = &self.bands_female {
            Self::validate_bands(self.component, self.direction, bands)?;
        }
        Ok(())
    }

    fn validate_bands(
        component: LabComponent,
        direction: RiskDirection,
        bands: &[Band],
    ) -> Result<(), String> {
        if bands.is_empty() {
            return Err(format!("{component} term has no bands"));
        }
        for pair in bands.windows(2) {
            let ordered = match direction {
                RiskDirection::Above => pair[0].threshold < pair[1].threshold,
                RiskDirection::Below => pair[0].threshold > pair[1].threshold,
            };
            if !ordered {
                return Err(format!(
                    "{component} bands must run from least to most severe \
                     ({} then {} does not)",
                    pair[0].threshold, pair[1].threshold
                ));
            }
            if pair[0].points > pair[1].points {
                return Err(format!(
                    "{component} band points must not decrease with severity"
                ));
            }
        }
        for band in bands {
            if !band.threshold.is_finite() || !band.points.is_finite() || band.points < 0.0 {
                return Err(format!("{component} band values must be finite and non-negative"));
            }
        }
        Ok(())
    }
}

/// Points contributed by a present categorical risk factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagPoints {
    pub flag: RiskFlag,
    pub points: f64,
}

impl FlagPoints {
    fn validate(&self) -> Result<(), String> {
        if !self.points.is_finite() || self.points < 0.0 {
            return Err(format!(
                "points for flag {} must be finite and non-negative",
                self.flag.name()
            ));
        }
        Ok(())
    }
}

/// Per-kind weights applied to the record-derived scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordChannels {
    pub conditions: f64,
    pub medications: f64,
    pub procedures: f64,
}

impl Default for RecordChannels {
    fn default() -> Self {
        Self {
            conditions: 1.0,
            medications: 1.0,
            procedures: 1.0,
        }
    }
}

impl RecordChannels {
    /// Weight for one resource kind
    pub fn weight(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Condition => self.conditions,
            ResourceKind::Medication => self.medications,
            ResourceKind::Procedure => self.procedures,
        }
    }

    fn validate(&self) -> Result<(), String> {
        for (kind, weight) in [
            ("conditions", self.conditions),
            ("medications", self.medications),
            ("procedures", self.procedures),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!(
                    "record weight for {kind} must be finite and non-negative"
                ));
            }
        }
        Ok(())
    }
}

/// Condition under which a hazard factor applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum FactorTrigger {
    /// Age at or above a bound
    AgeAtLeast { years: f64 },
    /// Continuous input strictly below a threshold
    LabBelow {
        component: LabComponent,
        threshold: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold_female: Option<f64>,
    },
    /// Continuous input at or above a threshold
    LabAtLeast {
        component: LabComponent,
        threshold: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold_female: Option<f64>,
    },
    /// Categorical risk factor present
    FlagSet { flag: RiskFlag },
    /// Record-derived score for one kind at or above a bound
    KindScoreAtLeast { kind: ResourceKind, score: u32 },
}

impl FactorTrigger {
    fn validate(&self, name: &str) -> Result<(), String> {
        match self {
            Self::AgeAtLeast { years } => {
                if !years.is_finite() || *years < 0.0 {
                    return Err(format!("factor '{name}': years must be non-negative"));
                }
            }
            Self::LabBelow {
                threshold,
                threshold_female,
                ..
            }
            | Self::LabAtLeast {
                threshold,
                threshold_female,
                ..
            } => {
                if !threshold.is_finite() {
                    return Err(format!("factor '{name}': threshold must be finite"));
                }
                if let Some(t) = threshold_female {
                    if !t.is_finite() {
                        return Err(format!("factor '{name}': threshold_female must be finite"));
                    }
                }
            }
            Self::FlagSet { .. } => {}
            Self::KindScoreAtLeast { score, .. } => {
                if *score == 0 {
                    return Err(format!(
                        "factor '{name}': a kind-score bound of 0 always applies"
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One multiplicative hazard factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardFactor {
    /// Component name shown in the result breakdown
    pub name: String,
    /// Hazard ratio multiplied into the running ratio when triggered
    pub ratio: f64,
    pub trigger: FactorTrigger,
}

impl HazardFactor {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("hazard factor name must not be empty".to_string());
        }
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(format!(
                "factor '{}': ratio must be a positive number, got {}",
                self.name, self.ratio
            ));
        }
        self.trigger.validate(&self.name)
    }
}

/// Truncated-linear model: a base plus clamped per-component contributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub base: f64,
    #[serde(default)]
    pub terms: Vec<LinearTerm>,
    #[serde(default)]
    pub flags: Vec<FlagPoints>,
    #[serde(default)]
    pub records: RecordChannels,
    pub cutoffs: Vec<CategoryCutoff>,
}

/// Stepped-threshold model: banded integer points per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteppedModel {
    #[serde(default)]
    pub terms: Vec<SteppedTerm>,
    #[serde(default)]
    pub flags: Vec<FlagPoints>,
    #[serde(default)]
    pub records: RecordChannels,
    pub cutoffs: Vec<CategoryCutoff>,
}

/// Hazard-ratio model: multiplicative ratios over a baseline event rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardModel {
    /// Baseline one-period event rate, strictly between 0 and 1
    pub baseline_rate: f64,
    #[serde(default)]
    pub factors: Vec<HazardFactor>,
    /// Cutoffs over the resulting probability percentage
    pub cutoffs: Vec<CategoryCutoff>,
}

/// Strategy-tagged scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ScoringConfig {
    TruncatedLinear(LinearModel),
    HazardRatio(HazardModel),
    SteppedThreshold(SteppedModel),
}

impl ScoringConfig {
    /// Stable strategy name, as used in the configuration tag
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::TruncatedLinear(_) => "truncated_linear",
            Self::HazardRatio(_) => "hazard_ratio",
            Self::SteppedThreshold(_) => "stepped_threshold",
        }
    }

    /// Validate the whole scoring section.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::TruncatedLinear(model) => {
                if !model.base.is_finite() {
                    return Err("base must be finite".to_string());
                }
                for term in &model.terms {
                    term.validate()?;
                }
                for flag in &model.flags {
                    flag.validate()?;
                }
                model.records.validate()?;
                validate_cutoffs(&model.cutoffs)
            }
            Self::SteppedThreshold(model) => {
                for term in &model.terms {
                    term.validate()?;
                }
                for flag in &model.flags {
                    flag.validate()?;
                }
                model.records.validate()?;
                validate_cutoffs(&model.cutoffs)
            }
            Self::HazardRatio(model) => {
                if !model.baseline_rate.is_finite()
                    || model.baseline_rate <= 0.0
                    || model.baseline_rate >= 1.0
                {
                    return Err(format!(
                        "baseline_rate must lie strictly between 0 and 1, got {}",
                        model.baseline_rate
                    ));
                }
                for factor in &model.factors {
                    factor.validate()?;
                }
                validate_cutoffs(&model.cutoffs)
            }
        }
    }
}

/// Cutoffs must be present, strictly ascending in score and in category.
fn validate_cutoffs(cutoffs: &[CategoryCutoff]) -> Result<(), String> {
    if cutoffs.is_empty() {
        return Err("cutoffs must contain at least one entry".to_string());
    }
    for cutoff in cutoffs {
        if !cutoff.at.is_finite() {
            return Err("cutoff scores must be finite".to_string());
        }
        if cutoff.category == RiskCategory::Low {
            return Err("the lowest category is implicit; cutoffs start above it".to_string());
        }
    }
    for pair in cutoffs.windows(2) {
        if pair[0].at >= pair[1].at {
            return Err(format!(
                "cutoff scores must be strictly ascending ({} then {} is not)",
                pair[0].at, pair[1].at
            ));
        }
        if pair[0].category >= pair[1].category {
            return Err("cutoff categories must be strictly ascending".to_string());
        }
    }
    Ok(())
}
