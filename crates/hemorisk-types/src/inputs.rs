//! Demographic, laboratory and categorical inputs to the numeric models
//!
//! All values are optional; a missing input marks its component "not
//! available" in the result instead of failing the assessment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Patient sex, used for sex-adjusted thresholds (hemoglobin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

/// Continuous inputs the scoring terms can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabComponent {
    /// Age in years
    Age,
    /// Estimated glomerular filtration rate, mL/min/1.73m2
    Egfr,
    /// Hemoglobin, g/dL
    Hemoglobin,
    /// Platelet count, 10^9/L
    Platelets,
    /// White-cell count, 10^9/L
    WhiteCells,
}

impl LabComponent {
    /// Stable snake_case name used as a component key
    pub fn name(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Egfr => "egfr",
            Self::Hemoglobin => "hemoglobin",
            Self::Platelets => "platelets",
            Self::WhiteCells => "white_cells",
        }
    }
}

impl fmt::Display for LabComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Categorical risk factors.
///
/// The closed vocabulary keeps configuration strictly validated; an
/// unknown flag name fails deserialization instead of matching nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    PriorBleeding,
    Anticoagulation,
    PriorTransfusion,
    RenalDisease,
    LiverDisease,
    Hypertension,
    StrokeHistory,
    AlcoholExcess,
    Diabetes,
    HeartFailure,
}

impl RiskFlag {
    /// Stable snake_case name used as a component key
    pub fn name(&self) -> &'static str {
        match self {
            Self::PriorBleeding => "prior_bleeding",
            Self::Anticoagulation => "anticoagulation",
            Self::PriorTransfusion => "prior_transfusion",
            Self::RenalDisease => "renal_disease",
            Self::LiverDisease => "liver_disease",
            Self::Hypertension => "hypertension",
            Self::StrokeHistory => "stroke_history",
            Self::AlcoholExcess => "alcohol_excess",
            Self::Diabetes => "diabetes",
            Self::HeartFailure => "heart_failure",
        }
    }
}

/// Demographic/lab inputs plus categorical flags for one assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_years: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egfr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hemoglobin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platelets: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_cells: Option<f64>,
    /// Present categorical risk factors; absence means "not present"
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<RiskFlag>,
}

impl PatientInputs {
    /// Inputs with nothing known
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of one continuous input, if known
    pub fn value(&self, component: LabComponent) -> Option<f64> {
        match component {
            LabComponent::Age => self.age_years,
            LabComponent::Egfr => self.egfr,
            LabComponent::Hemoglobin => self.hemoglobin,
            LabComponent::Platelets => self.platelets,
            LabComponent::WhiteCells => self.white_cells,
        }
    }

    /// True when the categorical factor is present
    pub fn has_flag(&self, flag: RiskFlag) -> bool {
        self.flags.contains(&flag)
    }
}
