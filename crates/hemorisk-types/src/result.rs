//! Assessment results
//!
//! A `CompositeRiskResult` is created fresh per assessment request and
//! never persisted by this engine. Every component carries an explicit
//! not-available marker when its input was missing, so a result is always
//! producible even with maximal missing data.

use crate::record::ResourceKind;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One recorded justification for a score contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvidence {
    /// Kind of the record the match came from
    pub kind: ResourceKind,
    /// Display text of the matched record
    pub record_text: String,
    /// Human-readable description of the matching rule
    pub rule: String,
    /// Score the match contributed
    pub points: u32,
    /// Recorded date of the matched record, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded: Option<NaiveDate>,
}

/// Aggregated result of evaluating one resource kind's corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindScore {
    /// Resource kind this score covers
    pub kind: ResourceKind,
    /// Maximum record-level score across the corpus (never a sum)
    pub score: u32,
    /// Evidence entries, one per running-maximum raise
    pub evidence: Vec<ScoreEvidence>,
    /// Pages successfully fetched from the record source
    pub pages_fetched: u32,
    /// Records evaluated before termination
    pub records_seen: usize,
}

impl KindScore {
    /// An empty score for a kind that produced no data
    pub fn empty(kind: ResourceKind) -> Self {
        Self {
            kind,
            score: 0,
            evidence: Vec::new(),
            pages_fetched: 0,
            records_seen: 0,
        }
    }

    /// True when at least one page was read, i.e. the score is grounded in
    /// actual data rather than a total fetch failure.
    pub fn has_data(&self) -> bool {
        self.pages_fetched > 0
    }
}

/// Per-kind scores handed to the numeric models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KindScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<KindScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<KindScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedures: Option<KindScore>,
}

impl KindScores {
    /// Empty scores: every kind unavailable
    pub fn new() -> Self {
        Self::default()
    }

    /// Score slot for one kind
    pub fn get(&self, kind: ResourceKind) -> Option<&KindScore> {
        match kind {
            ResourceKind::Condition => self.conditions.as_ref(),
            ResourceKind::Medication => self.medications.as_ref(),
            ResourceKind::Procedure => self.procedures.as_ref(),
        }
    }

    /// Store the score for its kind
    pub fn set(&mut self, score: KindScore) {
        match score.kind {
            ResourceKind::Condition => self.conditions = Some(score),
            ResourceKind::Medication => self.medications = Some(score),
            ResourceKind::Procedure => self.procedures = Some(score),
        }
    }

    /// Usable score for one kind: present and backed by at least one
    /// fetched page.
    pub fn usable(&self, kind: ResourceKind) -> Option<u32> {
        self.get(kind).filter(|s| s.has_data()).map(|s| s.score)
    }

    /// All evidence across kinds, conditions first
    pub fn all_evidence(&self) -> Vec<ScoreEvidence> {
        let mut evidence = Vec::new();
        for slot in [&self.conditions, &self.medications, &self.procedures] {
            if let Some(score) = slot {
                evidence.extend(score.evidence.iter().cloned());
            }
        }
        evidence
    }
}

/// Ordered risk category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Moderate => f.write_str("moderate"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Final numeric outcome: an integer point total for the additive models,
/// a continuous percentage for the hazard model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RiskTotal {
    /// Rounded point total
    Points(i64),
    /// One-period event probability, percent in [0, 100]
    Probability(f64),
}

impl fmt::Display for RiskTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Points(p) => write!(f, "{p}"),
            Self::Probability(pct) => write!(f, "{pct:.1}%"),
        }
    }
}

/// Contribution of one named component to the result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ComponentScore {
    /// Points added to an additive total
    Points(f64),
    /// Ratio multiplied into the running hazard ratio
    HazardRatio(f64),
    /// Factor evaluated and found absent; contributed nothing
    NotApplied,
    /// Input missing; the component could not be evaluated
    NotAvailable,
}

impl ComponentScore {
    /// True for the not-available marker
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::NotAvailable)
    }
}

/// Ordered per-component breakdown keyed by component name.
pub type ComponentBreakdown = IndexMap<String, ComponentScore>;

/// The complete outcome of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRiskResult {
    /// Final numeric outcome
    pub total: RiskTotal,
    /// Category derived from the configured cutoffs
    pub category: RiskCategory,
    /// Named per-component contributions, in model order
    pub components: ComponentBreakdown,
    /// Evidence for every record-derived contribution
    pub evidence: Vec<ScoreEvidence>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_ordering() {
        assert!(RiskCategory::Low < RiskCategory::Moderate);
        assert!(RiskCategory::Moderate < RiskCategory::High);
    }

    #[test]
    fn test_kind_score_without_pages_is_unusable() {
        let mut scores = KindScores::new();
        scores.set(KindScore {
            kind: ResourceKind::Condition,
            score: 2,
            evidence: Vec::new(),
            pages_fetched: 0,
            records_seen: 0,
        });
        assert_eq!(scores.usable(ResourceKind::Condition), None);

        scores.set(KindScore {
            kind: ResourceKind::Condition,
            score: 2,
            evidence: Vec::new(),
            pages_fetched: 1,
            records_seen: 4,
        });
        assert_eq!(scores.usable(ResourceKind::Condition), Some(2));
    }

    #[test]
    fn test_result_serializes_with_markers() {
        let mut components = ComponentBreakdown::new();
        components.insert("age".to_string(), ComponentScore::Points(1.0));
        components.insert("egfr".to_string(), ComponentScore::NotAvailable);

        let result = CompositeRiskResult {
            total: RiskTotal::Points(1),
            category: RiskCategory::Low,
            components,
            evidence: Vec::new(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("not_available"));
        let parsed: CompositeRiskResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
