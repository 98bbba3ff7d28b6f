//! Matching rules and rule-set configuration
//!
//! Rules are a closed tagged union validated fully at load time; the
//! evaluator never has to defend against a malformed rule. Categories are
//! applied in strict precedence order: direct code, prefix, keyword,
//! terminology set, local set.

use crate::error::ConfigError;
use crate::record::{ClinicalStatus, CodeSet, Coding, ResourceKind};
use crate::scoring::ScoringConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Average days per month used by temporal windows.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Tolerance band applied to both ends of a temporal window, in days.
pub const WINDOW_TOLERANCE_DAYS: f64 = 15.0;

/// Temporal constraints on a matching rule.
///
/// A record matches only if its status equals `required_status` (when set)
/// and its recorded date falls in the inclusive window `today - N months`,
/// with one month = 30.44 days and a 15-day tolerance band on both ends.
/// A missing recorded date fails any filter that sets a month bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TemporalFilter {
    /// Clinical status the record must carry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_status: Option<ClinicalStatus>,
    /// Record must be no older than this many months
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_months_ago: Option<f64>,
    /// Record must be at least this many months old
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_months_ago: Option<f64>,
}

impl TemporalFilter {
    /// True when the filter constrains the recorded date
    pub fn has_date_bound(&self) -> bool {
        self.max_months_ago.is_some() || self.min_months_ago.is_some()
    }

    /// Check a record's status and recorded date against this filter.
    pub fn matches(
        &self,
        status: Option<ClinicalStatus>,
        recorded: Option<NaiveDate>,
        today: NaiveDate,
    ) -> bool {
        if let Some(required) = self.required_status {
            if status != Some(required) {
                return false;
            }
        }
        if !self.has_date_bound() {
            return true;
        }
        let Some(date) = recorded else {
            // A date bound with no date on the record is a non-match.
            return false;
        };
        let age_days = (today - date).num_days() as f64;
        if let Some(max) = self.max_months_ago {
            if age_days > max * DAYS_PER_MONTH + WINDOW_TOLERANCE_DAYS {
                return false;
            }
        }
        if let Some(min) = self.min_months_ago {
            if age_days < min * DAYS_PER_MONTH - WINDOW_TOLERANCE_DAYS {
                return false;
            }
        }
        true
    }

    fn validate(&self, kind: &'static str) -> Result<(), ConfigError> {
        let check = |label: &str, value: Option<f64>| -> Result<(), ConfigError> {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ConfigError::InvalidWindow {
                        kind,
                        message: format!("{label} must be a non-negative number, got {v}"),
                    });
                }
            }
            Ok(())
        };
        check("max_months_ago", self.max_months_ago)?;
        check("min_months_ago", self.min_months_ago)?;
        if let (Some(min), Some(max)) = (self.min_months_ago, self.max_months_ago) {
            if min > max {
                return Err(ConfigError::InvalidWindow {
                    kind,
                    message: format!("min_months_ago {min} exceeds max_months_ago {max}"),
                });
            }
        }
        Ok(())
    }
}

/// One matching rule.
///
/// The five variants correspond to the five precedence-ordered categories
/// the evaluator applies. Scores are fixed per rule; a record's score is
/// the maximum over its matching rules, never a sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case", deny_unknown_fields)]
pub enum MatchRule {
    /// Exact (system, code) equality against any coding on the record
    DirectCode {
        system: String,
        code: String,
        score: u32,
    },
    /// Case-insensitive code-prefix match within one system, with an
    /// optional temporal window
    Prefix {
        system: String,
        prefix: String,
        score: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window: Option<TemporalFilter>,
    },
    /// Case-insensitive substring containment in the record's combined
    /// display/free text
    Keyword { keyword: String, score: u32 },
    /// Membership in a server-resolved terminology set, optionally
    /// restricted to codings of one system
    TerminologySet {
        set_ref: String,
        score: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        system_filter: Option<String>,
    },
    /// Membership in a locally configured named set, with an optional
    /// temporal window
    LocalSet {
        key: String,
        score: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window: Option<TemporalFilter>,
    },
}

impl MatchRule {
    /// The score this rule contributes when it matches
    pub fn score(&self) -> u32 {
        match self {
            Self::DirectCode { score, .. }
            | Self::Prefix { score, .. }
            | Self::Keyword { score, .. }
            | Self::TerminologySet { score, .. }
            | Self::LocalSet { score, .. } => *score,
        }
    }

    /// Human-readable description used in evidence entries
    pub fn describe(&self) -> String {
        match self {
            Self::DirectCode { system, code, .. } => format!("code {system}|{code}"),
            Self::Prefix { system, prefix, .. } => format!("code prefix {prefix} ({system})"),
            Self::Keyword { keyword, .. } => format!("keyword \"{keyword}\""),
            Self::TerminologySet { set_ref, .. } => format!("terminology set {set_ref}"),
            Self::LocalSet { key, .. } => format!("local set {key}"),
        }
    }

    fn validate(&self, kind: &'static str, ceiling: u32) -> Result<(), ConfigError> {
        let score = self.score();
        if score == 0 || score > ceiling {
            return Err(ConfigError::ScoreOutOfRange {
                kind,
                score,
                ceiling,
            });
        }
        let non_empty = |field: &'static str, value: &str| -> Result<(), ConfigError> {
            if value.trim().is_empty() {
                Err(ConfigError::EmptyField { kind, field })
            } else {
                Ok(())
            }
        };
        match self {
            Self::DirectCode { system, code, .. } => {
                non_empty("system", system)?;
                non_empty("code", code)?;
            }
            Self::Prefix {
                system,
                prefix,
                window,
                ..
            } => {
                non_empty("system", system)?;
                non_empty("prefix", prefix)?;
                if let Some(window) = window {
                    window.validate(kind)?;
                }
            }
            Self::Keyword { keyword, .. } => non_empty("keyword", keyword)?,
            Self::TerminologySet { set_ref, .. } => non_empty("set_ref", set_ref)?,
            Self::LocalSet { key, window, .. } => {
                non_empty("key", key)?;
                if let Some(window) = window {
                    window.validate(kind)?;
                }
            }
        }
        Ok(())
    }
}

/// Rules and ceiling for one resource kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindRules {
    /// Maximum score any single record of this kind can contribute; also
    /// the short-circuit threshold for evaluation
    pub ceiling: u32,
    /// Rules, applied in category precedence order; order within a
    /// category is the configured order
    #[serde(default)]
    pub rules: Vec<MatchRule>,
}

impl KindRules {
    /// Empty rules with the given ceiling
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling,
            rules: Vec::new(),
        }
    }

    fn validate(
        &self,
        kind: &'static str,
        local_sets: &BTreeMap<String, Vec<Coding>>,
    ) -> Result<(), ConfigError> {
        if self.ceiling == 0 {
            return Err(ConfigError::ZeroCeiling { kind });
        }
        for rule in &self.rules {
            rule.validate(kind, self.ceiling)?;
            if let MatchRule::LocalSet { key, .. } = rule {
                if !local_sets.contains_key(key) {
                    return Err(ConfigError::UnknownLocalSet {
                        kind,
                        key: key.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Default number of record pages fetched per source before the walk is
/// abandoned, protecting against a misbehaving provider.
pub const DEFAULT_MAX_PAGES: u32 = 10;

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

/// The full rule-set configuration consumed by an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    /// Condition rules
    pub conditions: KindRules,
    /// Medication rules
    pub medications: KindRules,
    /// Procedure rules
    pub procedures: KindRules,
    /// Named in-process code sets referenced by `LocalSet` rules
    #[serde(default)]
    pub local_sets: BTreeMap<String, Vec<Coding>>,
    /// Upper bound on pages fetched per record source
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Numeric model configuration
    pub scoring: ScoringConfig,
}

impl RuleSet {
    /// Deserialize and validate a rule set from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let rule_set: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::malformed(e.to_string()))?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Validate every scoring-relevant field.
    ///
    /// Run once at load; evaluation assumes a validated rule set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::ZeroMaxPages);
        }
        self.conditions.validate("condition", &self.local_sets)?;
        self.medications.validate("medication", &self.local_sets)?;
        self.procedures.validate("procedure", &self.local_sets)?;
        self.scoring.validate().map_err(ConfigError::scoring)?;
        Ok(())
    }

    /// Rules for one resource kind
    pub fn rules_for(&self, kind: ResourceKind) -> &KindRules {
        match kind {
            ResourceKind::Condition => &self.conditions,
            ResourceKind::Medication => &self.medications,
            ResourceKind::Procedure => &self.procedures,
        }
    }

    /// Local sets in membership-test form, computed once per assessment.
    pub fn local_code_sets(&self) -> BTreeMap<String, CodeSet> {
        self.local_sets
            .iter()
            .map(|(key, codings)| (key.clone(), codings.iter().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::tests::minimal_stepped_config;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rule_set_with(conditions: KindRules) -> RuleSet {
        RuleSet {
            conditions,
            medications: KindRules::new(2),
            procedures: KindRules::new(1),
            local_sets: BTreeMap::new(),
            max_pages: DEFAULT_MAX_PAGES,
            scoring: minimal_stepped_config(),
        }
    }

    #[test]
    fn test_window_accepts_recent_record() {
        let filter = TemporalFilter {
            required_status: None,
            max_months_ago: Some(6.0),
            min_months_ago: None,
        };
        let today = d(2024, 6, 1);
        // 6 months * 30.44 + 15 days tolerance ~= 197 days
        assert!(filter.matches(None, Some(d(2024, 1, 1)), today));
        assert!(filter.matches(None, Some(d(2023, 11, 20)), today));
        assert!(!filter.matches(None, Some(d(2023, 10, 1)), today));
    }

    #[test]
    fn test_window_min_bound_with_tolerance() {
        let filter = TemporalFilter {
            required_status: None,
            max_months_ago: None,
            min_months_ago: Some(3.0),
        };
        let today = d(2024, 6, 1);
        // 3 months * 30.44 - 15 days tolerance ~= 76 days
        assert!(filter.matches(None, Some(d(2024, 2, 1)), today));
        assert!(!filter.matches(None, Some(d(2024, 5, 15)), today));
    }

    #[test]
    fn test_missing_date_fails_bounded_filter() {
        let filter = TemporalFilter {
            required_status: None,
            max_months_ago: Some(12.0),
            min_months_ago: None,
        };
        assert!(!filter.matches(None, None, d(2024, 6, 1)));
    }

    #[test]
    fn test_missing_date_passes_status_only_filter() {
        let filter = TemporalFilter {
            required_status: Some(ClinicalStatus::Active),
            max_months_ago: None,
            min_months_ago: None,
        };
        assert!(filter.matches(Some(ClinicalStatus::Active), None, d(2024, 6, 1)));
        assert!(!filter.matches(Some(ClinicalStatus::Resolved), None, d(2024, 6, 1)));
        assert!(!filter.matches(None, None, d(2024, 6, 1)));
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        let rules = KindRules {
            ceiling: 2,
            rules: vec![MatchRule::Keyword {
                keyword: "bleed".into(),
                score: 3,
            }],
        };
        let err = rule_set_with(rules).validate().unwrap_err();
        assert!(matches!(err, ConfigError::ScoreOutOfRange { score: 3, .. }));
    }

    #[test]
    fn test_zero_score_rejected() {
        let rules = KindRules {
            ceiling: 2,
            rules: vec![MatchRule::Keyword {
                keyword: "bleed".into(),
                score: 0,
            }],
        };
        assert!(rule_set_with(rules).validate().is_err());
    }

    #[test]
    fn test_unknown_local_set_rejected() {
        let rules = KindRules {
            ceiling: 2,
            rules: vec![MatchRule::LocalSet {
                key: "varices".into(),
                score: 2,
                window: None,
            }],
        };
        let err = rule_set_with(rules).validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLocalSet { .. }));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let rules = KindRules {
            ceiling: 2,
            rules: vec![MatchRule::Prefix {
                system: "http://hl7.org/fhir/sid/icd-10".into(),
                prefix: "K92".into(),
                score: 2,
                window: Some(TemporalFilter {
                    required_status: None,
                    max_months_ago: Some(1.0),
                    min_months_ago: Some(6.0),
                }),
            }],
        };
        assert!(matches!(
            rule_set_with(rules).validate().unwrap_err(),
            ConfigError::InvalidWindow { .. }
        ));
    }

    #[test]
    fn test_rule_set_round_trips_through_json() {
        let mut local_sets = BTreeMap::new();
        local_sets.insert(
            "varices".to_string(),
            vec![Coding::new("http://snomed.info/sct", "28670008")],
        );
        let rule_set = RuleSet {
            conditions: KindRules {
                ceiling: 2,
                rules: vec![
                    MatchRule::DirectCode {
                        system: "http://snomed.info/sct".into(),
                        code: "131148009".into(),
                        score: 2,
                    },
                    MatchRule::LocalSet {
                        key: "varices".into(),
                        score: 2,
                        window: None,
                    },
                ],
            },
            medications: KindRules::new(2),
            procedures: KindRules::new(1),
            local_sets,
            max_pages: 5,
            scoring: minimal_stepped_config(),
        };
        rule_set.validate().unwrap();

        let json = serde_json::to_string(&rule_set).unwrap();
        let parsed = RuleSet::from_json_str(&json).unwrap();
        assert_eq!(parsed, rule_set);
    }

    #[test]
    fn test_unknown_rule_field_is_malformed() {
        let json = r#"{
            "conditions": {"ceiling": 2, "rules": [{"match": "keyword", "keyword": "bleed", "score": 1, "extra": true}]},
            "medications": {"ceiling": 2, "rules": []},
            "procedures": {"ceiling": 1, "rules": []},
            "scoring": {"strategy": "stepped_threshold", "terms": [], "flags": [], "cutoffs": [{"at": 2.0, "category": "moderate"}]}
        }"#;
        assert!(matches!(
            RuleSet::from_json_str(json).unwrap_err(),
            ConfigError::Malformed { .. }
        ));
    }
}
