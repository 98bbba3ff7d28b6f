//! Composite scoring tests
//!
//! These tests drive the public `evaluate` entry point with full
//! JSON-configured models, covering:
//! - Strategy dispatch and category assignment
//! - Missing-input and unfetched-record degradation
//! - Record channel weighting
//! - Mixed points breakdowns across labs, flags and records

use hemorisk_types::{
    ComponentScore, CompositeRiskResult, KindScore, KindScores, PatientInputs, ResourceKind,
    RiskCategory, RiskFlag, RiskTotal, ScoreEvidence, ScoringConfig, Sex,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Test Helpers
// ============================================================================

fn config(json: &str) -> ScoringConfig {
    let config: ScoringConfig = serde_json::from_str(json).expect("config should deserialize");
    config.validate().expect("config should validate");
    config
}

fn fetched(kind: ResourceKind, score: u32) -> KindScore {
    KindScore {
        kind,
        score,
        evidence: Vec::new(),
        pages_fetched: 1,
        records_seen: 1,
    }
}

fn points(result: &CompositeRiskResult) -> i64 {
    match result.total {
        RiskTotal::Points(p) => p,
        RiskTotal::Probability(pct) => panic!("Expected points, got {pct}%"),
    }
}

fn stepped_json() -> &'static str {
    r#"{
        "strategy": "stepped_threshold",
        "terms": [
            {
                "component": "age",
                "direction": "above",
                "bands": [
                    {"threshold": 65.0, "points": 1.0},
                    {"threshold": 75.0, "points": 2.0}
                ]
            },
            {
                "component": "egfr",
                "direction": "below",
                "bands": [
                    {"threshold": 60.0, "points": 1.0},
                    {"threshold": 30.0, "points": 2.0}
                ]
            },
            {
                "component": "hemoglobin",
                "direction": "below",
                "bands": [{"threshold": 13.0, "points": 1.0}],
                "bands_female": [{"threshold": 12.0, "points": 1.0}]
            }
        ],
        "flags": [
            {"flag": "anticoagulation", "points": 1.0},
            {"flag": "prior_bleeding", "points": 2.0}
        ],
        "cutoffs": [
            {"at": 2.0, "category": "moderate"},
            {"at": 4.0, "category": "high"}
        ]
    }"#
}

// ============================================================================
// Stepped Threshold
// ============================================================================

#[test]
fn test_stepped_model_accumulates_across_channels() {
    let config = config(stepped_json());
    let inputs = PatientInputs {
        age_years: Some(80.0),
        sex: Some(Sex::Male),
        egfr: Some(25.0),
        hemoglobin: Some(14.0),
        flags: [RiskFlag::Anticoagulation].into_iter().collect(),
        ..PatientInputs::new()
    };
    let mut kind_scores = KindScores::new();
    kind_scores.set(fetched(ResourceKind::Medication, 2));

    // age 2 + egfr 2 + hemoglobin 0 + anticoagulation 1 + medications 2 = 7
    let result = hemorisk_score::evaluate(&config, &inputs, &kind_scores);
    assert_eq!(points(&result), 7);
    assert_eq!(result.category, RiskCategory::High);
    assert_eq!(
        result.components.get("age"),
        Some(&ComponentScore::Points(2.0))
    );
    assert_eq!(
        result.components.get("hemoglobin"),
        Some(&ComponentScore::Points(0.0))
    );
    assert_eq!(
        result.components.get("medications"),
        Some(&ComponentScore::Points(2.0))
    );
}

#[test]
fn test_missing_lab_degrades_to_not_available() {
    let config = config(stepped_json());
    let inputs = PatientInputs {
        age_years: Some(70.0),
        ..PatientInputs::new()
    };

    let result = hemorisk_score::evaluate(&config, &inputs, &KindScores::new());
    assert_eq!(
        result.components.get("egfr"),
        Some(&ComponentScore::NotAvailable)
    );
    assert_eq!(
        result.components.get("conditions"),
        Some(&ComponentScore::NotAvailable)
    );
    // Only the known age band contributes.
    assert_eq!(points(&result), 1);
    assert_eq!(result.category, RiskCategory::Low);
}

#[test]
fn test_unfetched_record_channel_is_not_available() {
    let config = config(stepped_json());
    let mut kind_scores = KindScores::new();
    // A walk that never fetched a page carries no usable score.
    kind_scores.set(KindScore::empty(ResourceKind::Condition));
    kind_scores.set(fetched(ResourceKind::Procedure, 1));

    let result = hemorisk_score::evaluate(&config, &PatientInputs::new(), &kind_scores);
    assert_eq!(
        result.components.get("conditions"),
        Some(&ComponentScore::NotAvailable)
    );
    assert_eq!(
        result.components.get("procedures"),
        Some(&ComponentScore::Points(1.0))
    );
}

#[test]
fn test_female_bands_shift_hemoglobin_threshold() {
    let config = config(stepped_json());
    let inputs = PatientInputs {
        hemoglobin: Some(12.5),
        sex: Some(Sex::Female),
        ..PatientInputs::new()
    };
    let result = hemorisk_score::evaluate(&config, &inputs, &KindScores::new());
    // 12.5 is below the male 13.0 bound but not the female 12.0 bound.
    assert_eq!(
        result.components.get("hemoglobin"),
        Some(&ComponentScore::Points(0.0))
    );

    let male = PatientInputs {
        sex: Some(Sex::Male),
        ..inputs
    };
    let result = hemorisk_score::evaluate(&config, &male, &KindScores::new());
    assert_eq!(
        result.components.get("hemoglobin"),
        Some(&ComponentScore::Points(1.0))
    );
}

#[test]
fn test_record_channel_weights_scale_scores() {
    let config = config(
        r#"{
            "strategy": "stepped_threshold",
            "terms": [],
            "records": {"conditions": 1.0, "medications": 0.5, "procedures": 2.0},
            "cutoffs": [{"at": 3.0, "category": "high"}]
        }"#,
    );
    let mut kind_scores = KindScores::new();
    kind_scores.set(fetched(ResourceKind::Condition, 1));
    kind_scores.set(fetched(ResourceKind::Medication, 2));
    kind_scores.set(fetched(ResourceKind::Procedure, 1));

    // 1*1.0 + 2*0.5 + 1*2.0 = 4
    let result = hemorisk_score::evaluate(&config, &PatientInputs::new(), &kind_scores);
    assert_eq!(points(&result), 4);
    assert_eq!(result.category, RiskCategory::High);
    assert_eq!(
        result.components.get("medications"),
        Some(&ComponentScore::Points(1.0))
    );
}

// ============================================================================
// Truncated Linear
// ============================================================================

#[test]
fn test_linear_model_clamps_before_scoring() {
    let config = config(
        r#"{
            "strategy": "truncated_linear",
            "base": 1.0,
            "terms": [
                {
                    "component": "age",
                    "direction": "above",
                    "threshold": 65.0,
                    "clamp_min": 40.0,
                    "clamp_max": 90.0,
                    "coefficient": 0.1
                }
            ],
            "cutoffs": [{"at": 3.0, "category": "moderate"}]
        }"#,
    );

    // 120 truncates to 90 before the excess over 65 is scored.
    let extreme = PatientInputs {
        age_years: Some(120.0),
        ..PatientInputs::new()
    };
    let at_cap = PatientInputs {
        age_years: Some(90.0),
        ..PatientInputs::new()
    };
    let extreme = hemorisk_score::evaluate(&config, &extreme, &KindScores::new());
    let at_cap = hemorisk_score::evaluate(&config, &at_cap, &KindScores::new());
    assert_eq!(extreme.components, at_cap.components);
    // base 1.0 + (90 - 65) * 0.1 = 3.5
    assert_eq!(points(&extreme), 4);
    assert_eq!(extreme.category, RiskCategory::Moderate);
}

#[test]
fn test_linear_category_uses_exact_total() {
    let config = config(
        r#"{
            "strategy": "truncated_linear",
            "terms": [
                {
                    "component": "age",
                    "direction": "above",
                    "threshold": 60.0,
                    "clamp_min": 18.0,
                    "clamp_max": 110.0,
                    "coefficient": 0.1
                }
            ],
            "cutoffs": [{"at": 2.0, "category": "moderate"}]
        }"#,
    );
    let inputs = PatientInputs {
        age_years: Some(78.0),
        ..PatientInputs::new()
    };

    // The 1.8 total rounds to 2 for display yet stays below the cutoff.
    let result = hemorisk_score::evaluate(&config, &inputs, &KindScores::new());
    assert_eq!(points(&result), 2);
    assert_eq!(result.category, RiskCategory::Low);
}

// ============================================================================
// Hazard Ratio
// ============================================================================

#[test]
fn test_hazard_model_reports_probability_percentage() {
    let config = config(
        r#"{
            "strategy": "hazard_ratio",
            "baseline_rate": 0.025,
            "factors": [
                {
                    "name": "age",
                    "ratio": 1.8,
                    "trigger": {"when": "age_at_least", "years": 75.0}
                },
                {
                    "name": "prior-bleed",
                    "ratio": 2.2,
                    "trigger": {"when": "flag_set", "flag": "prior_bleeding"}
                }
            ],
            "cutoffs": [
                {"at": 5.0, "category": "moderate"},
                {"at": 10.0, "category": "high"}
            ]
        }"#,
    );
    let inputs = PatientInputs {
        age_years: Some(82.0),
        flags: [RiskFlag::PriorBleeding].into_iter().collect(),
        ..PatientInputs::new()
    };

    let result = hemorisk_score::evaluate(&config, &inputs, &KindScores::new());
    let pct = match result.total {
        RiskTotal::Probability(pct) => pct,
        RiskTotal::Points(p) => panic!("Expected probability, got {p} points"),
    };
    // ratio 1.8 * 2.2 = 3.96 over a 2.5% baseline
    let expected = (1.0 - (-(-(1.0f64 - 0.025).ln()) * 3.96).exp()) * 100.0;
    assert!((pct - expected).abs() < 1e-9);
    assert_eq!(result.category, RiskCategory::Moderate);
    assert_eq!(
        result.components.get("prior-bleed"),
        Some(&ComponentScore::HazardRatio(2.2))
    );
}

#[test]
fn test_evidence_passes_through_to_result() {
    let config = config(stepped_json());
    let mut kind_scores = KindScores::new();
    let mut with_evidence = fetched(ResourceKind::Condition, 2);
    with_evidence.evidence.push(ScoreEvidence {
        kind: ResourceKind::Condition,
        record_text: "GI hemorrhage".into(),
        rule: "code http://snomed.info/sct|74474003".into(),
        points: 2,
        recorded: None,
    });
    kind_scores.set(with_evidence);

    let result = hemorisk_score::evaluate(&config, &PatientInputs::new(), &kind_scores);
    assert_eq!(result.evidence.len(), 1);
    assert_eq!(result.evidence[0].record_text, "GI hemorrhage");
}
