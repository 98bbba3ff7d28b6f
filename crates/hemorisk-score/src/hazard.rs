//! Hazard-ratio strategy
//!
//! Factors compose multiplicatively: the running ratio starts at 1.0 and
//! multiplies in the ratio of every triggered factor. The combined ratio
//! scales the baseline hazard, which converts back to a one-period event
//! probability:
//!
//! ```text
//! baseline_hazard = -ln(1 - baseline_rate)
//! probability     = 1 - exp(-baseline_hazard * hazard_ratio)
//! ```

use crate::support::{category_for, sex_threshold};
use hemorisk_types::{
    ComponentBreakdown, ComponentScore, CompositeRiskResult, FactorTrigger, HazardModel,
    KindScores, PatientInputs, RiskTotal,
};

pub(crate) fn evaluate(
    model: &HazardModel,
    inputs: &PatientInputs,
    kind_scores: &KindScores,
) -> CompositeRiskResult {
    let mut components = ComponentBreakdown::new();
    let mut hazard_ratio = 1.0;

    for factor in &model.factors {
        let state = trigger_state(&factor.trigger, inputs, kind_scores);
        let score = match state {
            TriggerState::Applies => {
                hazard_ratio *= factor.ratio;
                ComponentScore::HazardRatio(factor.ratio)
            }
            TriggerState::DoesNotApply => ComponentScore::NotApplied,
            TriggerState::Unavailable => ComponentScore::NotAvailable,
        };
        components.insert(factor.name.clone(), score);
    }

    let baseline_hazard = -(1.0 - model.baseline_rate).ln();
    let probability = 1.0 - (-baseline_hazard * hazard_ratio).exp();
    let percent = (probability * 100.0).clamp(0.0, 100.0);

    CompositeRiskResult {
        total: RiskTotal::Probability(percent),
        category: category_for(&model.cutoffs, percent),
        components,
        evidence: kind_scores.all_evidence(),
    }
}

enum TriggerState {
    Applies,
    DoesNotApply,
    Unavailable,
}

fn trigger_state(
    trigger: &FactorTrigger,
    inputs: &PatientInputs,
    kind_scores: &KindScores,
) -> TriggerState {
    match trigger {
        FactorTrigger::AgeAtLeast { years } => match inputs.age_years {
            Some(age) if age >= *years => TriggerState::Applies,
            Some(_) => TriggerState::DoesNotApply,
            None => TriggerState::Unavailable,
        },
        FactorTrigger::LabBelow {
            component,
            threshold,
            threshold_female,
        } => match inputs.value(*component) {
            Some(value) => {
                let bound = sex_threshold(*threshold, *threshold_female, inputs.sex);
                if value < bound {
                    TriggerState::Applies
                } else {
                    TriggerState::DoesNotApply
                }
            }
            None => TriggerState::Unavailable,
        },
        FactorTrigger::LabAtLeast {
            component,
            threshold,
            threshold_female,
        } => match inputs.value(*component) {
            Some(value) => {
                let bound = sex_threshold(*threshold, *threshold_female, inputs.sex);
                if value >= bound {
                    TriggerState::Applies
                } else {
                    TriggerState::DoesNotApply
                }
            }
            None => TriggerState::Unavailable,
        },
        // Flags are categorical: absent means "not present", never unknown.
        FactorTrigger::FlagSet { flag } => {
            if inputs.has_flag(*flag) {
                TriggerState::Applies
            } else {
                TriggerState::DoesNotApply
            }
        }
        FactorTrigger::KindScoreAtLeast { kind, score } => match kind_scores.usable(*kind) {
            Some(actual) if actual >= *score => TriggerState::Applies,
            Some(_) => TriggerState::DoesNotApply,
            None => TriggerState::Unavailable,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hemorisk_types::{
        CategoryCutoff, HazardFactor, KindScore, LabComponent, ResourceKind, RiskCategory,
        RiskFlag,
    };

    fn model(factors: Vec<HazardFactor>) -> HazardModel {
        HazardModel {
            baseline_rate: 0.025,
            factors,
            cutoffs: vec![
                CategoryCutoff {
                    at: 5.0,
                    category: RiskCategory::Moderate,
                },
                CategoryCutoff {
                    at: 10.0,
                    category: RiskCategory::High,
                },
            ],
        }
    }

    fn percent(result: &CompositeRiskResult) -> f64 {
        match result.total {
            RiskTotal::Probability(pct) => pct,
            RiskTotal::Points(p) => panic!("Expected probability, got {p} points"),
        }
    }

    #[test]
    fn test_no_triggered_factors_returns_baseline() {
        let result = evaluate(&model(Vec::new()), &PatientInputs::new(), &KindScores::new());
        assert!((percent(&result) - 2.5).abs() < 1e-9);
        assert_eq!(result.category, RiskCategory::Low);
    }

    #[test]
    fn test_factors_compose_multiplicatively() {
        let factors = vec![
            HazardFactor {
                name: "age".into(),
                ratio: 1.5,
                trigger: FactorTrigger::AgeAtLeast { years: 65.0 },
            },
            HazardFactor {
                name: "renal".into(),
                ratio: 2.0,
                trigger: FactorTrigger::LabBelow {
                    component: LabComponent::Egfr,
                    threshold: 30.0,
                    threshold_female: None,
                },
            },
            HazardFactor {
                name: "anticoagulation".into(),
                ratio: 1.2,
                trigger: FactorTrigger::FlagSet {
                    flag: RiskFlag::Anticoagulation,
                },
            },
        ];
        let inputs = PatientInputs {
            age_years: Some(80.0),
            egfr: Some(25.0),
            flags: [RiskFlag::Anticoagulation].into_iter().collect(),
            ..PatientInputs::new()
        };

        let result = evaluate(&model(factors), &inputs, &KindScores::new());
        // Combined ratio 1.5 * 2.0 * 1.2 = 3.6, never 1.5 + 2.0 + 1.2.
        let expected = (1.0 - (-(-(1.0f64 - 0.025).ln()) * 3.6).exp()) * 100.0;
        assert!((percent(&result) - expected).abs() < 1e-9);
        assert_eq!(
            result.components.get("age"),
            Some(&ComponentScore::HazardRatio(1.5))
        );
    }

    #[test]
    fn test_missing_input_marks_factor_unavailable() {
        let factors = vec![HazardFactor {
            name: "renal".into(),
            ratio: 2.0,
            trigger: FactorTrigger::LabBelow {
                component: LabComponent::Egfr,
                threshold: 30.0,
                threshold_female: None,
            },
        }];
        let result = evaluate(&model(factors), &PatientInputs::new(), &KindScores::new());
        assert_eq!(
            result.components.get("renal"),
            Some(&ComponentScore::NotAvailable)
        );
        // The unavailable factor contributes nothing.
        assert!((percent(&result) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_kind_score_trigger_requires_fetched_data() {
        let factors = vec![HazardFactor {
            name: "prior-bleed".into(),
            ratio: 2.5,
            trigger: FactorTrigger::KindScoreAtLeast {
                kind: ResourceKind::Condition,
                score: 2,
            },
        }];
        let hazard = model(factors);

        let mut fetched = KindScores::new();
        fetched.set(KindScore {
            kind: ResourceKind::Condition,
            score: 2,
            evidence: Vec::new(),
            pages_fetched: 1,
            records_seen: 3,
        });
        let result = evaluate(&hazard, &PatientInputs::new(), &fetched);
        assert_eq!(
            result.components.get("prior-bleed"),
            Some(&ComponentScore::HazardRatio(2.5))
        );

        let mut unfetched = KindScores::new();
        unfetched.set(KindScore {
            kind: ResourceKind::Condition,
            score: 2,
            evidence: Vec::new(),
            pages_fetched: 0,
            records_seen: 0,
        });
        let result = evaluate(&hazard, &PatientInputs::new(), &unfetched);
        assert_eq!(
            result.components.get("prior-bleed"),
            Some(&ComponentScore::NotAvailable)
        );
    }

    #[test]
    fn test_percentage_is_clamped() {
        let factors = vec![HazardFactor {
            name: "extreme".into(),
            ratio: 1e6,
            trigger: FactorTrigger::FlagSet {
                flag: RiskFlag::PriorBleeding,
            },
        }];
        let inputs = PatientInputs {
            flags: [RiskFlag::PriorBleeding].into_iter().collect(),
            ..PatientInputs::new()
        };
        let result = evaluate(&model(factors), &inputs, &KindScores::new());
        let pct = percent(&result);
        assert!((0.0..=100.0).contains(&pct));
        assert_eq!(result.category, RiskCategory::High);
    }
}
