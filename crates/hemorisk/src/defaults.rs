//! Built-in bleeding-risk configuration
//!
//! A curated rule set covering the common bleeding-risk signals:
//! anticoagulant, antiplatelet and NSAID medications, prior-bleed and
//! intracranial-hemorrhage condition codes, transfusion procedures, and
//! free-text keyword fallbacks for uncoded records. The scoring model is
//! a stepped-threshold point system over age, renal function, hemoglobin
//! and platelets.
//!
//! The set ships validated; deployments needing different codes or
//! weights load their own JSON through [`RuleSet::from_json_str`].

use hemorisk_types::{
    Band, CategoryCutoff, ClinicalStatus, Coding, DEFAULT_MAX_PAGES, FactorTrigger, FlagPoints,
    HazardFactor, HazardModel, KindRules, LabComponent, LinearModel, LinearTerm, MatchRule,
    RecordChannels, ResourceKind, RiskCategory, RiskDirection, RiskFlag, RuleSet, ScoringConfig,
    SteppedModel, SteppedTerm, TemporalFilter,
};
use std::collections::BTreeMap;

/// RxNorm medication code system
pub const RXNORM: &str = "http://www.nlm.nih.gov/research/umls/rxnorm";
/// WHO ATC medication classification system
pub const ATC: &str = "http://www.whocc.no/atc";
/// SNOMED CT code system
pub const SNOMED: &str = "http://snomed.info/sct";
/// ICD-10 code system
pub const ICD10: &str = "http://hl7.org/fhir/sid/icd-10";

fn direct(system: &str, code: &str, score: u32) -> MatchRule {
    MatchRule::DirectCode {
        system: system.to_string(),
        code: code.to_string(),
        score,
    }
}

fn keyword(keyword: &str, score: u32) -> MatchRule {
    MatchRule::Keyword {
        keyword: keyword.to_string(),
        score,
    }
}

fn medication_rules() -> KindRules {
    KindRules {
        ceiling: 2,
        rules: vec![
            // Oral anticoagulants and therapeutic heparins
            direct(RXNORM, "11289", 2),   // warfarin
            direct(RXNORM, "1364430", 2), // apixaban
            direct(RXNORM, "1114195", 2), // rivaroxaban
            direct(RXNORM, "1037042", 2), // dabigatran etexilate
            direct(RXNORM, "1599538", 2), // edoxaban
            direct(RXNORM, "67108", 2),   // enoxaparin
            // Antiplatelets and NSAIDs
            direct(RXNORM, "32968", 1), // clopidogrel
            direct(RXNORM, "1191", 1),  // aspirin
            direct(RXNORM, "7258", 1),  // naproxen
            direct(RXNORM, "5640", 1),  // ibuprofen
            MatchRule::Prefix {
                system: ATC.to_string(),
                prefix: "B01A".to_string(), // antithrombotic agents
                score: 2,
                window: None,
            },
            MatchRule::Prefix {
                system: ATC.to_string(),
                prefix: "M01A".to_string(), // NSAIDs, only when recent
                score: 1,
                window: Some(TemporalFilter {
                    required_status: None,
                    max_months_ago: Some(12.0),
                    min_months_ago: None,
                }),
            },
            keyword("warfarin", 2),
            keyword("heparin", 2),
            keyword("anticoagulant", 2),
            keyword("aspirin", 1),
            keyword("nsaid", 1),
        ],
    }
}

fn condition_rules() -> KindRules {
    let icd_prefix = |prefix: &str, score: u32, window: Option<TemporalFilter>| MatchRule::Prefix {
        system: ICD10.to_string(),
        prefix: prefix.to_string(),
        score,
        window,
    };
    KindRules {
        ceiling: 2,
        rules: vec![
            direct(SNOMED, "131148009", 2), // bleeding
            icd_prefix("K92", 2, None),     // GI hemorrhage
            icd_prefix("I60", 2, None),     // subarachnoid hemorrhage
            icd_prefix("I61", 2, None),     // intracerebral hemorrhage
            icd_prefix("I62", 2, None),     // other intracranial hemorrhage
            // Acute posthemorrhagic anemia, only when recent
            icd_prefix(
                "D62",
                2,
                Some(TemporalFilter {
                    required_status: None,
                    max_months_ago: Some(24.0),
                    min_months_ago: None,
                }),
            ),
            icd_prefix("Z92.1", 1, None), // history of anticoagulant use
            keyword("bleed", 2),
            keyword("hemorrhage", 2),
            keyword("haemorrhage", 2),
            keyword("anemia", 1),
            keyword("anaemia", 1),
            MatchRule::LocalSet {
                key: "esophageal-varices".to_string(),
                score: 2,
                window: Some(TemporalFilter {
                    required_status: Some(ClinicalStatus::Active),
                    max_months_ago: None,
                    min_months_ago: None,
                }),
            },
        ],
    }
}

fn procedure_rules() -> KindRules {
    KindRules {
        ceiling: 1,
        rules: vec![
            direct(SNOMED, "116859006", 1), // transfusion of blood product
            keyword("transfusion", 1),
        ],
    }
}

fn local_sets() -> BTreeMap<String, Vec<Coding>> {
    let mut sets = BTreeMap::new();
    sets.insert(
        "esophageal-varices".to_string(),
        vec![
            Coding::new(SNOMED, "28670008").with_display("Esophageal varices"),
            Coding::new(ICD10, "I85.0").with_display("Esophageal varices with bleeding"),
        ],
    );
    sets
}

fn default_flag_points() -> Vec<FlagPoints> {
    [
        (RiskFlag::PriorBleeding, 2.0),
        (RiskFlag::Anticoagulation, 1.0),
        (RiskFlag::PriorTransfusion, 1.0),
        (RiskFlag::RenalDisease, 1.0),
        (RiskFlag::LiverDisease, 1.0),
        (RiskFlag::Hypertension, 1.0),
        (RiskFlag::StrokeHistory, 1.0),
        (RiskFlag::AlcoholExcess, 1.0),
    ]
    .into_iter()
    .map(|(flag, points)| FlagPoints { flag, points })
    .collect()
}

fn default_cutoffs() -> Vec<CategoryCutoff> {
    vec![
        CategoryCutoff {
            at: 2.0,
            category: RiskCategory::Moderate,
        },
        CategoryCutoff {
            at: 4.0,
            category: RiskCategory::High,
        },
    ]
}

fn stepped_scoring() -> ScoringConfig {
    let term = |component: LabComponent, direction: RiskDirection, bands: Vec<Band>| SteppedTerm {
        component,
        direction,
        bands,
        bands_female: None,
    };
    let band = |threshold: f64, points: f64| Band { threshold, points };

    ScoringConfig::SteppedThreshold(SteppedModel {
        terms: vec![
            term(
                LabComponent::Age,
                RiskDirection::Above,
                vec![band(75.0, 1.0)],
            ),
            term(
                LabComponent::Egfr,
                RiskDirection::Below,
                vec![band(60.0, 1.0), band(30.0, 2.0)],
            ),
            SteppedTerm {
                component: LabComponent::Hemoglobin,
                direction: RiskDirection::Below,
                bands: vec![band(13.0, 1.0)],
                bands_female: Some(vec![band(12.0, 1.0)]),
            },
            term(
                LabComponent::Platelets,
                RiskDirection::Below,
                vec![band(100.0, 1.0)],
            ),
            term(
                LabComponent::WhiteCells,
                RiskDirection::Above,
                vec![band(12.0, 1.0)],
            ),
        ],
        flags: default_flag_points(),
        records: RecordChannels::default(),
        cutoffs: default_cutoffs(),
    })
}

/// The built-in bleeding-risk rule set with stepped-threshold scoring.
pub fn default_rule_set() -> RuleSet {
    RuleSet {
        conditions: condition_rules(),
        medications: medication_rules(),
        procedures: procedure_rules(),
        local_sets: local_sets(),
        max_pages: DEFAULT_MAX_PAGES,
        scoring: stepped_scoring(),
    }
}

/// An alternative truncated-linear scoring model.
///
/// Inputs are clamped to physiological ranges before the margin past each
/// threshold is scored, so an extreme outlier contributes no more than the
/// clamp bound.
pub fn default_linear_scoring() -> ScoringConfig {
    let term = |component: LabComponent,
                direction: RiskDirection,
                threshold: f64,
                clamp_min: f64,
                clamp_max: f64,
                coefficient: f64| LinearTerm {
        component,
        direction,
        threshold,
        threshold_female: None,
        clamp_min,
        clamp_max,
        coefficient,
    };

    ScoringConfig::TruncatedLinear(LinearModel {
        base: 0.0,
        terms: vec![
            term(
                LabComponent::Age,
                RiskDirection::Above,
                65.0,
                18.0,
                100.0,
                0.04,
            ),
            term(
                LabComponent::Egfr,
                RiskDirection::Below,
                60.0,
                5.0,
                150.0,
                0.03,
            ),
            LinearTerm {
                component: LabComponent::Hemoglobin,
                direction: RiskDirection::Below,
                threshold: 13.0,
                threshold_female: Some(12.0),
                clamp_min: 4.0,
                clamp_max: 20.0,
                coefficient: 0.25,
            },
            term(
                LabComponent::Platelets,
                RiskDirection::Below,
                100.0,
                10.0,
                1000.0,
                0.01,
            ),
        ],
        flags: default_flag_points(),
        records: RecordChannels::default(),
        cutoffs: default_cutoffs(),
    })
}

/// An alternative hazard-ratio scoring model over a 2.5% baseline
/// one-year major-bleed rate.
///
/// Swap it into a rule set to report probability percentages instead of
/// points.
pub fn default_hazard_scoring() -> ScoringConfig {
    ScoringConfig::HazardRatio(HazardModel {
        baseline_rate: 0.025,
        factors: vec![
            HazardFactor {
                name: "age".to_string(),
                ratio: 1.8,
                trigger: FactorTrigger::AgeAtLeast { years: 75.0 },
            },
            HazardFactor {
                name: "renal_impairment".to_string(),
                ratio: 1.6,
                trigger: FactorTrigger::LabBelow {
                    component: LabComponent::Egfr,
                    threshold: 30.0,
                    threshold_female: None,
                },
            },
            HazardFactor {
                name: "anemia".to_string(),
                ratio: 1.9,
                trigger: FactorTrigger::LabBelow {
                    component: LabComponent::Hemoglobin,
                    threshold: 13.0,
                    threshold_female: Some(12.0),
                },
            },
            HazardFactor {
                name: "thrombocytopenia".to_string(),
                ratio: 1.7,
                trigger: FactorTrigger::LabBelow {
                    component: LabComponent::Platelets,
                    threshold: 100.0,
                    threshold_female: None,
                },
            },
            HazardFactor {
                name: "anticoagulation".to_string(),
                ratio: 2.1,
                trigger: FactorTrigger::FlagSet {
                    flag: RiskFlag::Anticoagulation,
                },
            },
            HazardFactor {
                name: "prior_bleeding".to_string(),
                ratio: 2.4,
                trigger: FactorTrigger::FlagSet {
                    flag: RiskFlag::PriorBleeding,
                },
            },
            HazardFactor {
                name: "condition_history".to_string(),
                ratio: 1.5,
                trigger: FactorTrigger::KindScoreAtLeast {
                    kind: ResourceKind::Condition,
                    score: 2,
                },
            },
        ],
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
    })
}
