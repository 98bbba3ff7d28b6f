//! Truncated-linear strategy
//!
//! Each continuous term clamps its input to `[clamp_min, clamp_max]`
//! before comparing against the threshold, so extreme values contribute
//! no more than the clamp itself. Contributions are never negative.

use crate::support::{add_points, category_for, flag_points, record_points};
use hemorisk_types::{
    ComponentBreakdown, ComponentScore, CompositeRiskResult, KindScores, LinearModel, LinearTerm,
    PatientInputs, RiskDirection, RiskTotal, Sex,
};

pub(crate) fn evaluate(
    model: &LinearModel,
    inputs: &PatientInputs,
    kind_scores: &KindScores,
) -> CompositeRiskResult {
    let mut components = ComponentBreakdown::new();
    let mut total = model.base;

    for term in &model.terms {
        let name = term.component.name().to_string();
        match inputs.value(term.component) {
            Some(value) => {
                let points = contribution(term, value, inputs.sex);
                total += points;
                add_points(&mut components, name, points);
            }
            None => {
                components.insert(name, ComponentScore::NotAvailable);
            }
        }
    }

    total += flag_points(&model.flags, inputs, &mut components);
    total += record_points(&model.records, kind_scores, &mut components);

    CompositeRiskResult {
        total: RiskTotal::Points(total.round() as i64),
        category: category_for(&model.cutoffs, total),
        components,
        evidence: kind_scores.all_evidence(),
    }
}

fn contribution(term: &LinearTerm, value: f64, sex: Option<Sex>) -> f64 {
    let effective = value.clamp(term.clamp_min, term.clamp_max);
    let threshold = term.threshold_for(sex);
    match term.direction {
        RiskDirection::Above if effective > threshold => {
            (effective - threshold) * term.coefficient
        }
        RiskDirection::Below if effective < threshold => {
            (threshold - effective) * term.coefficient
        }
        _ => 0.0,
    }
}
