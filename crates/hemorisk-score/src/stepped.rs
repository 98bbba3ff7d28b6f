//! Stepped-threshold strategy
//!
//! Each continuous term carries ordered bands; the most severe band the
//! value crosses supplies that term's points. Crossing is strict, so a
//! value exactly at a threshold stays in the less severe band.

use crate::support::{add_points, category_for, flag_points, record_points};
use hemorisk_types::{
    ComponentBreakdown, ComponentScore, CompositeRiskResult, KindScores, PatientInputs,
    RiskDirection, RiskTotal, Sex, SteppedModel, SteppedTerm,
};

pub(crate) fn evaluate(
    model: &SteppedModel,
    inputs: &PatientInputs,
    kind_scores: &KindScores,
) -> CompositeRiskResult {
    let mut components = ComponentBreakdown::new();
    let mut total = 0.0;

    for term in &model.terms {
        let name = term.component.name().to_string();
        match inputs.value(term.component) {
            Some(value) => {
                let points = band_points(term, value, inputs.sex);
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

fn band_points(term: &SteppedTerm, value: f64, sex: Option<Sex>) -> f64 {
    // Bands run least to most severe; the last crossed band wins.
    let mut points = 0.0;
    for band in term.bands_for(sex) {
        let crossed = match term.direction {
            RiskDirection::Above => value > band.threshold,
            RiskDirection::Below => value < band.threshold,
        };
        if crossed {
            points = band.points;
        }
    }
    points
}
