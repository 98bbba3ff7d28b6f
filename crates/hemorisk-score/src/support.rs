//! Shared pieces of the additive strategies

use hemorisk_types::{
    CategoryCutoff, ComponentBreakdown, ComponentScore, FlagPoints, KindScores, PatientInputs,
    RecordChannels, ResourceKind, RiskCategory, Sex,
};

/// Category for a score under ascending cutoffs; below every cutoff is Low.
pub(crate) fn category_for(cutoffs: &[CategoryCutoff], score: f64) -> RiskCategory {
    let mut category = RiskCategory::Low;
    for cutoff in cutoffs {
        if score >= cutoff.at {
            category = cutoff.category;
        }
    }
    category
}

/// Add points under a component name, folding repeated names together.
pub(crate) fn add_points(components: &mut ComponentBreakdown, name: String, points: f64) {
    let updated = match components.get(&name) {
        Some(ComponentScore::Points(existing)) => ComponentScore::Points(existing + points),
        _ => ComponentScore::Points(points),
    };
    components.insert(name, updated);
}

/// Score the categorical flag channel.
///
/// An absent flag means "not present" and contributes zero; flags are
/// never marked unavailable.
pub(crate) fn flag_points(
    flags: &[FlagPoints],
    inputs: &PatientInputs,
    components: &mut ComponentBreakdown,
) -> f64 {
    let mut total = 0.0;
    for entry in flags {
        let points = if inputs.has_flag(entry.flag) {
            entry.points
        } else {
            0.0
        };
        total += points;
        add_points(components, entry.flag.name().to_string(), points);
    }
    total
}

/// Score the record-derived channels.
///
/// A kind with no usable score (no source supplied, or nothing fetched)
/// is marked unavailable and contributes nothing.
pub(crate) fn record_points(
    weights: &RecordChannels,
    kind_scores: &KindScores,
    components: &mut ComponentBreakdown,
) -> f64 {
    let mut total = 0.0;
    for kind in [
        ResourceKind::Condition,
        ResourceKind::Medication,
        ResourceKind::Procedure,
    ] {
        let name = channel_name(kind).to_string();
        match kind_scores.usable(kind) {
            Some(score) => {
                let points = f64::from(score) * weights.weight(kind);
                total += points;
                add_points(components, name, points);
            }
            None => {
                components.insert(name, ComponentScore::NotAvailable);
            }
        }
    }
    total
}

/// Breakdown key for a record channel
pub(crate) fn channel_name(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Condition => "conditions",
        ResourceKind::Medication => "medications",
        ResourceKind::Procedure => "procedures",
    }
}

/// Threshold applicable for the given sex
pub(crate) fn sex_threshold(threshold: f64, threshold_female: Option<f64>, sex: Option<Sex>) -> f64 {
    match (sex, threshold_female) {
        (Some(Sex::Female), Some(t)) => t,
        _ => threshold,
    }
}
