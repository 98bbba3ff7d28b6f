//! Assessment orchestration
//!
//! `RiskAssessor` wires the rule evaluator, terminology resolver and
//! numeric strategy together: one call takes patient inputs plus record
//! sources and produces a composite result. Missing sources and failed
//! fetches degrade to not-available markers; only an invalid rule set is
//! fatal, and that is rejected at construction.

use chrono::{Local, NaiveDate};
use hemorisk_eval::{EvalContext, RuleEvaluator};
use hemorisk_model::RecordSource;
use hemorisk_terminology::{HttpTerminologyClient, ServerContext, TerminologyResolver};
use hemorisk_types::{
    CompositeRiskResult, ConfigError, KindScores, PatientInputs, ResourceKind, RuleSet,
};
use log::warn;
use std::sync::Arc;

/// Record sources for one patient, one optional slot per kind.
///
/// An absent slot leaves that kind's channel not-available in the result.
#[derive(Default)]
pub struct PatientSources<'a> {
    pub conditions: Option<&'a dyn RecordSource>,
    pub medications: Option<&'a dyn RecordSource>,
    pub procedures: Option<&'a dyn RecordSource>,
}

impl PatientSources<'_> {
    /// No sources supplied
    pub fn none() -> Self {
        Self::default()
    }
}

/// Configured assessment engine.
pub struct RiskAssessor {
    rule_set: RuleSet,
    evaluator: RuleEvaluator,
}

impl RiskAssessor {
    /// Assessor resolving terminology sets over HTTP.
    ///
    /// Fails only when the rule set is invalid; an assessment itself
    /// always produces a result.
    pub fn new(rule_set: RuleSet) -> Result<Self, ConfigError> {
        let resolver = TerminologyResolver::new(Arc::new(HttpTerminologyClient::new()));
        Self::with_resolver(rule_set, Arc::new(resolver))
    }

    /// Assessor over an explicit resolver, for tests and custom caches
    pub fn with_resolver(
        rule_set: RuleSet,
        resolver: Arc<TerminologyResolver>,
    ) -> Result<Self, ConfigError> {
        rule_set.validate()?;
        Ok(Self {
            rule_set,
            evaluator: RuleEvaluator::new(resolver),
        })
    }

    /// The validated rule set
    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    /// Assess with temporal windows anchored to the current date.
    pub async fn assess(
        &self,
        inputs: &PatientInputs,
        sources: &PatientSources<'_>,
        server: &ServerContext,
    ) -> CompositeRiskResult {
        self.assess_at(inputs, sources, server, Local::now().date_naive())
            .await
    }

    /// Assess with temporal windows anchored to an explicit date.
    pub async fn assess_at(
        &self,
        inputs: &PatientInputs,
        sources: &PatientSources<'_>,
        server: &ServerContext,
        today: NaiveDate,
    ) -> CompositeRiskResult {
        let local_sets = self.rule_set.local_code_sets();
        let ctx = EvalContext::new(&local_sets, server, today);

        let mut kind_scores = KindScores::new();
        for (kind, slot) in [
            (ResourceKind::Condition, sources.conditions),
            (ResourceKind::Medication, sources.medications),
            (ResourceKind::Procedure, sources.procedures),
        ] {
            let Some(source) = slot else { continue };
            if source.kind() != kind {
                warn!(
                    "{} slot holds a {} source; skipping it",
                    kind.name(),
                    source.kind().name()
                );
                continue;
            }
            let score = self
                .evaluator
                .evaluate_source(&self.rule_set, source, &ctx)
                .await;
            kind_scores.set(score);
        }

        hemorisk_score::evaluate(&self.rule_set.scoring, inputs, &kind_scores)
    }
}
