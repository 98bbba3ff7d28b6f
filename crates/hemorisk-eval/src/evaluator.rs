//! Rule evaluation
//!
//! Matching rules are applied per record in strict category precedence:
//! direct code, code prefix, keyword, terminology set, local set. The
//! per-kind ceiling short-circuits everything downstream of it: further
//! categories on the record, further records on the page, and further
//! pages of the walk.

use crate::accumulator::{RecordTally, ScoreAccumulator};
use crate::context::EvalContext;
use hemorisk_model::{PageCursor, RecordSource};
use hemorisk_terminology::TerminologyResolver;
use hemorisk_types::{
    ClinicalRecord, Coding, KindRules, KindScore, MatchRule, RuleSet, ScoreEvidence,
    TemporalFilter,
};
use log::{debug, warn};
use std::sync::Arc;

/// Evaluates rules against records and walks record sources.
pub struct RuleEvaluator {
    resolver: Arc<TerminologyResolver>,
}

impl RuleEvaluator {
    /// Evaluator resolving terminology sets through `resolver`
    pub fn new(resolver: Arc<TerminologyResolver>) -> Self {
        Self { resolver }
    }

    /// Evaluate one record against its kind's rules.
    ///
    /// Categories run in precedence order and stop at the ceiling, so a
    /// record already at the ceiling never triggers a terminology fetch.
    pub async fn evaluate_record(
        &self,
        rules: &KindRules,
        record: &ClinicalRecord,
        ctx: &EvalContext<'_>,
    ) -> RecordTally {
        let mut tally = RecordTally::new(rules.ceiling);

        // Direct codes
        for rule in &rules.rules {
            if tally.at_ceiling() {
                return tally;
            }
            if let MatchRule::DirectCode { system, code, score } = rule {
                let hit = record
                    .codings
                    .iter()
                    .any(|c| c.system == *system && c.code == *code);
                if hit {
                    tally.observe(*score, || evidence_for(record, rule));
                }
            }
        }

        // Code prefixes, optionally windowed
        for rule in &rules.rules {
            if tally.at_ceiling() {
                return tally;
            }
            if let MatchRule::Prefix {
                system,
                prefix,
                score,
                window,
            } = rule
            {
                if !window_allows(window.as_ref(), record, ctx) {
                    continue;
                }
                let needle = prefix.to_ascii_lowercase();
                let hit = record.codings.iter().any(|c| {
                    c.system == *system && c.code.to_ascii_lowercase().starts_with(&needle)
                });
                if hit {
                    tally.observe(*score, || evidence_for(record, rule));
                }
            }
        }

        // Keywords; the first matching keyword rule ends the category
        let haystack = record.searchable_text();
        for rule in &rules.rules {
            if tally.at_ceiling() {
                return tally;
            }
            if let MatchRule::Keyword { keyword, score } = rule {
                if haystack.contains(&keyword.to_lowercase()) {
                    tally.observe(*score, || evidence_for(record, rule));
                    break;
                }
            }
        }

        // Terminology sets; an unresolvable set is a non-match
        for rule in &rules.rules {
            if tally.at_ceiling() {
                return tally;
            }
            if let MatchRule::TerminologySet {
                set_ref,
                score,
                system_filter,
            } = rule
            {
                let Some(codes) = self.resolver.resolve(ctx.server, set_ref).await else {
                    continue;
                };
                let hit = record
                    .codings
                    .iter()
                    .filter(|c| in_system(c, system_filter.as_deref()))
                    .any(|c| codes.contains(&c.system, &c.code));
                if hit {
                    tally.observe(*score, || evidence_for(record, rule));
                }
            }
        }

        // Local sets, optionally windowed
        for rule in &rules.rules {
            if tally.at_ceiling() {
                return tally;
            }
            if let MatchRule::LocalSet { key, score, window } = rule {
                // Validation guarantees the key; a miss here is inert.
                let Some(codes) = ctx.local_sets.get(key) else {
                    continue;
                };
                if !window_allows(window.as_ref(), record, ctx) {
                    continue;
                }
                let hit = record
                    .codings
                    .iter()
                    .any(|c| codes.contains(&c.system, &c.code));
                if hit {
                    tally.observe(*score, || evidence_for(record, rule));
                }
            }
        }

        tally
    }

    /// Walk one source page by page, up to the configured bound.
    ///
    /// A fetch failure ends the walk with the score derived from the
    /// pages already seen; it never aborts the assessment.
    pub async fn evaluate_source(
        &self,
        rule_set: &RuleSet,
        source: &dyn RecordSource,
        ctx: &EvalContext<'_>,
    ) -> KindScore {
        let kind = source.kind();
        let rules = rule_set.rules_for(kind);
        let mut accumulator = ScoreAccumulator::new(rules.ceiling);
        let mut pages_fetched: u32 = 0;
        let mut records_seen: usize = 0;
        let mut cursor: Option<PageCursor> = None;

        for page_index in 0..rule_set.max_pages {
            let fetched = match &cursor {
                None => source.first_page().await,
                Some(cursor) => source.next_page(cursor).await,
            };
            let page = match fetched {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        "{kind} source failed on page {}: {e}; keeping the score so far",
                        page_index + 1
                    );
                    break;
                }
            };
            pages_fetched += 1;

            for record in &page.records {
                records_seen += 1;
                let tally = self.evaluate_record(rules, record, ctx).await;
                accumulator.absorb(tally);
                if accumulator.has_reached_ceiling() {
                    break;
                }
            }

            if accumulator.has_reached_ceiling() {
                debug!("{kind} ceiling reached after {pages_fetched} pages, ending walk");
                break;
            }
            match page.next {
                Some(next) => {
                    if page_index + 1 == rule_set.max_pages {
                        warn!(
                            "{kind} source still has pages after the {} page bound; \
                             keeping the score so far",
                            rule_set.max_pages
                        );
                    }
                    cursor = Some(next);
                }
                None => break,
            }
        }

        accumulator.into_kind_score(kind, pages_fetched, records_seen)
    }
}

fn evidence_for(record: &ClinicalRecord, rule: &MatchRule) -> ScoreEvidence {
    ScoreEvidence {
        kind: record.kind,
        record_text: record.display_text(),
        rule: rule.describe(),
        points: rule.score(),
        recorded: record.recorded,
    }
}

fn window_allows(
    window: Option<&TemporalFilter>,
    record: &ClinicalRecord,
    ctx: &EvalContext<'_>,
) -> bool {
    match window {
        Some(filter) => filter.matches(record.status, record.recorded, ctx.today),
        None => true,
    }
}

fn in_system(coding: &Coding, system_filter: Option<&str>) -> bool {
    match system_filter {
        Some(system) => coding.system == system,
        None => true,
    }
}
