//! Score accumulation
//!
//! Scores never sum. A record's score is the maximum over its matching
//! rules; a corpus score is the maximum over its records. Evidence is
//! kept only for matches that raised a record's running maximum, so one
//! record justifies its score with at most a handful of entries.

use hemorisk_types::{KindScore, ResourceKind, ScoreEvidence};

/// Running maximum for a single record.
#[derive(Debug)]
pub struct RecordTally {
    ceiling: u32,
    score: u32,
    evidence: Vec<ScoreEvidence>,
}

impl RecordTally {
    /// Tally starting at zero under the given ceiling
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling,
            score: 0,
            evidence: Vec::new(),
        }
    }

    /// Current record score
    pub fn score(&self) -> u32 {
        self.score
    }

    /// True once the per-kind ceiling is reached
    pub fn at_ceiling(&self) -> bool {
        self.score >= self.ceiling
    }

    /// Evidence gathered so far, one entry per raise
    pub fn evidence(&self) -> &[ScoreEvidence] {
        &self.evidence
    }

    /// Record one rule match.
    ///
    /// The evidence entry is built and kept only when the match strictly
    /// raises this record's score.
    pub fn observe(&mut self, points: u32, evidence: impl FnOnce() -> ScoreEvidence) {
        if points > self.score {
            self.score = points;
            self.evidence.push(evidence());
        }
    }
}

/// Running maximum across a corpus of records.
#[derive(Debug)]
pub struct ScoreAccumulator {
    ceiling: u32,
    best: u32,
    evidence: Vec<ScoreEvidence>,
}

impl ScoreAccumulator {
    /// Accumulator starting at zero under the given ceiling
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling,
            best: 0,
            evidence: Vec::new(),
        }
    }

    /// Current corpus score
    pub fn best(&self) -> u32 {
        self.best
    }

    /// True once no further record could raise the score
    pub fn has_reached_ceiling(&self) -> bool {
        self.best >= self.ceiling
    }

    /// Fold one record's tally into the corpus.
    ///
    /// The corpus score is the running maximum; record evidence is kept
    /// regardless, since each entry justified a raise within its record.
    pub fn absorb(&mut self, tally: RecordTally) {
        self.best = self.best.max(tally.score);
        self.evidence.extend(tally.evidence);
    }

    /// Finish the walk into a per-kind score.
    pub fn into_kind_score(
        self,
        kind: ResourceKind,
        pages_fetched: u32,
        records_seen: usize,
    ) -> KindScore {
        KindScore {
            kind,
            score: self.best,
            evidence: self.evidence,
            pages_fetched,
            records_seen,
        }
    }
}
