//! Evaluation context

use chrono::NaiveDate;
use hemorisk_terminology::ServerContext;
use hemorisk_types::CodeSet;
use std::collections::BTreeMap;

/// Shared, read-only context for one assessment.
///
/// Built once per assessment and borrowed by every record evaluation.
/// Temporal windows are anchored to `today` so evaluation is
/// deterministic and testable at a fixed date.
pub struct EvalContext<'a> {
    /// Locally configured named code sets, in membership-test form
    pub local_sets: &'a BTreeMap<String, CodeSet>,
    /// Terminology server to resolve set references against
    pub server: &'a ServerContext,
    /// Anchor date for temporal windows
    pub today: NaiveDate,
}

impl<'a> EvalContext<'a> {
    /// Context anchored to the given date
    pub fn new(
        local_sets: &'a BTreeMap<String, CodeSet>,
        server: &'a ServerContext,
        today: NaiveDate,
    ) -> Self {
        Self {
            local_sets,
            server,
            today,
        }
    }
}
