//! Clinical record model
//!
//! This module defines the record shape the rule engine consumes: one
//! resource kind per record, one or more codings, optional free text,
//! clinical status and recorded date. Records are owned by the record
//! source for the duration of one evaluation pass and are never mutated
//! by the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;

/// The resource kinds the engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Diagnoses and problem-list entries
    Condition,
    /// Active or historical medication orders/statements
    Medication,
    /// Performed procedures (transfusions etc.)
    Procedure,
}

impl ResourceKind {
    /// Stable lowercase name, used for component keys and log messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Medication => "medication",
            Self::Procedure => "procedure",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Clinical status of a record.
///
/// Unknown wire values map to `Unknown` at parse time; rule configuration
/// referencing a status is validated strictly at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClinicalStatus {
    Active,
    Recurrence,
    Relapse,
    Inactive,
    Remission,
    Resolved,
    Completed,
    Stopped,
    Unknown,
}

impl ClinicalStatus {
    /// Map a wire-format status string onto the closed enum.
    ///
    /// Matching is case-insensitive; anything unrecognized becomes
    /// `Unknown` rather than failing the whole record.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "recurrence" => Self::Recurrence,
            "relapse" => Self::Relapse,
            "inactive" => Self::Inactive,
            "remission" => Self::Remission,
            "resolved" => Self::Resolved,
            "completed" => Self::Completed,
            "stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

/// A (coding-system, code) pair with an optional display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    /// Coding system URI (e.g. `http://snomed.info/sct`)
    pub system: String,
    /// Code value within the system
    pub code: String,
    /// Human-readable display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Create a coding without display text
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display: None,
        }
    }

    /// Attach a display text
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// A resolved set of (system, code) pairs.
///
/// This is the expanded form of a terminology set and the lookup form of a
/// locally configured set; membership tests are exact on both components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSet {
    members: HashSet<(String, String)>,
}

impl CodeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one (system, code) pair
    pub fn insert(&mut self, system: impl Into<String>, code: impl Into<String>) {
        self.members.insert((system.into(), code.into()));
    }

    /// Exact membership test
    pub fn contains(&self, system: &str, code: &str) -> bool {
        self.members
            .contains(&(system.to_string(), code.to_string()))
    }

    /// Number of member pairs
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the set has no members.
    ///
    /// An empty set is still a successfully resolved set; emptiness is
    /// distinct from "unresolvable".
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<(String, String)> for CodeSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a Coding> for CodeSet {
    fn from_iter<I: IntoIterator<Item = &'a Coding>>(iter: I) -> Self {
        Self {
            members: iter
                .into_iter()
                .map(|c| (c.system.clone(), c.code.clone()))
                .collect(),
        }
    }
}

/// One clinical record of a single resource kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    /// Resource kind this record belongs to
    pub kind: ResourceKind,
    /// Source identifier of the record
    pub id: String,
    /// Codings carried by the record (usually one or two)
    #[serde(default)]
    pub codings: SmallVec<[Coding; 2]>,
    /// Free-text display/description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Clinical status, when the source supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClinicalStatus>,
    /// Recorded/onset date, when the source supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded: Option<NaiveDate>,
}

impl ClinicalRecord {
    /// Create a minimal record with no codings
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            codings: SmallVec::new(),
            text: None,
            status: None,
            recorded: None,
        }
    }

    /// Add one coding
    pub fn with_coding(mut self, coding: Coding) -> Self {
        self.codings.push(coding);
        self
    }

    /// Set the free text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the clinical status
    pub fn with_status(mut self, status: ClinicalStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the recorded date
    pub fn with_recorded(mut self, recorded: NaiveDate) -> Self {
        self.recorded = Some(recorded);
        self
    }

    /// Best human-readable description for evidence entries.
    ///
    /// Prefers the free text, falls back to the first coding display, then
    /// to the record identifier.
    pub fn display_text(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        if let Some(display) = self.codings.iter().find_map(|c| c.display.as_deref()) {
            return display.to_string();
        }
        format!("{} {}", self.kind, self.id)
    }

    /// Lower-cased concatenation of coded displays and free text, used by
    /// keyword matching.
    pub fn searchable_text(&self) -> String {
        let mut haystack = String::new();
        for coding in &self.codings {
            if let Some(display) = &coding.display {
                haystack.push_str(display);
                haystack.push(' ');
            }
        }
        if let Some(text) = &self.text {
            haystack.push_str(text);
        }
        haystack.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!(ClinicalStatus::parse("Active"), ClinicalStatus::Active);
        assert_eq!(ClinicalStatus::parse("RESOLVED"), ClinicalStatus::Resolved);
        assert_eq!(ClinicalStatus::parse("bogus"), ClinicalStatus::Unknown);
    }

    #[test]
    fn test_code_set_membership() {
        let mut set = CodeSet::new();
        set.insert("http://loinc.org", "718-7");
        assert!(set.contains("http://loinc.org", "718-7"));
        assert!(!set.contains("http://loinc.org", "999-9"));
        assert!(!set.contains("http://snomed.info/sct", "718-7"));
    }

    #[test]
    fn test_empty_code_set_is_resolved_but_empty() {
        let set = CodeSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(!set.contains("any", "thing"));
    }

    #[test]
    fn test_display_text_fallbacks() {
        let bare = ClinicalRecord::new(ResourceKind::Condition, "c1");
        assert_eq!(bare.display_text(), "condition c1");

        let coded = ClinicalRecord::new(ResourceKind::Condition, "c2").with_coding(
            Coding::new("http://snomed.info/sct", "131148009").with_display("Bleeding"),
        );
        assert_eq!(coded.display_text(), "Bleeding");

        let texted = coded.with_text("GI bleed 2023");
        assert_eq!(texted.display_text(), "GI bleed 2023");
    }

    #[test]
    fn test_searchable_text_lowercases_all_sources() {
        let record = ClinicalRecord::new(ResourceKind::Medication, "m1")
            .with_coding(Coding::new("rx", "11289").with_display("Warfarin Sodium"))
            .with_text("5mg DAILY");
        let haystack = record.searchable_text();
        assert!(haystack.contains("warfarin sodium"));
        assert!(haystack.contains("5mg daily"));
    }
}
