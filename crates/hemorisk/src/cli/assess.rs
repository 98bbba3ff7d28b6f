//! Assess command implementation

use super::output;
use crate::assessor::{PatientSources, RiskAssessor};
use crate::defaults;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use hemorisk_model::{InMemoryRecordSource, records_from_bundle};
use hemorisk_terminology::ServerContext;
use hemorisk_types::{ClinicalRecord, CompositeRiskResult, PatientInputs, ResourceKind, RuleSet};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

const PAGE_SIZE: usize = 100;

/// Configuration for assess command
pub struct AssessConfig {
    pub rules: Option<PathBuf>,
    pub inputs: Option<PathBuf>,
    pub bundle: Option<PathBuf>,
    pub terminology_url: Option<String>,
    pub terminology_token: Option<String>,
    pub as_of: Option<String>,
    pub verbose: bool,
    pub output_format: Option<String>,
    pub output_file: Option<PathBuf>,
}

/// Run one assessment from JSON inputs
pub async fn assess(config: AssessConfig) -> Result<()> {
    let rule_set = load_rule_set(config.rules.as_ref())?;
    if config.verbose {
        eprintln!(
            "Rule set: {} condition, {} medication, {} procedure rules ({} scoring)",
            rule_set.conditions.rules.len(),
            rule_set.medications.rules.len(),
            rule_set.procedures.rules.len(),
            rule_set.scoring.strategy_name()
        );
    }

    let inputs = load_inputs(config.inputs.as_ref())?;
    let records = load_records(config.bundle.as_ref())?;
    if config.verbose {
        if let Some(records) = &records {
            eprintln!("Loaded {} records from bundle", records.len());
        }
    }

    let server = server_context(
        config.terminology_url.as_deref(),
        config.terminology_token.as_deref(),
    );
    let as_of = config
        .as_of
        .as_deref()
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("Invalid --as-of date: {raw} (expected YYYY-MM-DD)"))
        })
        .transpose()?;

    let assessor = RiskAssessor::new(rule_set).context("Invalid rule set")?;

    // A supplied bundle populates every kind, so a kind with no entries
    // scores zero instead of reading as not-available.
    let result = match records {
        Some(records) => {
            let (conditions, medications, procedures) = partition(records);
            let sources = PatientSources {
                conditions: Some(&conditions),
                medications: Some(&medications),
                procedures: Some(&procedures),
            };
            run(&assessor, &inputs, &sources, &server, as_of).await
        }
        None => run(&assessor, &inputs, &PatientSources::none(), &server, as_of).await,
    };

    let format = output::OutputFormat::from_str(config.output_format.as_deref().unwrap_or("text"));
    output::print_result(&result, &format, config.output_file.as_deref())?;

    if config.verbose {
        eprintln!("{}", output::format_success("Assessment completed"));
    }
    Ok(())
}

async fn run(
    assessor: &RiskAssessor,
    inputs: &PatientInputs,
    sources: &PatientSources<'_>,
    server: &ServerContext,
    as_of: Option<NaiveDate>,
) -> CompositeRiskResult {
    match as_of {
        Some(today) => assessor.assess_at(inputs, sources, server, today).await,
        None => assessor.assess(inputs, sources, server).await,
    }
}

fn load_rule_set(path: Option<&PathBuf>) -> Result<RuleSet> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read rule set: {}", path.display()))?;
            RuleSet::from_json_str(&content)
                .with_context(|| format!("Invalid rule set: {}", path.display()))
        }
        None => Ok(defaults::default_rule_set()),
    }
}

fn load_inputs(path: Option<&PathBuf>) -> Result<PatientInputs> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read patient inputs: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid patient inputs: {}", path.display()))
        }
        None => Ok(PatientInputs::new()),
    }
}

fn load_records(path: Option<&PathBuf>) -> Result<Option<Vec<ClinicalRecord>>> {
    let Some(path) = path else { return Ok(None) };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bundle: {}", path.display()))?;
    let bundle: Value = serde_json::from_str(&content)
        .with_context(|| format!("Bundle is not valid JSON: {}", path.display()))?;
    let records = records_from_bundle(&bundle)
        .with_context(|| format!("Invalid bundle: {}", path.display()))?;
    Ok(Some(records))
}

fn partition(
    records: Vec<ClinicalRecord>,
) -> (
    InMemoryRecordSource,
    InMemoryRecordSource,
    InMemoryRecordSource,
) {
    let mut conditions = Vec::new();
    let mut medications = Vec::new();
    let mut procedures = Vec::new();
    for record in records {
        match record.kind {
            ResourceKind::Condition => conditions.push(record),
            ResourceKind::Medication => medications.push(record),
            ResourceKind::Procedure => procedures.push(record),
        }
    }
    (
        InMemoryRecordSource::new(ResourceKind::Condition, conditions, PAGE_SIZE),
        InMemoryRecordSource::new(ResourceKind::Medication, medications, PAGE_SIZE),
        InMemoryRecordSource::new(ResourceKind::Procedure, procedures, PAGE_SIZE),
    )
}

fn server_context(url: Option<&str>, token: Option<&str>) -> ServerContext {
    match (url, token) {
        (Some(url), Some(token)) => ServerContext::new(url, token),
        (None, None) => ServerContext::none(),
        _ => {
            eprintln!(
                "{}",
                output::format_warning(
                    "terminology server needs both --terminology-url and --terminology-token; \
                     set references will not resolve"
                )
            );
            ServerContext::none()
        }
    }
}
