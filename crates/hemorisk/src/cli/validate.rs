//! Validate command implementation

use super::output;
use anyhow::Result;
use colored::Colorize;
use hemorisk_types::RuleSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for validate command
pub struct ValidateConfig {
    pub files: Vec<PathBuf>,
    pub verbose: bool,
}

/// Validation outcome for a single file
struct FileReport {
    file: PathBuf,
    outcome: Result<String, String>,
}

/// Validate rule-set files
pub async fn validate(config: ValidateConfig) -> Result<()> {
    if config.files.is_empty() {
        anyhow::bail!("No files specified for validation");
    }

    let mut reports = Vec::new();
    for file in &config.files {
        if config.verbose {
            eprintln!("Validating: {}", file.display());
        }
        reports.push(FileReport {
            file: file.clone(),
            outcome: validate_file(file),
        });
    }

    let mut failures = 0;
    for report in &reports {
        match &report.outcome {
            Ok(summary) => {
                println!(
                    "{} {} {summary}",
                    "✓".green().bold(),
                    report.file.display().to_string().cyan()
                );
            }
            Err(message) => {
                failures += 1;
                println!(
                    "{} {}",
                    "✗".red().bold(),
                    report.file.display().to_string().cyan()
                );
                println!("  {}: {message}", "error".red().bold());
            }
        }
    }

    println!();
    if failures == 0 {
        println!(
            "{}",
            output::format_success(&format!(
                "All {} file(s) validated successfully",
                config.files.len()
            ))
        );
        Ok(())
    } else {
        eprintln!(
            "{} {failures} of {} file(s) invalid",
            "Validation failed:".red().bold(),
            config.files.len()
        );
        std::process::exit(1);
    }
}

fn validate_file(file: &Path) -> Result<String, String> {
    let content =
        fs::read_to_string(file).map_err(|e| format!("Failed to read file: {e}"))?;
    let rule_set = RuleSet::from_json_str(&content).map_err(|e| e.to_string())?;
    Ok(format!(
        "({} condition, {} medication, {} procedure rules; {} scoring)",
        rule_set.conditions.rules.len(),
        rule_set.medications.rules.len(),
        rule_set.procedures.rules.len(),
        rule_set.scoring.strategy_name()
    ))
}
