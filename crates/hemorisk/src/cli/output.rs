//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use hemorisk_types::{ComponentScore, CompositeRiskResult, RiskCategory};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Output format options
#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    Text,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "json-pretty" | "pretty" => Self::JsonPretty,
            _ => Self::Text, // default
        }
    }
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => {
            // Auto-detect based on terminal
            if atty::is(atty::Stream::Stdout) {
                colored::control::set_override(true);
            } else {
                colored::control::set_override(false);
            }
        }
    }
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {error:#}", "Error:".red().bold())
}

/// Format a warning for display
pub fn format_warning(warning: &str) -> String {
    format!("{} {warning}", "Warning:".yellow().bold())
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {message}", "Success:".green().bold())
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!(
            "{}",
            format_success(&format!("Output written to {}", path.display()))
        );
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format JSON value for output
pub fn format_json(value: &Value, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    } else {
        serde_json::to_string(value).context("Failed to serialize JSON")
    }
}

fn category_label(category: RiskCategory) -> String {
    match category {
        RiskCategory::Low => "low".green().bold().to_string(),
        RiskCategory::Moderate => "moderate".yellow().bold().to_string(),
        RiskCategory::High => "high".red().bold().to_string(),
    }
}

fn component_label(score: &ComponentScore) -> String {
    match score {
        ComponentScore::Points(p) => format!("{p:.1}"),
        ComponentScore::HazardRatio(r) => format!("HR {r:.2}"),
        ComponentScore::NotApplied => "not applied".dimmed().to_string(),
        ComponentScore::NotAvailable => "not available".yellow().to_string(),
    }
}

/// Render an assessment result as human-readable text.
pub fn render_result(result: &CompositeRiskResult) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Risk: {} ({})",
        result.total,
        category_label(result.category)
    ));
    lines.push(String::new());
    lines.push("Components:".to_string());
    for (name, score) in &result.components {
        lines.push(format!("  {name:<20} {}", component_label(score)));
    }
    if !result.evidence.is_empty() {
        lines.push(String::new());
        lines.push("Evidence:".to_string());
        for entry in &result.evidence {
            let date = entry
                .recorded
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            lines.push(format!(
                "  +{} {}: {}{date} [{}]",
                entry.points, entry.kind, entry.record_text, entry.rule
            ));
        }
    }
    lines.join("\n")
}

/// Print an assessment result in the specified format
pub fn print_result(
    result: &CompositeRiskResult,
    format: &OutputFormat,
    output_file: Option<&Path>,
) -> Result<()> {
    let content = match format {
        OutputFormat::Json => {
            let value = serde_json::to_value(result).context("Failed to serialize result")?;
            format_json(&value, false)?
        }
        OutputFormat::JsonPretty => {
            let value = serde_json::to_value(result).context("Failed to serialize result")?;
            format_json(&value, true)?
        }
        OutputFormat::Text => render_result(result),
    };
    write_output(&content, output_file)
}

// Add this to check if we're in a TTY
mod atty {
    pub enum Stream {
        Stdout,
    }

    pub fn is(_stream: Stream) -> bool {
        std::env::var("TERM").is_ok()
    }
}
