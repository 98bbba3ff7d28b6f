//! Bleeding-risk command-line interface

use anyhow::Result;
use clap::{Parser, Subcommand};
use hemorisk::cli::{assess, output, validate};
use std::path::PathBuf;

/// Bleeding-risk command-line tool
#[derive(Parser)]
#[command(name = "hemorisk")]
#[command(author, version, about = "Bleeding-risk assessment tools", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, json-pretty, text)
    #[arg(short = 'f', long, global = true)]
    format: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess bleeding risk from JSON inputs
    Assess {
        /// Rule-set JSON file (default: built-in rule set)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Patient inputs JSON file (age, labs, flags)
        #[arg(short, long)]
        inputs: Option<PathBuf>,

        /// Clinical records bundle JSON file
        #[arg(short, long)]
        bundle: Option<PathBuf>,

        /// Terminology server base URL
        #[arg(long)]
        terminology_url: Option<String>,

        /// Terminology server access token
        #[arg(long)]
        terminology_token: Option<String>,

        /// Anchor date for temporal windows (YYYY-MM-DD, default: today)
        #[arg(long, value_name = "DATE")]
        as_of: Option<String>,
    },

    /// Validate rule-set files
    Validate {
        /// Rule-set JSON files to validate
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Set up color output
    output::setup_colors(&cli.color);

    // Degradation warnings stay visible without the verbose flag
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();

    let result: Result<()> = match cli.command {
        Commands::Assess {
            rules,
            inputs,
            bundle,
            terminology_url,
            terminology_token,
            as_of,
        } => {
            let config = assess::AssessConfig {
                rules,
                inputs,
                bundle,
                terminology_url,
                terminology_token,
                as_of,
                verbose: cli.verbose,
                output_format: cli.format.clone(),
                output_file: cli.output.clone(),
            };
            assess::assess(config).await
        }

        Commands::Validate { files } => {
            let config = validate::ValidateConfig {
                files,
                verbose: cli.verbose,
            };
            validate::validate(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
