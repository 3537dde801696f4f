//! CLI command definitions and handlers

mod doctor;
mod scan;
mod score;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::Settings;
use crate::pipeline::DEFAULT_TEST_TYPE;

/// a11yscan - screenshot-based WCAG accessibility scanner
#[derive(Parser, Debug)]
#[command(name = "a11yscan")]
#[command(
    version,
    about = "Screenshot-based WCAG 2.1 accessibility scanner",
    long_about = "a11yscan captures a screenshot of a web page, asks a vision model \
to find WCAG 2.1 AA issues in it, and scores the result per WCAG principle.\n\n\
The report is printed as JSON between ---JSON_START--- and ---JSON_END--- \
marker lines so other programs can scrape it.",
    after_help = "\
Examples:
  a11yscan run --url https://example.com             Scan one page
  a11yscan run --url https://example.com --live-report
  a11yscan batch --url https://a.org --url https://b.org
  a11yscan score --issues issues.json                Score an issues file offline
  a11yscan doctor                                    Check credentials and browsers"
)]
pub struct Cli {
    /// Config file (default: ~/.config/a11yscan/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan one URL and print the report
    Run {
        /// Page to scan
        #[arg(long)]
        url: String,

        /// Label recorded in the report
        #[arg(long = "type", default_value = DEFAULT_TEST_TYPE)]
        test_type: String,

        /// Also write the front-end live report (optionally to PATH)
        #[arg(long, num_args = 0..=1, value_name = "PATH")]
        live_report: Option<Option<PathBuf>>,

        /// Keep the step log in memory instead of writing logs/
        #[arg(long)]
        no_log: bool,
    },

    /// Scan several URLs and write a proof document
    Batch {
        /// Pages to scan, in order
        #[arg(long = "url", required = true)]
        urls: Vec<String>,

        /// Proof document path
        #[arg(long, short = 'o', default_value = "submission_proof.json")]
        output: PathBuf,

        /// Label recorded in each report
        #[arg(long = "type", default_value = DEFAULT_TEST_TYPE)]
        test_type: String,
    },

    /// Score a JSON issues file without capturing anything
    Score {
        /// Array of issues, or an object with an "issues" array
        #[arg(long)]
        issues: PathBuf,
    },

    /// Check credentials, browsers and config
    Doctor,
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Run {
            url,
            test_type,
            live_report,
            no_log,
        } => {
            match Settings::load(cli.config.as_deref()) {
                Ok(settings) => Ok(scan::run(&settings, &url, &test_type, live_report, no_log)),
                Err(e) => Ok(scan::config_failure(&url, &test_type, &e)),
            }
        }

        Commands::Batch {
            urls,
            output,
            test_type,
        } => {
            let settings = Settings::load(cli.config.as_deref())?;
            scan::batch(&settings, &urls, &test_type, &output)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Score { issues } => {
            score::run(&issues)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Doctor => {
            doctor::run(cli.config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
