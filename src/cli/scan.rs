//! `run` and `batch` commands

use anyhow::Result;
use console::style;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::models::Report;
use crate::reporters::{error_block, render_block, write_pretty, BatchProof, LiveReport};
use crate::steplog::{JsonlStepLog, MemoryStepLog, StepRecorder};

fn step_log(settings: &Settings, no_log: bool) -> Arc<dyn StepRecorder> {
    if no_log {
        Arc::new(MemoryStepLog::new())
    } else {
        Arc::new(JsonlStepLog::new(settings.output.log_dir.clone()))
    }
}

/// Print the framed report. Exit code 1 only if it can't be serialized.
fn emit(report: &Report) -> ExitCode {
    match render_block(report) {
        Ok(block) => {
            println!("{}", block);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", error_block(&report.url, &format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

/// Report for a run that never started because settings failed to load
pub fn config_failure(url: &str, test_type: &str, err: &anyhow::Error) -> ExitCode {
    error!("Could not load settings: {:#}", err);
    emit(&Report::failure(
        url,
        test_type,
        format!("Configuration Error: {:#}", err),
    ))
}

pub fn run(
    settings: &Settings,
    url: &str,
    test_type: &str,
    live_report: Option<Option<PathBuf>>,
    no_log: bool,
) -> ExitCode {
    let pipeline = settings.build_pipeline(step_log(settings, no_log));
    let report = pipeline.run(url, test_type);

    if let Some(path) = live_report {
        let path = path.unwrap_or_else(|| settings.output.live_report_path.clone());
        match write_pretty(&LiveReport::from_report(&report), &path) {
            Ok(()) => info!("Live report written to {}", path.display()),
            Err(e) => warn!("Could not write live report: {:#}", e),
        }
    }

    emit(&report)
}

pub fn batch(settings: &Settings, urls: &[String], test_type: &str, output: &Path) -> Result<()> {
    let pipeline = settings.build_pipeline(step_log(settings, false));
    let mut proof = BatchProof::new(
        pipeline.model_id(),
        pipeline.extended_analysis(),
        pipeline.web_grounding(),
    );

    for url in urls {
        eprintln!("\n{} {}", style("Testing").bold(), url);
        let report = pipeline.run(url, test_type);
        match (&report.error, &report.summary) {
            (None, Some(summary)) => eprintln!(
                "  {} Score: {} | Level: {}",
                style("✓").green(),
                summary.overall_score,
                summary.wcag_level
            ),
            (error, _) => eprintln!(
                "  {} Error: {}",
                style("✗").red(),
                error.as_deref().unwrap_or("no summary")
            ),
        }
        proof.record(&report);
    }

    write_pretty(&proof, output)?;
    eprintln!(
        "\n{} {}/{} sites scanned, proof saved to {}",
        style("Done.").bold(),
        proof.success_count(),
        urls.len(),
        output.display()
    );

    println!("{}", render_block(&proof)?);
    Ok(())
}
