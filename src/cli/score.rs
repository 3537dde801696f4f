//! `score` command - offline scoring of an issues file

use anyhow::{Context, Result};
use std::path::Path;

use crate::classifier::parse_analysis;
use crate::reporters::render_block;
use crate::scoring;

pub fn run(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read issues file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse issues file {}", path.display()))?;

    let parsed = parse_analysis(value);
    if parsed.skipped > 0 {
        tracing::warn!("Skipped {} malformed issue entries", parsed.skipped);
    }

    let summary = scoring::score(&parsed.issues);
    println!("{}", render_block(&summary)?);
    Ok(())
}
