//! Doctor command - check environment

use anyhow::Result;
use console::style;
use std::path::Path;
use std::time::Duration;

use crate::capture::{find_chrome, AgentBrowserBackend};
use crate::config::Settings;

pub fn run(config: Option<&Path>) -> Result<()> {
    println!("{}\n", style("a11yscan doctor").bold());

    let settings = Settings::load(config)?;
    let ok = style("✓").green();
    let missing = style("○").yellow();

    // Config file
    match config.map(Path::to_path_buf).or_else(Settings::user_config_path) {
        Some(path) if path.exists() => println!("{} Config: {}", ok, path.display()),
        Some(path) => println!("{} Config: {} (not found, using defaults)", missing, path.display()),
        None => println!("{} Config: no config directory", missing),
    }

    // Classifier credential (BYOK)
    let classifier = settings.to_classifier_config();
    let key = classifier.backend.env_key();
    let has_key = std::env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false);
    if has_key {
        println!(
            "{} Classifier: {} / {} ({} set)",
            ok,
            classifier.backend,
            classifier.model(),
            key
        );
    } else {
        println!("{} Classifier: {} not configured", missing, key);
        println!("  Scans will capture screenshots but report zero issues");
    }

    // Capture tiers
    let mut tiers = 0;
    let agent = AgentBrowserBackend::new(
        settings.capture.agent_command.clone(),
        Duration::from_secs(settings.capture.timeout_secs),
    );
    if agent.is_configured() {
        tiers += 1;
        let command = settings.capture.agent_command.as_deref().unwrap_or_default();
        println!("{} Agent browser: {}", ok, command.join(" "));
    } else {
        println!("{} Agent browser: not configured (set A11YSCAN_AGENT_CMD)", missing);
    }
    match settings.capture.chrome_path.clone().or_else(find_chrome) {
        Some(chrome) => {
            tiers += 1;
            println!("{} Headless Chrome: {}", ok, chrome.display());
        }
        None => println!("{} Headless Chrome: not found (set A11YSCAN_CHROME)", missing),
    }

    println!(
        "{} Step log: {}",
        ok,
        settings.output.log_dir.display()
    );

    if tiers == 0 {
        println!("\n{} No capture tier available; every scan will fail", style("✗").red());
    } else {
        println!("\n{} {} capture tier(s) available", style("✅").green(), tiers);
    }
    Ok(())
}
