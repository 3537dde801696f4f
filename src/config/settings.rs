//! Runtime settings for a11yscan
//!
//! Loaded with priority (lowest first):
//! 1. Built-in defaults
//! 2. Config file (`--config`, else ~/.config/a11yscan/config.toml)
//! 3. Environment variables (after dotenv fallback files are loaded)
//! 4. CLI flags, applied by the caller

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::capture::{AgentBrowserBackend, CaptureBackend, CaptureOrchestrator, HeadlessChromeBackend};
use crate::classifier::{Analyzer, ClassifierBackend, ClassifierConfig};
use crate::pipeline::Pipeline;
use crate::retry::RetryPolicy;
use crate::steplog::StepRecorder;

/// Credential files checked when a variable isn't already set
pub const DOTENV_FILES: [&str; 3] = ["./.env.local", "./web/.env.local", "./.env"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub classifier: ClassifierSettings,
    pub capture: CaptureSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub backend: ClassifierBackend,
    /// Defaults per backend when unset
    pub model: Option<String>,
    pub region: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub timeout_secs: u64,
    pub extended_analysis: bool,
    pub web_grounding: bool,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Bedrock,
            model: None,
            region: "us-east-1".to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            max_attempts: 3,
            backoff_base_ms: 1000,
            timeout_secs: 120,
            extended_analysis: true,
            web_grounding: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub screenshot_dir: PathBuf,
    /// Agent browser argv template; `{url}`, `{output}`, `{width}`, `{height}`
    pub agent_command: Option<Vec<String>>,
    pub chrome_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub page_wait_ms: u64,
    pub headless_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            screenshot_dir: PathBuf::from("agent_screenshots"),
            agent_command: None,
            chrome_path: None,
            timeout_secs: 30,
            page_wait_ms: 15_000,
            headless_attempts: 2,
            backoff_base_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub log_dir: PathBuf,
    pub live_report_path: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            live_report_path: PathBuf::from("web/public/live_report.json"),
        }
    }
}

impl Settings {
    /// Load from file and environment.
    ///
    /// A missing file is fine. An unparseable `explicit` file is an error;
    /// an unparseable user config is skipped with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        load_dotenv();

        let mut settings = match explicit {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => match Self::user_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path).unwrap_or_else(|e| {
                    warn!("Ignoring {}: {:#}", path.display(), e);
                    Self::default()
                }),
                None => Self::default(),
            },
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    /// ~/.config/a11yscan/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("a11yscan").join("config.toml"))
    }

    /// Apply environment overrides. `lookup` returns a variable's value.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = get("AWS_REGION") {
            self.classifier.region = region;
        }
        if let Some(backend) = get("A11YSCAN_BACKEND") {
            match backend.parse() {
                Ok(backend) => self.classifier.backend = backend,
                Err(e) => warn!("Ignoring A11YSCAN_BACKEND: {}", e),
            }
        }
        if let Some(model) = get("A11YSCAN_MODEL") {
            self.classifier.model = Some(model);
        }
        if let Some(cmd) = get("A11YSCAN_AGENT_CMD") {
            self.capture.agent_command = Some(cmd.split_whitespace().map(str::to_string).collect());
        }
        if let Some(chrome) = get("A11YSCAN_CHROME") {
            self.capture.chrome_path = Some(PathBuf::from(chrome));
        }
    }

    pub fn to_classifier_config(&self) -> ClassifierConfig {
        let c = &self.classifier;
        ClassifierConfig {
            backend: c.backend,
            model: c.model.clone(),
            region: c.region.clone(),
            max_tokens: c.max_tokens,
            temperature: c.temperature,
            timeout: Duration::from_secs(c.timeout_secs),
            max_attempts: c.max_attempts,
            backoff_base: Duration::from_millis(c.backoff_base_ms),
            extended_analysis: c.extended_analysis,
            web_grounding: c.web_grounding,
        }
    }

    /// Capture tiers in fallback order
    pub fn build_backends(&self) -> Vec<Box<dyn CaptureBackend>> {
        let c = &self.capture;
        let timeout = Duration::from_secs(c.timeout_secs);
        vec![
            Box::new(AgentBrowserBackend::new(c.agent_command.clone(), timeout)),
            Box::new(HeadlessChromeBackend::new(
                c.chrome_path.clone(),
                timeout,
                Duration::from_millis(c.page_wait_ms),
                RetryPolicy::new(c.headless_attempts, Duration::from_millis(c.backoff_base_ms)),
            )),
        ]
    }

    /// Wire up a pipeline that records steps to `log`
    pub fn build_pipeline(&self, log: Arc<dyn StepRecorder>) -> Pipeline {
        let capture = CaptureOrchestrator::new(
            self.build_backends(),
            self.capture.screenshot_dir.clone(),
            log.clone(),
        );
        let analyzer = Analyzer::from_config(self.to_classifier_config(), log.clone());
        Pipeline::new(capture, analyzer, log)
            .with_flags(self.classifier.extended_analysis, self.classifier.web_grounding)
    }
}

/// Load the dotenv fallback files. Already-set variables win.
pub fn load_dotenv() {
    for file in DOTENV_FILES {
        let path = Path::new(file);
        if !path.exists() {
            continue;
        }
        match dotenvy::from_path(path) {
            Ok(()) => debug!("Loaded environment from {}", file),
            Err(e) => warn!("Failed to load {}: {}", file, e),
        }
    }
}
