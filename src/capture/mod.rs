//! Tiered screenshot capture
//!
//! Backends are tried in a fixed order until one produces an artifact:
//!
//! 1. [`AgentBrowserBackend`] - autonomous agent-driven browser
//! 2. [`HeadlessChromeBackend`] - headless Chromium, retried with backoff
//!
//! A backend that is not installed or not configured is just another
//! failed attempt; the loop moves on to the next tier. Only when every
//! tier fails does [`CaptureOrchestrator::capture`] return an error, and
//! that is fatal for the run.

mod agent;
mod headless;
mod process;

pub use agent::AgentBrowserBackend;
pub use headless::{find_chrome, HeadlessChromeBackend, CHROME_CANDIDATES};
pub use process::{is_tool_installed, run_with_timeout, ProcessOutput};

use crate::models::{AttemptStatus, CaptureAttempt};
use crate::retry::RetryPolicy;
use crate::steplog::{Step, StepRecorder};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fixed capture viewport
pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 800;

static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Errors from capture backends
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("{backend} is not available: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("{0}")]
    Failed(String),

    #[error("{backend} produced no screenshot at {path}")]
    MissingArtifact { backend: String, path: PathBuf },

    #[error("unsupported URL '{0}': only http and https are captured")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Full Engine Failure: Could not capture screenshot via any tier.")]
    Exhausted { attempts: Vec<CaptureAttempt> },
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// One capture tier
pub trait CaptureBackend: Send + Sync {
    /// Short name used in logs ("agent_browser", "headless_chrome")
    fn name(&self) -> &str;

    /// How many times this tier is tried before falling through
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::once()
    }

    /// Write a screenshot of `url` to `output`
    fn capture(&self, url: &str, output: &Path) -> CaptureResult<()>;
}

/// A successful capture
#[derive(Debug, Clone)]
pub struct Capture {
    pub path: PathBuf,
    pub backend: String,
}

/// Ordered fallback over capture backends
pub struct CaptureOrchestrator {
    backends: Vec<Box<dyn CaptureBackend>>,
    screenshot_dir: PathBuf,
    log: Arc<dyn StepRecorder>,
}

impl CaptureOrchestrator {
    pub fn new(
        backends: Vec<Box<dyn CaptureBackend>>,
        screenshot_dir: impl Into<PathBuf>,
        log: Arc<dyn StepRecorder>,
    ) -> Self {
        Self {
            backends,
            screenshot_dir: screenshot_dir.into(),
            log,
        }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Artifact path for a new capture: `<dir>/audit_<unix_seconds>_<pid>_<seq>.png`
    ///
    /// Unique per call within a process and across concurrent processes.
    pub fn artifact_path(&self) -> PathBuf {
        let seq = ARTIFACT_SEQ.fetch_add(1, Ordering::Relaxed);
        self.screenshot_dir.join(format!(
            "audit_{}_{}_{}.png",
            Local::now().timestamp(),
            std::process::id(),
            seq
        ))
    }

    /// Try each backend in order; the first success wins.
    pub fn capture(&self, url: &str) -> CaptureResult<Capture> {
        let output = self.artifact_path();
        if let Err(e) = std::fs::create_dir_all(&self.screenshot_dir) {
            warn!(
                "Could not create screenshot dir {}: {}",
                self.screenshot_dir.display(),
                e
            );
        }

        let mut attempts = Vec::new();
        // An unsupported URL gets one failed attempt per tier and no backoff
        let url_ok = validate_url(url).is_ok();

        for backend in &self.backends {
            let name = backend.name().to_string();
            let policy = backend.retry_policy();
            let action = format!("capture_{}", name);
            let tier_attempts = if url_ok { policy.max_attempts } else { 1 };

            for attempt_index in 0..tier_attempts {
                let attempt = attempt_index + 1;
                self.log.record(
                    Step::new(&action, AttemptStatus::Attempting.as_str())
                        .with("url", url)
                        .with("attempt", attempt),
                );
                info!("Capturing {} via {} (attempt {})", url, name, attempt);

                // Leftovers from a failed tier must not count as this tier's artifact
                let _ = std::fs::remove_file(&output);

                let result = if url_ok {
                    backend
                        .capture(url, &output)
                        .and_then(|_| check_artifact(&name, &output))
                } else {
                    Err(CaptureError::InvalidUrl(url.to_string()))
                };

                match result {
                    Ok(()) => {
                        self.log.record(
                            Step::new(&action, AttemptStatus::Success.as_str())
                                .with("attempt", attempt)
                                .with("path", output.to_string_lossy().to_string()),
                        );
                        attempts.push(attempt_record(&name, attempt, AttemptStatus::Success, None));
                        debug!("{} capture attempts before success", attempts.len());
                        return Ok(Capture {
                            path: output,
                            backend: name,
                        });
                    }
                    Err(e) => {
                        let message = e.to_string();
                        warn!("{} attempt {} failed: {}", name, attempt, message);
                        self.log.record(
                            Step::new(&action, AttemptStatus::Failed.as_str())
                                .with("attempt", attempt)
                                .with("error", message.clone()),
                        );
                        attempts.push(attempt_record(
                            &name,
                            attempt,
                            AttemptStatus::Failed,
                            Some(message),
                        ));
                        if url_ok {
                            policy.backoff(attempt_index);
                        }
                    }
                }
            }
        }

        self.log.record(
            Step::new("capture", "exhausted")
                .with("url", url)
                .with("attempts", attempts.len()),
        );
        Err(CaptureError::Exhausted { attempts })
    }
}

fn attempt_record(
    backend: &str,
    attempt: u32,
    status: AttemptStatus,
    error: Option<String>,
) -> CaptureAttempt {
    CaptureAttempt {
        backend: backend.to_string(),
        attempt,
        status,
        error,
        timestamp: Local::now(),
    }
}

/// Only web pages are captured
pub fn validate_url(url: &str) -> CaptureResult<()> {
    let lower = url.trim().to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(CaptureError::InvalidUrl(url.to_string())),
    }
}

/// A backend "succeeded" only if it left a non-empty file behind
fn check_artifact(backend: &str, path: &Path) -> CaptureResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(CaptureError::MissingArtifact {
            backend: backend.to_string(),
            path: path.to_path_buf(),
        }),
    }
}
