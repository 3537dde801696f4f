//! Tier 2: headless Chromium screenshot

use super::process::{is_tool_installed, run_with_timeout};
use super::{CaptureBackend, CaptureError, CaptureResult, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::retry::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const HEADLESS_BACKEND_NAME: &str = "headless_chrome";

/// Binaries probed on PATH, in order
pub const CHROME_CANDIDATES: [&str; 5] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "headless_shell",
];

/// First Chromium-family binary that answers `--version`
pub fn find_chrome() -> Option<PathBuf> {
    CHROME_CANDIDATES
        .iter()
        .find(|c| is_tool_installed(c))
        .map(PathBuf::from)
}

pub struct HeadlessChromeBackend {
    chrome_path: Option<PathBuf>,
    timeout: Duration,
    page_wait: Duration,
    retry: RetryPolicy,
}

impl HeadlessChromeBackend {
    pub fn new(chrome_path: Option<PathBuf>, timeout: Duration, page_wait: Duration, retry: RetryPolicy) -> Self {
        Self {
            chrome_path,
            timeout,
            page_wait,
            retry,
        }
    }

    fn resolve_binary(&self) -> CaptureResult<PathBuf> {
        if let Some(path) = &self.chrome_path {
            return Ok(path.clone());
        }
        find_chrome().ok_or_else(|| CaptureError::Unavailable {
            backend: HEADLESS_BACKEND_NAME.to_string(),
            reason: format!("no Chromium binary found (tried {})", CHROME_CANDIDATES.join(", ")),
        })
    }

    /// Full argv for one screenshot
    pub fn build_command(&self, binary: &Path, url: &str, output: &Path) -> Vec<String> {
        vec![
            binary.to_string_lossy().to_string(),
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--hide-scrollbars".to_string(),
            "--no-first-run".to_string(),
            "--ignore-certificate-errors".to_string(),
            format!("--window-size={},{}", VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            format!("--virtual-time-budget={}", self.page_wait.as_millis()),
            format!("--screenshot={}", output.to_string_lossy()),
            url.to_string(),
        ]
    }
}

impl CaptureBackend for HeadlessChromeBackend {
    fn name(&self) -> &str {
        HEADLESS_BACKEND_NAME
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn capture(&self, url: &str, output: &Path) -> CaptureResult<()> {
        let binary = self.resolve_binary()?;
        debug!("Using {} for headless capture", binary.display());

        let cmd = self.build_command(&binary, url, output);
        let result = run_with_timeout(&cmd, HEADLESS_BACKEND_NAME, self.timeout);
        if result.succeeded() {
            Ok(())
        } else {
            Err(CaptureError::Failed(result.failure_reason(HEADLESS_BACKEND_NAME)))
        }
    }
}
