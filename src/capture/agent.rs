//! Tier 1: agent-driven browser
//!
//! The agent runtime is an external program. It is launched once per
//! attempt from an argv template; these placeholders are substituted:
//!
//! - `{url}` target page
//! - `{output}` screenshot path to write
//! - `{width}` / `{height}` viewport size
//!
//! Exit code 0 plus a non-empty file at `{output}` is a success.

use super::process::run_with_timeout;
use super::{CaptureBackend, CaptureError, CaptureResult, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use std::path::Path;
use std::time::Duration;

pub const AGENT_BACKEND_NAME: &str = "agent_browser";

pub struct AgentBrowserBackend {
    command: Option<Vec<String>>,
    timeout: Duration,
}

impl AgentBrowserBackend {
    pub fn new(command: Option<Vec<String>>, timeout: Duration) -> Self {
        Self {
            command: command.filter(|c| !c.is_empty()),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.command.is_some()
    }

    /// Substitute placeholders in the configured argv
    pub fn render_command(template: &[String], url: &str, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        let width = VIEWPORT_WIDTH.to_string();
        let height = VIEWPORT_HEIGHT.to_string();
        template
            .iter()
            .map(|arg| {
                arg.replace("{url}", url)
                    .replace("{output}", &output)
                    .replace("{width}", &width)
                    .replace("{height}", &height)
            })
            .collect()
    }
}

impl CaptureBackend for AgentBrowserBackend {
    fn name(&self) -> &str {
        AGENT_BACKEND_NAME
    }

    fn capture(&self, url: &str, output: &Path) -> CaptureResult<()> {
        let template = self.command.as_ref().ok_or_else(|| CaptureError::Unavailable {
            backend: AGENT_BACKEND_NAME.to_string(),
            reason: "agent browser command not configured".to_string(),
        })?;

        let cmd = Self::render_command(template, url, output);
        let result = run_with_timeout(&cmd, AGENT_BACKEND_NAME, self.timeout);
        if result.succeeded() {
            Ok(())
        } else {
            Err(CaptureError::Failed(result.failure_reason(AGENT_BACKEND_NAME)))
        }
    }
}
