//! Subprocess execution for capture tiers
//!
//! Both capture tiers drive an external program (an agent-driven browser
//! or a headless browser engine) in its own process:
//! 1. Spawn with `std::process::Command`, stdout/stderr piped
//! 2. Poll for completion, killing the child once the timeout elapses
//! 3. Hand back a [`ProcessOutput`] the tier turns into success or failure

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result from running a capture tool
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Whether the process ran to completion (exit code may still be non-zero)
    pub completed: bool,
    pub stdout: String,
    pub stderr: String,
    pub return_code: Option<i32>,
    pub timed_out: bool,
    /// Error message if the process could not run or finish
    pub error: Option<String>,
}

impl ProcessOutput {
    pub fn completed(stdout: String, stderr: String, return_code: i32) -> Self {
        Self {
            completed: true,
            stdout,
            stderr,
            return_code: Some(return_code),
            timed_out: false,
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            completed: false,
            stdout: String::new(),
            stderr: String::new(),
            return_code: None,
            timed_out: false,
            error: Some(error),
        }
    }

    pub fn timeout(tool_name: &str, timeout: Duration) -> Self {
        Self {
            completed: false,
            stdout: String::new(),
            stderr: String::new(),
            return_code: None,
            timed_out: true,
            error: Some(format!("{} timed out after {}s", tool_name, timeout.as_secs())),
        }
    }

    /// Completed with exit code 0
    pub fn succeeded(&self) -> bool {
        self.completed && self.return_code == Some(0)
    }

    /// Human-readable reason this run is not a success
    pub fn failure_reason(&self, tool_name: &str) -> String {
        if let Some(err) = &self.error {
            return err.clone();
        }
        let tail = stderr_tail(&self.stderr, 300);
        match self.return_code {
            Some(code) if tail.is_empty() => format!("{} exited with code {}", tool_name, code),
            Some(code) => format!("{} exited with code {}: {}", tool_name, code, tail),
            None => format!("{} was terminated by a signal", tool_name),
        }
    }
}

/// Last `max_chars` characters of stderr, trimmed
fn stderr_tail(stderr: &str, max_chars: usize) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - max_chars).collect()
}

/// Run a program with a hard timeout.
///
/// # Arguments
/// * `cmd` - Program and arguments
/// * `tool_name` - Human-readable name for error messages
/// * `timeout` - Kill the child after this long (zero = wait forever)
pub fn run_with_timeout(cmd: &[String], tool_name: &str, timeout: Duration) -> ProcessOutput {
    let Some((program, args)) = cmd.split_first() else {
        return ProcessOutput::failure("Empty command".to_string());
    };

    debug!("Running {}: {} {:?}", tool_name, program, args);

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ProcessOutput::failure(format!("{} not found ({})", tool_name, program));
        }
        Err(e) => return ProcessOutput::failure(format!("Failed to run {}: {}", tool_name, e)),
    };

    // Drain pipes on their own threads so a chatty child can't block on a full pipe
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    match wait_with_timeout(&mut child, tool_name, timeout) {
        Ok(Some(code)) => ProcessOutput::completed(join(stdout), join(stderr), code),
        // Grandchildren may still hold the pipes open; leave the drain threads detached
        Ok(None) => ProcessOutput::timeout(tool_name, timeout),
        Err(e) => ProcessOutput::failure(e),
    }
}

/// `Ok(Some(code))` on exit, `Ok(None)` on timeout (child killed)
fn wait_with_timeout(
    child: &mut Child,
    tool_name: &str,
    timeout: Duration,
) -> Result<Option<i32>, String> {
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status.code().unwrap_or(-1))),
            Ok(None) => {
                if !timeout.is_zero() && start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!("{} timed out after {}s", tool_name, timeout.as_secs());
                    return Ok(None);
                }
                thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(format!("Failed to wait for {}: {}", tool_name, e)),
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut p| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).to_string()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Check if a program answers `--version`
pub fn is_tool_installed(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
