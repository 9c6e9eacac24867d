//! External scan tool boundary.
//!
//! The runner only knows `run(url) -> json or failure`; process spawning,
//! argument lists, and stdout capture live behind this interface.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Failure modes of a single scan tool invocation. These are contained by the
/// runner and never converted into API errors.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to spawn scan tool: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("scan tool timed out after {0:?}")]
    Timeout(Duration),

    #[error("scan tool exited with {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },

    #[error("scan tool produced unparsable output: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

#[async_trait]
pub trait ScanTool: Send + Sync {
    /// Scan the repository at `url` and return the tool's JSON verdict.
    async fn run(&self, url: &str) -> Result<serde_json::Value, ScanError>;
}

/// Adapter around the Hipcheck CLI (`hc`), invoked in structured-output mode.
pub struct HipcheckCli {
    binary: PathBuf,
    timeout: Duration,
}

impl HipcheckCli {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ScanTool for HipcheckCli {
    async fn run(&self, url: &str) -> Result<serde_json::Value, ScanError> {
        let start = Instant::now();
        tracing::debug!(binary = %self.binary.display(), url = %url, "Invoking scan tool");

        let child = Command::new(&self.binary)
            .args(["check", "--target", "repo", "--format", "json", "-v", "quiet"])
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ScanError::Spawn)?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ScanError::Timeout(self.timeout))?
            .map_err(ScanError::Spawn)?;

        if !output.status.success() {
            return Err(ScanError::NonZeroExit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let verdict =
            serde_json::from_slice(&output.stdout).map_err(ScanError::InvalidJson)?;

        tracing::debug!(
            url = %url,
            duration_ms = start.elapsed().as_millis(),
            "Scan tool completed"
        );
        Ok(verdict)
    }
}
