// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Default timeout for git clone / fetch operations.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default timeout for provider auth and config commands.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from subprocess execution.
#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{description} failed: {source}")]
    Io {
        description: String,
        source: std::io::Error,
    },
    #[error("{description} timed out after {}s", timeout.as_secs())]
    Timeout {
        description: String,
        timeout: Duration,
    },
    #[error("{description} exited with {code}: {stderr}")]
    Status {
        description: String,
        code: i32,
        stderr: String,
    },
}

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`. The child
/// process is killed automatically if the timeout elapses (via the
/// tokio `Child` drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, SubprocessError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(SubprocessError::Io {
            description: description.to_string(),
            source: io_err,
        }),
        Err(_elapsed) => Err(SubprocessError::Timeout {
            description: description.to_string(),
            timeout,
        }),
    }
}

/// Turn a non-zero exit into a [`SubprocessError::Status`] carrying the
/// trailing stderr.
pub fn ensure_success(output: &Output, description: &str) -> Result<(), SubprocessError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(SubprocessError::Status {
        description: description.to_string(),
        code: output.status.code().unwrap_or(-1),
        stderr: stderr.trim().chars().take(300).collect(),
    })
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
