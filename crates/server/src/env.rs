// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server.

use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Shared secret; `None` disables auth checks (development mode).
    pub api_key: Option<String>,
    /// Fallback provider token when a submission carries none.
    pub github_token: String,
    pub db_path: PathBuf,
    /// Root under which each run (and standalone job) gets a workspace
    /// subdirectory.
    pub workspace_root: PathBuf,
    pub bind_addr: String,
    pub agent_command: String,
    /// Optional post-clone dependency install command.
    pub agent_setup_command: Option<String>,
    pub agent_timeout: Duration,
    /// Subscription poll period.
    pub ws_poll: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty_var("API_KEY"),
            github_token: std::env::var("GITHUB_TOKEN").unwrap_or_default(),
            db_path: var_or("DROVER_DB", "/data/agent.db").into(),
            workspace_root: var_or("DROVER_WORKSPACE_ROOT", "/data/workspaces").into(),
            bind_addr: var_or("DROVER_BIND", "0.0.0.0:8000"),
            agent_command: var_or("AGENT_COMMAND", "npm run dev"),
            agent_setup_command: non_empty_var("AGENT_SETUP_COMMAND"),
            agent_timeout: Duration::from_secs(parse_var("AGENT_TIMEOUT_SECS").unwrap_or(3000)),
            ws_poll: Duration::from_millis(parse_var("DROVER_WS_POLL_MS").unwrap_or(2000)),
        }
    }
}

fn var_or(var: &str, default: &str) -> String {
    std::env::var(var).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn non_empty_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn parse_var(var: &str) -> Option<u64> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
