// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output harvesting from a finished agent process.

use regex::Regex;
use std::sync::LazyLock;

/// Regex for a pull-request URL on the source provider.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PR_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://github\.com/[^\s"']+/pull/\d+"#).expect("constant regex pattern is valid")
});

/// Scan combined output line-by-line for the first pull-request URL.
pub fn extract_pr_url(combined: &str) -> Option<String> {
    for line in combined.lines() {
        if line.contains("github.com") && line.contains("/pull/") {
            if let Some(m) = PR_URL_PATTERN.find(line) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

/// Retain the last `limit` non-empty, non-prompt output lines.
///
/// Lines starting with `>` are npm/script prompt echoes, not agent
/// output, and are dropped.
pub fn tail_log_lines(combined: &str, limit: usize) -> Vec<String> {
    let meaningful: Vec<&str> = combined
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('>'))
        .collect();
    let skip = meaningful.len().saturating_sub(limit);
    meaningful[skip..].iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
#[path = "harvest_tests.rs"]
mod tests;
