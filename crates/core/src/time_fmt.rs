// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting shared across the workspace.

use chrono::{SecondsFormat, Utc};

/// Current time as an ISO-8601 UTC string (`2026-03-01T12:00:00.000001Z`).
///
/// All persisted timestamps use this form; it sorts lexicographically,
/// which the newest-first listing queries rely on.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
