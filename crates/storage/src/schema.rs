// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database schema, applied idempotently at open.

/// Composite fields (result, logs, step output, steps) are JSON text
/// columns; `depends_on` lives inside `steps_json`, so there is no
/// normalized edge table. The `schedules` table is reserved for
/// time-based triggers and is not touched by the orchestrator.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    job_id           TEXT PRIMARY KEY,
    pipeline_id      TEXT,
    run_id           TEXT,
    batch_id         TEXT,
    step_name        TEXT,
    step_index       INTEGER,
    status           TEXT NOT NULL DEFAULT 'queued',
    repo_url         TEXT NOT NULL,
    task             TEXT NOT NULL,
    submitted_by     TEXT DEFAULT '',
    submitted_at     TEXT NOT NULL,
    started_at       TEXT,
    completed_at     TEXT,
    result_json      TEXT,
    step_output_json TEXT,
    error            TEXT,
    logs_json        TEXT DEFAULT '[]',
    attempt          INTEGER DEFAULT 1,
    max_attempts     INTEGER DEFAULT 3,
    created_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
CREATE INDEX IF NOT EXISTS idx_jobs_submitted_at ON jobs(submitted_at);
CREATE INDEX IF NOT EXISTS idx_jobs_pipeline_id ON jobs(pipeline_id);
CREATE INDEX IF NOT EXISTS idx_jobs_run_id ON jobs(run_id);
CREATE INDEX IF NOT EXISTS idx_jobs_batch_id ON jobs(batch_id);

CREATE TABLE IF NOT EXISTS pipelines (
    pipeline_id    TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    repo_url       TEXT,
    steps_json     TEXT NOT NULL DEFAULT '[]',
    created_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS pipeline_runs (
    run_id         TEXT PRIMARY KEY,
    pipeline_id    TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'pending',
    repo_url       TEXT,
    started_at     TEXT,
    completed_at   TEXT,
    error          TEXT,
    created_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_pipeline_runs_pipeline_id ON pipeline_runs(pipeline_id);
CREATE INDEX IF NOT EXISTS idx_pipeline_runs_status ON pipeline_runs(status);

CREATE TABLE IF NOT EXISTS schedules (
    schedule_id    TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    cron_expr      TEXT NOT NULL,
    pipeline_id    TEXT,
    repos_json     TEXT DEFAULT '[]',
    task           TEXT,
    enabled        INTEGER DEFAULT 1,
    last_run       TEXT,
    next_run       TEXT,
    created_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
"#;
