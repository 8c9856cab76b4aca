// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::store::testing::open_temp;
use drover_core::{JobResult, JobStatus, JobUpdate, NewJob};
use serde_json::json;

#[tokio::test]
async fn create_then_get_round_trips() {
    let (_dir, store) = open_temp().await;
    let created = store
        .create_job(NewJob::new("j1", "https://github.com/o/r", "fix the bug").submitted_by("bob"))
        .await
        .unwrap();

    assert_eq!(created.status, JobStatus::Queued);
    assert_eq!(created.attempt, 1);
    assert_eq!(created.max_attempts, 3);
    assert!(created.logs.is_empty());

    let fetched = store.get_job("j1").await.unwrap().unwrap();
    assert_eq!(fetched.repo_url, "https://github.com/o/r");
    assert_eq!(fetched.task, "fix the bug");
    assert_eq!(fetched.submitted_by, "bob");
    assert_eq!(fetched.submitted_at, created.submitted_at);
}

#[tokio::test]
async fn get_unknown_job_returns_none() {
    let (_dir, store) = open_temp().await;
    assert!(store.get_job("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn update_rewrites_only_named_fields() {
    let (_dir, store) = open_temp().await;
    store
        .create_job(NewJob::new("j1", "r", "t"))
        .await
        .unwrap();

    let updated = store
        .update_job(
            "j1",
            JobUpdate::new()
                .status(JobStatus::Running)
                .started_at("2026-01-01T00:00:00Z"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.status, JobStatus::Running);
    assert_eq!(updated.started_at.as_deref(), Some("2026-01-01T00:00:00Z"));
    // Untouched fields survive
    assert_eq!(updated.task, "t");
    assert!(updated.completed_at.is_none());
    assert!(updated.error.is_none());
}

#[tokio::test]
async fn update_every_persisted_key_reads_back() {
    let (_dir, store) = open_temp().await;
    store
        .create_job(NewJob::new("j1", "r", "t"))
        .await
        .unwrap();

    let result = JobResult {
        pr_url: Some("https://github.com/o/r/pull/9".into()),
        exit_code: Some(0),
        summary: Some("done".into()),
        ..JobResult::default()
    };
    let updated = store
        .update_job(
            "j1",
            JobUpdate::new()
                .status(JobStatus::Completed)
                .completed_at("2026-01-02T00:00:00Z")
                .result(result.clone())
                .step_output(json!({"key": "v1"}))
                .error("boom")
                .logs(vec!["one".into(), "two".into()])
                .attempt(2),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.result, Some(result));
    assert_eq!(updated.step_output, Some(json!({"key": "v1"})));
    assert_eq!(updated.error.as_deref(), Some("boom"));
    assert_eq!(updated.logs, vec!["one".to_string(), "two".to_string()]);
    assert_eq!(updated.attempt, 2);
    assert_eq!(updated.completed_at.as_deref(), Some("2026-01-02T00:00:00Z"));
}

#[tokio::test]
async fn update_unknown_job_returns_none() {
    let (_dir, store) = open_temp().await;
    let out = store
        .update_job("missing", JobUpdate::new().status(JobStatus::Running))
        .await
        .unwrap();
    assert!(out.is_none());
}

#[tokio::test]
async fn update_refreshes_updated_at() {
    let (_dir, store) = open_temp().await;
    let created = store.create_job(NewJob::new("j1", "r", "t")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let updated = store
        .update_job("j1", JobUpdate::new().status(JobStatus::Running))
        .await
        .unwrap()
        .unwrap();
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn terminal_update_with_identical_fields_is_idempotent() {
    let (_dir, store) = open_temp().await;
    store.create_job(NewJob::new("j1", "r", "t")).await.unwrap();

    let terminal = || {
        JobUpdate::new()
            .status(JobStatus::Failed)
            .completed_at("2026-01-02T00:00:00Z")
            .error("All 3 attempts failed. Last error: boom")
    };
    let first = store.update_job("j1", terminal()).await.unwrap().unwrap();
    let second = store.update_job("j1", terminal()).await.unwrap().unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.completed_at, second.completed_at);
    assert_eq!(first.error, second.error);
    assert_eq!(first.logs, second.logs);
    assert_eq!(first.attempt, second.attempt);
}

#[tokio::test]
async fn logs_extend_previous_sequence() {
    let (_dir, store) = open_temp().await;
    store.create_job(NewJob::new("j1", "r", "t")).await.unwrap();

    let mut logs = vec!["Authenticating with GitHub...".to_string()];
    store
        .update_job("j1", JobUpdate::new().logs(logs.clone()))
        .await
        .unwrap();
    logs.push("Preparing workspace...".to_string());
    let updated = store
        .update_job("j1", JobUpdate::new().logs(logs.clone()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.logs, logs);
    assert!(updated.logs.len() >= 2);
}

#[tokio::test]
async fn list_jobs_newest_first_with_pagination() {
    let (_dir, store) = open_temp().await;
    for i in 0..3 {
        store
            .create_job(NewJob::new(format!("j{i}"), "r", "t"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    }

    let all = store.list_jobs(100, 0).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|j| j.job_id.as_str()).collect();
    assert_eq!(ids, vec!["j2", "j1", "j0"]);

    let page = store.list_jobs(1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].job_id, "j1");
}

#[tokio::test]
async fn jobs_for_run_ordered_by_step_index() {
    let (_dir, store) = open_temp().await;
    for (id, step, index) in [("jb", "b", 1), ("ja", "a", 0), ("jc", "c", 2)] {
        store
            .create_job(NewJob::new(id, "r", "t").for_step("p1", "run1", step, index))
            .await
            .unwrap();
    }
    store
        .create_job(NewJob::new("other", "r", "t").for_step("p1", "run2", "a", 0))
        .await
        .unwrap();

    let jobs = store.jobs_for_run("run1").await.unwrap();
    let steps: Vec<&str> = jobs.iter().filter_map(|j| j.step_name.as_deref()).collect();
    assert_eq!(steps, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn cleanup_removes_only_old_terminal_jobs() {
    let (_dir, store) = open_temp().await;
    store.create_job(NewJob::new("old", "r", "t")).await.unwrap();
    store
        .update_job(
            "old",
            JobUpdate::new()
                .status(JobStatus::Completed)
                .completed_at("2020-01-01T00:00:00Z"),
        )
        .await
        .unwrap();
    store.create_job(NewJob::new("fresh", "r", "t")).await.unwrap();
    store
        .update_job(
            "fresh",
            JobUpdate::new()
                .status(JobStatus::Failed)
                .completed_at(drover_core::now_iso()),
        )
        .await
        .unwrap();
    store.create_job(NewJob::new("live", "r", "t")).await.unwrap();

    let deleted = store.cleanup_old_jobs(30).await.unwrap();
    assert_eq!(deleted, 1);
    assert!(store.get_job("old").await.unwrap().is_none());
    assert!(store.get_job("fresh").await.unwrap().is_some());
    assert!(store.get_job("live").await.unwrap().is_some());
}
