// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::store::testing::open_temp;
use drover_core::{now_iso, RunStatus, RunUpdate};

#[tokio::test]
async fn new_run_starts_pending() {
    let (_dir, store) = open_temp().await;
    let run = store
        .create_run("run1", "p1", Some("https://github.com/o/r"))
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Pending);
    assert!(run.started_at.is_none());
    assert!(run.completed_at.is_none());
    assert!(run.error.is_none());
}

#[tokio::test]
async fn run_transitions_persist() {
    let (_dir, store) = open_temp().await;
    store.create_run("run1", "p1", None).await.unwrap();

    let started = now_iso();
    store
        .update_run(
            "run1",
            RunUpdate::new()
                .status(RunStatus::Running)
                .started_at(started.clone()),
        )
        .await
        .unwrap();
    let finished = store
        .update_run(
            "run1",
            RunUpdate::new()
                .status(RunStatus::Failed)
                .completed_at(now_iso())
                .error("Step 'c' failed: boom"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(finished.status, RunStatus::Failed);
    assert_eq!(finished.started_at, Some(started));
    assert!(finished.completed_at.is_some());
    assert_eq!(finished.error.as_deref(), Some("Step 'c' failed: boom"));
}

#[tokio::test]
async fn update_unknown_run_returns_none() {
    let (_dir, store) = open_temp().await;
    let out = store
        .update_run("missing", RunUpdate::new().status(RunStatus::Running))
        .await
        .unwrap();
    assert!(out.is_none());
}

#[tokio::test]
async fn list_runs_filters_by_pipeline() {
    let (_dir, store) = open_temp().await;
    store.create_run("r1", "p1", None).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    store.create_run("r2", "p1", None).await.unwrap();
    store.create_run("r3", "p2", None).await.unwrap();

    let for_p1 = store.list_runs(Some("p1")).await.unwrap();
    let ids: Vec<&str> = for_p1.iter().map(|r| r.run_id.as_str()).collect();
    assert_eq!(ids, vec!["r2", "r1"]);

    let all = store.list_runs(None).await.unwrap();
    assert_eq!(all.len(), 3);
}
