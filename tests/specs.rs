// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios through the real router, engines, and store,
//! with a scripted agent and a recording dispatcher.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use drover_adapters::{FakeAgent, FakeDispatcher};
use drover_core::{JobStatus, RunStatus};
use drover_engine::{EngineDeps, JobEngine, PipelineEngine, RetryPolicy};
use drover_server::{router, AppState, ServerConfig};
use drover_storage::{CountingFence, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct World {
    _dir: tempfile::TempDir,
    state: AppState,
    agent: Arc<FakeAgent>,
    dispatcher: Arc<FakeDispatcher>,
    fence: Arc<CountingFence>,
}

async fn world() -> World {
    let dir = tempfile::tempdir().unwrap();
    let fence = Arc::new(CountingFence::default());
    let store = Store::open(dir.path().join("drover.db"), fence.clone())
        .await
        .unwrap();
    let agent = Arc::new(FakeAgent::new());
    let dispatcher = Arc::new(FakeDispatcher::new());
    let deps = EngineDeps {
        store: store.clone(),
        agent: agent.clone(),
        dispatcher: dispatcher.clone(),
    };
    let jobs = JobEngine::new(deps).with_policy(RetryPolicy {
        max_attempts: 3,
        backoff_base: Duration::from_millis(2),
    });
    let config = ServerConfig {
        api_key: None,
        github_token: "fallback-token".to_string(),
        db_path: dir.path().join("drover.db"),
        workspace_root: dir.path().join("workspaces"),
        bind_addr: "127.0.0.1:0".to_string(),
        agent_command: "true".to_string(),
        agent_setup_command: None,
        agent_timeout: Duration::from_secs(5),
        ws_poll: Duration::from_millis(10),
    };
    let pipelines = PipelineEngine::new(jobs.clone(), &config.workspace_root);
    let state = AppState {
        store,
        jobs,
        pipelines,
        config: Arc::new(config),
    };
    World {
        _dir: dir,
        state,
        agent,
        dispatcher,
        fence,
    }
}

async fn call(state: &AppState, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn await_job(state: &AppState, job_id: &str) -> drover_core::Job {
    for _ in 0..500 {
        if let Some(job) = state.store.get_job(job_id).await.unwrap() {
            if job.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}

async fn await_run(state: &AppState, run_id: &str) -> drover_core::PipelineRun {
    for _ in 0..500 {
        if let Some(run) = state.store.get_run(run_id).await.unwrap() {
            if run.is_terminal() {
                return run;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("run {run_id} never reached a terminal state");
}

#[tokio::test]
async fn single_job_happy_path() {
    let w = world().await;
    let (status, body) = call(
        &w.state,
        Method::POST,
        "/submit",
        Some(json!({"repo_url": "https://github.com/o/r", "task": "t"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "queued");
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let job = await_job(&w.state, &job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.attempt, 1);
    assert!(!job.logs.is_empty());
    assert_eq!(job.logs.last().unwrap(), "agent: task complete");

    // Engine committed its state boundaries through the fence
    assert!(w.fence.commits() >= 2);
    assert!(w.fence.reloads() >= 1);

    let (status, result) = call(&w.state, Method::GET, &format!("/result/{job_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["status"], "completed");
    assert_eq!(result["attempt"], 1);
}

#[tokio::test]
async fn retry_then_succeed_on_third_attempt() {
    let w = world().await;
    w.agent.push_failure("transient one");
    w.agent.push_failure("transient two");
    w.agent.push_success(json!({"exit_code": 0}));

    let (_, body) = call(
        &w.state,
        Method::POST,
        "/submit",
        Some(json!({"repo_url": "r", "task": "t"})),
    )
    .await;
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let job = await_job(&w.state, &job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.attempt, 3);
    assert_eq!(w.agent.calls().len(), 3);
}

#[tokio::test]
async fn all_attempts_fail_with_aggregate_error() {
    let w = world().await;
    for _ in 0..3 {
        w.agent.push_failure("agent crashed");
    }

    let (_, body) = call(
        &w.state,
        Method::POST,
        "/submit",
        Some(json!({"repo_url": "r", "task": "t"})),
    )
    .await;
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let job = await_job(&w.state, &job_id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.attempt, 3);
    let error = job.error.unwrap();
    assert!(
        error.starts_with("All 3 attempts failed. Last error: "),
        "got: {error}"
    );
    assert!(error.contains("agent crashed"));
}

#[tokio::test]
async fn pipeline_layers_outputs_and_stop_policy() {
    let w = world().await;
    // A → B, A → C, B+C → D
    let pipeline = json!({
        "name": "diamond",
        "repo_url": "https://github.com/o/r",
        "steps": [
            {"name": "A", "task": "plan"},
            {"name": "B", "task": "build one", "depends_on": ["A"]},
            {"name": "C", "task": "build two", "depends_on": ["A"]},
            {"name": "D", "task": "merge {{steps.B.output.key}}", "depends_on": ["B", "C"]},
        ],
    });
    let (_, created) = call(&w.state, Method::POST, "/pipelines", Some(pipeline)).await;
    let pipeline_id = created["pipeline_id"].as_str().unwrap().to_string();

    // First run: everything succeeds, B's output reaches D's template.
    w.agent.push_success(json!({}));
    w.agent.push_success(json!({"key": "v1"}));
    w.agent.push_success(json!({}));
    w.agent.push_success(json!({}));

    let (_, body) = call(
        &w.state,
        Method::POST,
        &format!("/pipelines/{pipeline_id}/run"),
        Some(json!({})),
    )
    .await;
    let run_id = body["run_id"].as_str().unwrap().to_string();
    let run = await_run(&w.state, &run_id).await;
    assert_eq!(run.status, RunStatus::Completed);

    let calls = w.agent.calls();
    assert_eq!(calls[3].task, "merge v1");

    // Second run: C fails with the default stop policy; D is skipped.
    w.agent.push_success(json!({}));
    w.agent.push_success(json!({"key": "v1"}));
    for _ in 0..3 {
        w.agent.push_failure("compile error"); // C, all attempts
    }

    let (_, body) = call(
        &w.state,
        Method::POST,
        &format!("/pipelines/{pipeline_id}/run"),
        Some(json!({})),
    )
    .await;
    let run_id = body["run_id"].as_str().unwrap().to_string();
    let run = await_run(&w.state, &run_id).await;
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.unwrap().starts_with("Step 'C' failed: "));

    let jobs = w.state.store.jobs_for_run(&run_id).await.unwrap();
    let by_step = |name: &str| {
        jobs.iter()
            .find(|j| j.step_name.as_deref() == Some(name))
            .unwrap()
    };
    assert_eq!(by_step("C").status, JobStatus::Failed);
    assert_eq!(by_step("D").status, JobStatus::Failed);
    assert_eq!(
        by_step("D").error.as_deref(),
        Some("Skipped: upstream step failed")
    );

    // Shared workspace: first step cloned, the rest reused the tree.
    let prepares: Vec<bool> = w
        .dispatcher
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            drover_adapters::DispatchCall::Prepare { skip_clone, .. } => Some(skip_clone),
            _ => None,
        })
        .collect();
    assert!(!prepares.is_empty());
    assert!(!prepares[0]);
}

#[tokio::test]
async fn dag_validation_rejected_at_admission() {
    let w = world().await;
    let (status, body) = call(
        &w.state,
        Method::POST,
        "/pipelines",
        Some(json!({
            "name": "broken",
            "steps": [
                {"name": "a", "task": "x"},
                {"name": "b", "task": "y", "depends_on": ["a", "c"]},
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unknown step 'c'"));
}
