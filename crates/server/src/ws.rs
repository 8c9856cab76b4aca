// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket subscription: multicasts job state and log deltas.

use crate::api::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use drover_core::{Job, JobStatus};
use serde_json::{json, Value};

/// Upgrade the socket and stream updates for one job.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| stream_job(state, job_id, socket))
}

/// Poll the store and push a frame whenever status or log length moved.
///
/// Terminal status sends one final update, a `done` frame, and closes.
/// A missing record sends an error frame and closes. Client disconnect
/// ends the loop silently.
async fn stream_job(state: AppState, job_id: String, mut socket: WebSocket) {
    let mut last_status: Option<JobStatus> = None;
    let mut sent_logs = 0usize;

    loop {
        if state.store.reload().await.is_err() {
            break;
        }
        let job = match state.store.get_job(&job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                let frame = json!({"error": format!("Job '{job_id}' not found.")});
                let _ = socket.send(Message::Text(frame.to_string())).await;
                break;
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "subscription read failed");
                break;
            }
        };

        let changed = last_status != Some(job.status) || job.logs.len() != sent_logs;
        if changed {
            let frame = update_frame(&job, sent_logs);
            if socket.send(Message::Text(frame.to_string())).await.is_err() {
                break;
            }
            sent_logs = job.logs.len();
            last_status = Some(job.status);
        }

        if job.status.is_terminal() {
            let done = json!({"type": "done", "status": job.status});
            let _ = socket.send(Message::Text(done.to_string())).await;
            break;
        }

        tokio::time::sleep(state.config.ws_poll).await;
    }
}

/// Build one update frame carrying the log slice beyond `sent_logs`.
fn update_frame(job: &Job, sent_logs: usize) -> Value {
    let from = sent_logs.min(job.logs.len());
    json!({
        "type": "update",
        "job_id": job.job_id,
        "status": job.status,
        "started_at": job.started_at,
        "completed_at": job.completed_at,
        "result": job.result,
        "error": job.error,
        "new_logs": job.logs[from..],
        "total_logs": job.logs.len(),
    })
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
