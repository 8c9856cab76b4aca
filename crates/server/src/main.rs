// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! drover daemon (droverd)
//!
//! Accepts coding-agent jobs and pipeline runs over HTTP, executes them
//! asynchronously, and streams progress over WebSocket.

use drover_adapters::{GitDispatcher, ProcessAgent};
use drover_engine::{EngineDeps, JobEngine, PipelineEngine};
use drover_server::{router, AppState, ServerConfig};
use drover_storage::{NoopFence, Store};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Terminal jobs older than this many days are swept daily.
const CLEANUP_DAYS: i64 = 30;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    info!(db = %config.db_path.display(), bind = %config.bind_addr, "starting droverd");

    let store = Store::open(&config.db_path, Arc::new(NoopFence)).await?;

    let mut dispatcher = GitDispatcher::new();
    if let Some(setup) = &config.agent_setup_command {
        dispatcher = dispatcher.with_setup_command(setup);
    }
    let deps = EngineDeps {
        store: store.clone(),
        agent: Arc::new(ProcessAgent::new(&config.agent_command)),
        dispatcher: Arc::new(dispatcher),
    };
    let jobs = JobEngine::new(deps).with_agent_timeout(config.agent_timeout);
    let pipelines = PipelineEngine::new(jobs.clone(), &config.workspace_root);

    let state = AppState {
        store: store.clone(),
        jobs,
        pipelines,
        config: Arc::new(config),
    };

    spawn_cleanup_sweep(store);

    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await?;
    info!(addr = %state.config.bind_addr, "droverd listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Daily sweep deleting terminal jobs past the retention window.
fn spawn_cleanup_sweep(store: Store) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
        loop {
            interval.tick().await;
            match store.cleanup_old_jobs(CLEANUP_DAYS).await {
                Ok(_) => {
                    let _ = store.commit().await;
                }
                Err(e) => tracing::warn!(error = %e, "cleanup sweep failed"),
            }
        }
    });
}
