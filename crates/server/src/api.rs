// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router assembly and shared handler state.

use crate::env::ServerConfig;
use crate::{auth, handlers, ws};
use axum::routing::{get, post};
use axum::Router;
use drover_engine::{JobEngine, PipelineEngine};
use drover_storage::Store;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub jobs: JobEngine,
    pub pipelines: PipelineEngine,
    pub config: Arc<ServerConfig>,
}

/// Build the full API router.
///
/// CORS is permissive: the API serves browser dashboards from other
/// origins and protects itself with the shared secret instead.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::jobs::health))
        .route("/submit", post(handlers::jobs::submit))
        .route("/status/:job_id", get(handlers::jobs::status))
        .route("/result/:job_id", get(handlers::jobs::result))
        .route("/jobs", get(handlers::jobs::list))
        .route("/pipelines", post(handlers::pipelines::create).get(handlers::pipelines::list))
        .route(
            "/pipelines/:pipeline_id",
            get(handlers::pipelines::get_one).delete(handlers::pipelines::remove),
        )
        .route("/pipelines/:pipeline_id/run", post(handlers::pipelines::run))
        .route("/pipelines/:pipeline_id/runs", get(handlers::pipelines::runs))
        .route("/runs/:run_id", get(handlers::pipelines::run_detail))
        .route("/ws/:job_id", get(ws::subscribe))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
