// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared-secret authentication middleware.

use crate::api::AppState;
use crate::error::ApiError;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Check the shared secret in the `X-API-Key` header or `api_key` query
/// parameter.
///
/// No configured secret disables the check entirely (development mode).
/// Health and subscription endpoints are always exempt: health serves
/// load balancers, and browser WebSocket clients cannot set headers.
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.config.api_key.as_deref() else {
        return next.run(req).await;
    };

    let path = req.uri().path();
    if path == "/health" || path.starts_with("/ws/") {
        return next.run(req).await;
    }

    let header_match = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    let query_match = req
        .uri()
        .query()
        .is_some_and(|q| q.split('&').any(|kv| kv.strip_prefix("api_key=") == Some(expected)));

    if header_match || query_match {
        next.run(req).await
    } else {
        ApiError::Unauthorized.into_response()
    }
}
