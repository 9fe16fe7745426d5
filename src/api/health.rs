// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Debug endpoints served on the debug listener.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::metrics::MetricsSnapshot;
use crate::state::AppState;

/// Deadline for the store readiness probe.
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

/// Liveness payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessResponse {
    pub status: String,
    pub build: String,
    pub hostname: String,
    /// Host reported by the process environment.
    pub host: String,
}

/// Readiness payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// "ok" or the failure reason.
    pub status: String,
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
/// Does not check dependencies - use readiness for that.
pub async fn liveness(State(state): State<AppState>) -> Json<LivenessResponse> {
    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unavailable".to_string());
    let host = std::env::var("KUBERNETES_NODE_NAME").unwrap_or_else(|_| hostname.clone());

    Json(LivenessResponse {
        status: "up".to_string(),
        build: state.build.clone(),
        hostname,
        host,
    })
}

/// Readiness probe handler.
///
/// Returns 200 only if the user store answers within [`READINESS_TIMEOUT`].
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let status = match tokio::time::timeout(READINESS_TIMEOUT, state.users.status_check()).await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some("status check timed out".to_string()),
    };

    match status {
        None => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ok".to_string(),
            }),
        ),
        Some(reason) => {
            warn!(%reason, "readiness failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReadyResponse { status: reason }),
            )
        }
    }
}

/// Process counters.
pub async fn vars(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
