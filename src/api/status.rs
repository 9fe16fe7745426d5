// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Probe endpoints for exercising the pipeline.

use axum::{extract::Request, http::StatusCode};

use crate::models::StatusResponse;
use crate::web::{respond, Context, HandlerResult, ResponseWriter};

/// Unauthenticated probe.
#[utoipa::path(
    get,
    path = "/v1/test",
    tag = "Status",
    responses(
        (status = 200, description = "Pipeline is serving", body = StatusResponse)
    )
)]
pub async fn test(ctx: Context, w: ResponseWriter, _req: Request) -> HandlerResult {
    respond(&ctx, &w, StatusCode::OK, &StatusResponse::ok())
}

/// Probe behind authentication and the ADMIN role.
#[utoipa::path(
    get,
    path = "/v1/testauth",
    tag = "Status",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller is an authenticated admin", body = StatusResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the ADMIN role")
    )
)]
pub async fn test_auth(ctx: Context, w: ResponseWriter, req: Request) -> HandlerResult {
    test(ctx, w, req).await
}
