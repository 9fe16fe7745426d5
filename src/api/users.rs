// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::Request, http::StatusCode};
use tracing::debug;

use crate::auth::{get_claims, ROLE_ADMIN};
use crate::error::{check_id, Error, ErrorResponse};
use crate::models::{NewUser, TokenResponse, User};
use crate::state::AppState;
use crate::store::StoreError;
use crate::web::{basic_auth, decode, param, respond, Context, Handler, HandlerResult, ResponseWriter};

/// Exchange Basic credentials for a signed token.
#[utoipa::path(
    get,
    path = "/v1/users/token",
    tag = "Users",
    responses(
        (status = 200, description = "Signed token", body = TokenResponse),
        (status = 401, description = "Missing Basic credentials or wrong password"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn token(state: AppState, ctx: Context, w: ResponseWriter, req: Request) -> HandlerResult {
    let (email, password) = basic_auth(&req)
        .ok_or_else(|| Error::unauthorized("must provide email and password in Basic auth"))?;
    let now = ctx.values()?.now;

    let claims = state
        .users
        .authenticate(now, &email, &password)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => Error::not_found("user not found"),
            StoreError::AuthFailure => Error::unauthorized("authentication failed"),
            other => Error::internal(other).wrap("authenticating"),
        })?;

    let token = state
        .auth
        .generate_token(&claims)
        .map_err(|e| Error::from(e).wrap("generating token"))?;

    debug!(subject = %claims.sub, "token issued");
    respond(&ctx, &w, StatusCode::OK, &TokenResponse { token })
}

/// Fetch a user. Admins may read anyone, other callers only themselves.
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(
        ("id" = uuid::Uuid, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User", body = User),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller may not read this user"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn query_by_id(
    state: AppState,
    ctx: Context,
    w: ResponseWriter,
    req: Request,
) -> HandlerResult {
    let id = check_id(param(&req, "id").unwrap_or_default())?;

    let claims = get_claims(&ctx)?;
    if !claims.authorized(&[ROLE_ADMIN]) && claims.sub != id.to_string() {
        return Err(Error::forbidden("you are not authorized for that action"));
    }

    let user = state.users.query_by_id(id).await.map_err(|e| match e {
        StoreError::NotFound => Error::not_found(format!("user {id} not found")),
        other => Error::internal(other).wrap(format!("querying user {id}")),
    })?;

    respond(&ctx, &w, StatusCode::OK, &user)
}

/// Add a user. Admin only.
#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "Users",
    security(("bearer" = [])),
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Malformed body or failing fields", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create(state: AppState, ctx: Context, w: ResponseWriter, req: Request) -> HandlerResult {
    let now = ctx.values()?.now;

    let new: NewUser = decode(req).await?;
    new.validate()?;

    let user = state.users.create(new, now).await.map_err(|e| match e {
        StoreError::Duplicate(_) => Error::request(StatusCode::CONFLICT, e),
        other => Error::internal(other).wrap("creating user"),
    })?;

    debug!(id = %user.id, "user created");
    respond(&ctx, &w, StatusCode::CREATED, &user)
}

/// Route handler for [`token`] bound to `state`.
pub fn token_handler(state: AppState) -> impl Handler {
    move |ctx: Context, w: ResponseWriter, req: Request| token(state.clone(), ctx, w, req)
}

/// Route handler for [`query_by_id`] bound to `state`.
pub fn query_by_id_handler(state: AppState) -> impl Handler {
    move |ctx: Context, w: ResponseWriter, req: Request| query_by_id(state.clone(), ctx, w, req)
}

/// Route handler for [`create`] bound to `state`.
pub fn create_handler(state: AppState) -> impl Handler {
    move |ctx: Context, w: ResponseWriter, req: Request| create(state.clone(), ctx, w, req)
}
