// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route middleware for authentication and authorization.
//!
//! ```rust,ignore
//! let authen: Arc<dyn Middleware> = Arc::new(Authenticate::new(auth.clone()));
//! let admin: Arc<dyn Middleware> = Arc::new(Authorize::new([ROLE_ADMIN]));
//!
//! app.handle(MethodFilter::GET, "v1", "/testauth", handler, &[authen, admin]);
//! ```
//!
//! [`Authenticate`] must run before [`Authorize`]; the claims it attaches to
//! the context are what [`Authorize`] and handlers read via [`get_claims`].

use std::sync::Arc;

use axum::{extract::Request, http::header::AUTHORIZATION};

use super::{AuthError, Authenticator, Claims};
use crate::web::{BoxFuture, BoxHandler, Context, Handler, HandlerResult, Middleware, ResponseWriter};

/// Claims attached by [`Authenticate`].
pub fn get_claims(ctx: &Context) -> Result<&Claims, AuthError> {
    ctx.get::<Claims>().ok_or(AuthError::ClaimsMissing)
}

pub fn set_claims(ctx: &mut Context, claims: Claims) {
    ctx.insert(claims);
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(req: &Request) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => Ok(*token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Validates the bearer token and attaches its claims to the context.
#[derive(Debug, Clone)]
pub struct Authenticate {
    auth: Arc<Authenticator>,
}

impl Authenticate {
    pub fn new(auth: Arc<Authenticator>) -> Self {
        Self { auth }
    }
}

impl Middleware for Authenticate {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(AuthenticateHandler {
            auth: self.auth.clone(),
            next,
        })
    }
}

struct AuthenticateHandler {
    auth: Arc<Authenticator>,
    next: BoxHandler,
}

impl Handler for AuthenticateHandler {
    fn call(&self, mut ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<HandlerResult> {
        let auth = self.auth.clone();
        let next = self.next.clone();
        Box::pin(async move {
            let claims = {
                let token = bearer_token(&req)?;
                auth.validate_token(token)?
            };
            set_claims(&mut ctx, claims);
            next.call(ctx, w, req).await
        })
    }
}

/// Requires the authenticated caller to hold at least one of the roles.
#[derive(Debug, Clone)]
pub struct Authorize {
    roles: Vec<String>,
}

impl Authorize {
    /// An empty role list rejects every request.
    pub fn new<S: Into<String>>(roles: impl IntoIterator<Item = S>) -> Self {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl Middleware for Authorize {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(AuthorizeHandler {
            roles: self.roles.clone(),
            next,
        })
    }
}

struct AuthorizeHandler {
    roles: Vec<String>,
    next: BoxHandler,
}

impl Handler for AuthorizeHandler {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<HandlerResult> {
        let roles = self.roles.clone();
        let next = self.next.clone();
        Box::pin(async move {
            let claims = get_claims(&ctx)?;
            if !claims.authorized(&roles) {
                return Err(AuthError::Forbidden {
                    held: claims.roles.clone(),
                    required: roles,
                }
                .into());
            }
            next.call(ctx, w, req).await
        })
    }
}
