// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::Request;
use tracing::error;

use crate::web::{respond, BoxFuture, BoxHandler, Context, Handler, HandlerResult, Middleware, ResponseWriter};

/// Turns a failed request into a client response.
///
/// The error is logged with the trace id, classified by its root cause and
/// written unless a response already went out. Only shutdown errors are
/// returned to the caller; every other error is handled here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Errors;

impl Middleware for Errors {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(ErrorsHandler { next })
    }
}

struct ErrorsHandler {
    next: BoxHandler,
}

impl Handler for ErrorsHandler {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<HandlerResult> {
        let next = self.next.clone();
        Box::pin(async move {
            let trace_id = ctx.values()?.trace_id.clone();

            let Err(err) = next.call(ctx.clone(), w.clone(), req).await else {
                return Ok(());
            };

            error!(%trace_id, error = %err, "request failed");

            if !w.is_written() {
                respond(&ctx, &w, err.status(), &err.to_response())?;
            }

            if err.is_shutdown() {
                return Err(err);
            }
            Ok(())
        })
    }
}
