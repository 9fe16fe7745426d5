// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::Request;
use tracing::info;

use crate::web::{remote_addr, BoxFuture, BoxHandler, Context, Handler, HandlerResult, Middleware, ResponseWriter};

/// Logs the start and completion of every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Middleware for Logger {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(LoggerHandler { next })
    }
}

struct LoggerHandler {
    next: BoxHandler,
}

impl Handler for LoggerHandler {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<HandlerResult> {
        let next = self.next.clone();
        Box::pin(async move {
            let values = ctx.values()?.clone();

            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let remote_addr = remote_addr(&req);

            info!(
                trace_id = %values.trace_id,
                %method,
                %path,
                %remote_addr,
                "request started"
            );

            let result = next.call(ctx, w, req).await;

            info!(
                trace_id = %values.trace_id,
                %method,
                %path,
                %remote_addr,
                status_code = values.status_code().map(|s| s.as_u16()).unwrap_or_default(),
                elapsed_ms = values.elapsed().as_millis() as u64,
                "request completed"
            );

            result
        })
    }
}
