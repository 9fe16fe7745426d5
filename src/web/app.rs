// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Json, Router,
};
use tracing::error;

use super::{
    wrap_middleware, BoxHandler, Context, Handler, Middleware, PathParams, ResponseWriter,
    ShutdownSignal, Values,
};

/// Route table plus the middleware applied to every route.
pub struct App {
    router: Router,
    shutdown: ShutdownSignal,
    mw: Vec<Arc<dyn Middleware>>,
}

impl App {
    pub fn new(shutdown: ShutdownSignal, mw: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            router: Router::new(),
            shutdown,
            mw,
        }
    }

    /// Register `handler` for `method` at `/{group}{path}`.
    ///
    /// The chain is composed once here: global middleware, then `route_mw`,
    /// then the handler.
    pub fn handle<H>(
        mut self,
        method: MethodFilter,
        group: &str,
        path: &str,
        handler: H,
        route_mw: &[Arc<dyn Middleware>],
    ) -> Self
    where
        H: Handler,
    {
        let handler: BoxHandler = Arc::new(handler);
        let chain = wrap_middleware(&self.mw, wrap_middleware(route_mw, handler));
        let shutdown = self.shutdown.clone();

        let route = on(
            method,
            move |Path(params): Path<HashMap<String, String>>, req: Request| {
                let chain = chain.clone();
                let shutdown = shutdown.clone();
                async move { dispatch(chain, shutdown, params, req).await }
            },
        );

        let full_path = if group.is_empty() {
            path.to_string()
        } else {
            format!("/{}{}", group.trim_matches('/'), path)
        };
        self.router = self.router.route(&full_path, route);
        self
    }

    /// Fire the shutdown signal from outside the pipeline.
    pub fn signal_shutdown(&self, reason: impl Into<String>) -> bool {
        self.shutdown.signal(reason)
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn dispatch(
    chain: BoxHandler,
    shutdown: ShutdownSignal,
    params: HashMap<String, String>,
    mut req: Request,
) -> Response {
    req.extensions_mut().insert(PathParams(params));

    let ctx = Context::new(Values::new());
    let writer = ResponseWriter::new();

    if let Err(err) = chain.call(ctx, writer.clone(), req).await {
        if err.is_shutdown() {
            shutdown.signal(err.to_string());
        } else {
            error!(error = %err, "unhandled error escaped the middleware chain");
        }
        if !writer.is_written() {
            return (err.status(), Json(err.to_response())).into_response();
        }
    }

    writer.take().unwrap_or_else(|| StatusCode::OK.into_response())
}
