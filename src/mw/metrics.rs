// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::Request;

use crate::metrics;
use crate::web::{BoxFuture, BoxHandler, Context, Handler, HandlerResult, Middleware, ResponseWriter};

/// Counts requests and failed requests.
#[derive(Debug, Clone)]
pub struct Metrics {
    metrics: Arc<metrics::Metrics>,
}

impl Metrics {
    pub fn new(metrics: Arc<metrics::Metrics>) -> Self {
        Self { metrics }
    }
}

impl Middleware for Metrics {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(MetricsHandler {
            metrics: self.metrics.clone(),
            next,
        })
    }
}

struct MetricsHandler {
    metrics: Arc<metrics::Metrics>,
    next: BoxHandler,
}

impl Handler for MetricsHandler {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<HandlerResult> {
        let metrics = self.metrics.clone();
        let next = self.next.clone();
        Box::pin(async move {
            let count = metrics.add_request();
            metrics.sample_tasks(count);

            let result = next.call(ctx, w, req).await;
            if result.is_err() {
                metrics.add_error();
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::web::Values;
    use axum::body::Body;

    #[tokio::test]
    async fn counts_requests_and_errors() {
        let counters = Arc::new(metrics::Metrics::new());
        let mw = Metrics::new(counters.clone());

        let ok: BoxHandler =
            Arc::new(|_ctx: Context, _w: ResponseWriter, _req: Request| async { HandlerResult::Ok(()) });
        let failing: BoxHandler = Arc::new(|_ctx: Context, _w: ResponseWriter, _req: Request| async {
            HandlerResult::Err(Error::bad_request("nope"))
        });

        let ok = mw.wrap(ok);
        let failing = mw.wrap(failing);

        for _ in 0..3 {
            ok.call(Context::new(Values::new()), ResponseWriter::new(), Request::new(Body::empty()))
                .await
                .unwrap();
        }
        failing
            .call(Context::new(Values::new()), ResponseWriter::new(), Request::new(Body::empty()))
            .await
            .unwrap_err();

        let snap = counters.snapshot();
        assert_eq!(snap.requests, 4);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.panics, 0);
    }
}
