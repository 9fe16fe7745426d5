// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use axum::extract::Request;
use futures::FutureExt;

use crate::error::Error;
use crate::metrics;
use crate::web::{BoxFuture, BoxHandler, Context, Handler, HandlerResult, Middleware, ResponseWriter};

thread_local! {
    /// Trace of the last panic raised on this thread, taken by the handler
    /// that catches it.
    static PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static TRACE_HOOK: Once = Once::new();

/// Chain a panic hook that records the trace at the panic site. The
/// previous hook still runs.
fn install_trace_hook() {
    TRACE_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

/// The unwound stack is gone by the time `catch_unwind` returns; fall back
/// to the catch site if the hook did not run.
fn take_panic_trace() -> Backtrace {
    PANIC_TRACE
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(Backtrace::force_capture)
}

/// Recovers panics raised further down the chain.
///
/// A panic becomes an unclassified error carrying the panic message and the
/// stack trace of the panic site, and the panic counter is incremented once.
#[derive(Debug, Clone)]
pub struct Panics {
    metrics: Arc<metrics::Metrics>,
}

impl Panics {
    pub fn new(metrics: Arc<metrics::Metrics>) -> Self {
        install_trace_hook();
        Self { metrics }
    }
}

impl Middleware for Panics {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(PanicsHandler {
            metrics: self.metrics.clone(),
            next,
        })
    }
}

struct PanicsHandler {
    metrics: Arc<metrics::Metrics>,
    next: BoxHandler,
}

impl Handler for PanicsHandler {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<HandlerResult> {
        let metrics = self.metrics.clone();
        let next = self.next.clone();
        Box::pin(async move {
            let run = AssertUnwindSafe(async move { next.call(ctx, w, req).await });
            match run.catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    metrics.add_panic();
                    let trace = take_panic_trace();
                    Err(Error::internal(format!(
                        "PANIC [{}] TRACE[{trace}]",
                        panic_message(payload.as_ref())
                    )))
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}
