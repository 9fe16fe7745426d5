// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;

use super::{Context, ResponseWriter};
use crate::error::Error;

pub type BoxFuture<T> = futures::future::BoxFuture<'static, T>;

/// `Ok(())` means the response has been written.
pub type HandlerResult = Result<(), Error>;

/// A step of the request pipeline.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Context, ResponseWriter, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture<HandlerResult> {
        Box::pin(self(ctx, w, req))
    }
}

pub type BoxHandler = Arc<dyn Handler>;

/// Decorates a handler with behaviour that runs around it.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxHandler) -> BoxHandler;
}

/// Compose `mw` around `handler` so that `mw[0]` runs first.
pub fn wrap_middleware(mw: &[Arc<dyn Middleware>], handler: BoxHandler) -> BoxHandler {
    mw.iter().rev().fold(handler, |next, m| m.wrap(next))
}
