// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Pipeline
//!
//! A small layer on top of axum that runs every registered route through an
//! ordered chain of [`Middleware`] decorators around a terminal [`Handler`].
//!
//! ## Request lifecycle
//!
//! 1. axum matches the path and calls the dispatch closure built by
//!    [`App::handle`].
//! 2. Dispatch allocates fresh [`Values`] (trace id, start time, status
//!    slot) and an empty [`ResponseWriter`].
//! 3. The composed chain runs: global middleware outermost, then route
//!    middleware, then the handler.
//! 4. Whatever the chain wrote is returned to axum. An error that escapes
//!    the chain and is a shutdown error fires the [`ShutdownSignal`].
//!
//! Handlers return `Ok(())` after writing a response with [`respond`], or an
//! [`Error`] that the errors middleware turns into a client response.

mod app;
mod context;
mod handler;
mod response;
mod shutdown;

pub use app::App;
pub use context::{Context, Values};
pub use handler::{wrap_middleware, BoxFuture, BoxHandler, Handler, HandlerResult, Middleware};
pub use response::{
    basic_auth, decode, param, remote_addr, respond, PathParams, ResponseWriter, MAX_BODY_BYTES,
};
pub use shutdown::ShutdownSignal;

pub use crate::error::{check_id, Error, ErrorResponse, FieldError, FieldErrors};
