// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Global Middleware
//!
//! Applied to every API route, outermost first:
//!
//! 1. [`Logger`] - start/completion events with the final status code
//! 2. [`Errors`] - turns errors into client responses, re-raises shutdown
//! 3. [`Metrics`] - request and error counters, sampled task gauge
//! 4. [`Panics`] - converts a panic into an error carrying its trace
//!
//! Route middleware (authentication, authorization) runs inside all four.

mod errors;
mod logger;
mod metrics;
mod panics;

pub use errors::Errors;
pub use logger::Logger;
pub use metrics::Metrics;
pub use panics::Panics;
