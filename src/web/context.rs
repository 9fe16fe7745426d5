// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use axum::http::{Extensions, StatusCode};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;

/// State owned by a single in-flight request.
#[derive(Debug)]
pub struct Values {
    pub trace_id: String,
    pub now: DateTime<Utc>,
    started: Instant,
    status_code: OnceLock<StatusCode>,
}

impl Values {
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            now: Utc::now(),
            started: Instant::now(),
            status_code: OnceLock::new(),
        }
    }

    /// Record the response status. Only the first call has any effect.
    pub fn set_status(&self, status: StatusCode) -> bool {
        self.status_code.set(status).is_ok()
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code.get().copied()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-request context threaded through the middleware chain.
///
/// Carries the request [`Values`] plus typed extensions that stages attach
/// for the stages after them (the authenticated claims, for example).
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: Option<Arc<Values>>,
    extensions: Extensions,
}

impl Context {
    pub fn new(values: Values) -> Self {
        Self {
            values: Some(Arc::new(values)),
            extensions: Extensions::new(),
        }
    }

    /// Request values, or a shutdown error when dispatch never set them.
    pub fn values(&self) -> Result<&Arc<Values>, Error> {
        self.values
            .as_ref()
            .ok_or_else(|| Error::shutdown("web value missing from context"))
    }

    pub fn insert<T>(&mut self, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(value);
    }

    pub fn get<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.extensions.get::<T>()
    }
}
