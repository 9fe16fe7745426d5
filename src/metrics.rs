// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process counters.
//!
//! A single [`Metrics`] value is created at bootstrap and shared by
//! reference with the metrics and panics middleware and the `/debug/vars`
//! endpoint. All mutation is a relaxed atomic increment or store.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

/// The concurrency gauge is refreshed on every Nth request.
pub const TASK_SAMPLE_INTERVAL: u64 = 100;

#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    errors: AtomicU64,
    panics: AtomicU64,
    tasks: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub panics: u64,
    /// Alive runtime tasks at the last sample.
    pub tasks: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request and return the new total.
    pub fn add_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn add_error(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn add_panic(&self) -> u64 {
        self.panics.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Refresh the task gauge when `request_count` lands on the sample
    /// interval. Returns whether a sample was taken.
    ///
    /// Outside a tokio runtime the gauge is left untouched.
    pub fn sample_tasks(&self, request_count: u64) -> bool {
        if request_count == 0 || request_count % TASK_SAMPLE_INTERVAL != 0 {
            return false;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return false;
        };
        let alive = handle.metrics().num_alive_tasks() as u64;
        self.tasks.store(alive, Ordering::Relaxed);
        true
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            tasks: self.tasks.load(Ordering::Relaxed),
        }
    }
}
