// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::metrics::Metrics;
use crate::store::UserStore;
use crate::web::ShutdownSignal;

/// Dependencies shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub build: String,
    pub auth: Arc<Authenticator>,
    pub users: Arc<dyn UserStore>,
    pub metrics: Arc<Metrics>,
    pub shutdown: ShutdownSignal,
}

impl AppState {
    pub fn new(build: impl Into<String>, auth: Arc<Authenticator>, users: Arc<dyn UserStore>) -> Self {
        Self {
            build: build.into(),
            auth,
            users,
            metrics: Arc::new(Metrics::new()),
            shutdown: ShutdownSignal::new(),
        }
    }
}
