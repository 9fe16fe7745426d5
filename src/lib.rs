// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gatehouse - Request Pipeline & Token Authentication Service
//!
//! A middleware-composed HTTP pipeline on top of axum with EdDSA JWT
//! authentication, key rotation and role-based authorization.
//!
//! ## Modules
//!
//! - `web` - Handler/middleware composition, request context, dispatch
//! - `mw` - Global middleware (logging, errors, metrics, panics)
//! - `auth` - Key store, token authenticator, claims, auth middleware
//! - `error` - Error taxonomy consumed by the errors middleware
//! - `api` - Route table, debug endpoints and OpenAPI docs

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod mw;
pub mod state;
pub mod store;
pub mod web;
