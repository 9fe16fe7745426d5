// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response payloads of the REST API. All types derive
//! `Serialize` and `ToSchema` for JSON handling and OpenAPI documentation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, FieldErrors};

/// A user known to the user store.
///
/// The password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub date_created: DateTime<Utc>,
}

/// Request body for POST /v1/users.
///
/// Missing fields decode as empty so [`NewUser::validate`] can report
/// them together.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub password: String,
}

impl NewUser {
    /// Field checks, reported in declaration order.
    pub fn validate(&self) -> Result<(), Error> {
        let mut fields = FieldErrors::default();

        if self.name.trim().is_empty() {
            fields.push("name", "name is a required field");
        }
        if self.email.trim().is_empty() {
            fields.push("email", "email is a required field");
        } else if !is_email(&self.email) {
            fields.push("email", "email must be a valid email address");
        }
        if self.roles.is_empty() {
            fields.push("roles", "roles is a required field");
        } else if self.roles.iter().any(|role| role.trim().is_empty()) {
            fields.push("roles", "roles must not contain empty values");
        }
        if self.password.is_empty() {
            fields.push("password", "password is a required field");
        }

        fields.into_result()
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !value.contains(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    }
}

/// Response for GET /v1/users/token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Signed EdDSA JWT
    pub token: String,
}

/// Generic status payload.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
