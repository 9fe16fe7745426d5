// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and role checks.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Full administrative access.
pub const ROLE_ADMIN: &str = "ADMIN";

/// Regular user.
pub const ROLE_USER: &str = "USER";

/// Signed token payload.
///
/// Timestamps are seconds since the Unix epoch, as in registered JWT
/// claims. A token is valid while `iat <= now < exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at
    pub iat: i64,
    /// Expires at
    pub exp: i64,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    pub fn new<S: Into<String>>(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
        roles: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            sub: subject.into(),
            iss: issuer.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// True if the claims hold at least one of `roles`.
    ///
    /// An empty `roles` list never authorizes.
    pub fn authorized<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles
            .iter()
            .any(|required| self.has_role(required.as_ref()))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|held| held == role)
    }

    pub fn is_valid_at(&self, now: i64) -> bool {
        self.iat <= now && now < self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(roles: &[&str]) -> Claims {
        Claims::new("u1", "gatehouse", Utc::now(), Duration::hours(1), roles.iter().copied())
    }

    #[test]
    fn any_role_is_enough() {
        let c = claims(&["editor"]);
        assert!(c.authorized(&["admin", "editor"]));
        assert!(!c.authorized(&["admin"]));
    }

    #[test]
    fn empty_sets_never_authorize() {
        assert!(!claims(&[]).authorized(&[ROLE_ADMIN, ROLE_USER]));
        assert!(!claims(&[ROLE_ADMIN]).authorized::<&str>(&[]));
    }

    #[test]
    fn validity_window_is_half_open() {
        let c = claims(&[ROLE_USER]);
        assert!(c.exp > c.iat);
        assert!(c.is_valid_at(c.iat));
        assert!(c.is_valid_at(c.exp - 1));
        assert!(!c.is_valid_at(c.exp));
        assert!(!c.is_valid_at(c.iat - 1));
    }

    #[test]
    fn serializes_registered_names() {
        let c = Claims {
            sub: "u1".into(),
            iss: "gatehouse".into(),
            iat: 10,
            exp: 20,
            roles: vec![ROLE_ADMIN.into()],
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"sub": "u1", "iss": "gatehouse", "iat": 10, "exp": 20, "roles": ["ADMIN"]})
        );

        let without_roles: Claims =
            serde_json::from_str(r#"{"sub":"u1","iss":"x","iat":1,"exp":2}"#).unwrap();
        assert!(without_roles.roles.is_empty());
    }
}
