// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::http::StatusCode;
use thiserror::Error;

use super::keystore::KeyStoreError;
use crate::error::Error;

/// Authentication and authorization failures.
///
/// Token verification problems all collapse into [`AuthError::InvalidToken`]
/// so callers cannot tell which check rejected a token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("active kid {0:?} not found in key store")]
    ActiveKidMissing(String),

    #[error("key lookup failed: {0}")]
    KeyLookup(#[from] KeyStoreError),

    #[error("signing token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("claims expire before they are issued: iat={iat} exp={exp}")]
    EmptyLifetime { iat: i64, exp: i64 },

    #[error("invalid token")]
    InvalidToken,

    #[error("authorization header is required")]
    MissingAuthHeader,

    #[error("expected authorization header format: Bearer <token>")]
    InvalidAuthHeader,

    #[error("claims missing from context")]
    ClaimsMissing,

    #[error("you are not authorized for that action: claims{held:?} required{required:?}")]
    Forbidden {
        held: Vec<String>,
        required: Vec<String>,
    },
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidToken | AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::ClaimsMissing | AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::ActiveKidMissing(_)
            | AuthError::KeyLookup(_)
            | AuthError::Signing(_)
            | AuthError::EmptyLifetime { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => Error::internal(err),
            status => Error::request(status, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_become_request_errors() {
        let err: Error = AuthError::InvalidToken.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_response().error, "invalid token");

        let err: Error = AuthError::ClaimsMissing.into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn server_errors_stay_hidden() {
        let err: Error = AuthError::ActiveKidMissing("k9".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_response().error, "internal error");
    }
}
