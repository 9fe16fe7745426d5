// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Error Taxonomy
//!
//! Every failure that leaves a handler is a [`Error`]. The error-handling
//! stage of the pipeline classifies the **root cause** of an error (see
//! [`Error::cause`]) into one of four disjoint categories, checked in this
//! order:
//!
//! | Category | Variant | Client response |
//! |----------|---------|-----------------|
//! | Field validation | [`Error::Validation`] | 400 with the failing fields |
//! | Request | [`Error::Request`] | the status chosen by the raiser |
//! | Shutdown | [`Error::Shutdown`] | 500, then the service shuts down |
//! | Unclassified | [`Error::Internal`] | 500 `internal error`, detail logged only |
//!
//! [`Error::Wrapped`] only adds context; it is never a category on its own.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Boxed error used as the payload of request and unclassified errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message returned to clients for every unclassified failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Message returned for field validation failures.
pub const VALIDATION_ERROR_MESSAGE: &str = "data validation error";

/// A single failing request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// Ordered collection of field failures.
///
/// An empty collection is not an error; use [`FieldErrors::into_result`] to
/// turn a populated one into [`Error::Validation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Append a failure and return the collection (builder style).
    pub fn with(mut self, field: impl Into<String>, error: impl Into<String>) -> Self {
        self.push(field, error);
        self
    }

    /// Append a failure.
    pub fn push(&mut self, field: impl Into<String>, error: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            error: error.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing failed, otherwise [`Error::Validation`].
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FieldErrors {}

/// Pipeline error.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more request fields failed validation.
    #[error("data validation error: {0}")]
    Validation(FieldErrors),

    /// A failure with an explicit response status picked by the raiser.
    #[error("{source}")]
    Request {
        status: StatusCode,
        #[source]
        source: BoxError,
    },

    /// Process integrity is compromised; the service must shut down.
    #[error("{0}")]
    Shutdown(String),

    /// Anything else. Never shown to clients.
    #[error(transparent)]
    Internal(BoxError),

    /// Contextual decoration around another pipeline error.
    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Pair an error with the response status it should produce.
    pub fn request(status: StatusCode, source: impl Into<BoxError>) -> Self {
        Self::Request {
            status,
            source: source.into(),
        }
    }

    pub fn bad_request(source: impl Into<BoxError>) -> Self {
        Self::request(StatusCode::BAD_REQUEST, source)
    }

    pub fn unauthorized(source: impl Into<BoxError>) -> Self {
        Self::request(StatusCode::UNAUTHORIZED, source)
    }

    pub fn forbidden(source: impl Into<BoxError>) -> Self {
        Self::request(StatusCode::FORBIDDEN, source)
    }

    pub fn not_found(source: impl Into<BoxError>) -> Self {
        Self::request(StatusCode::NOT_FOUND, source)
    }

    /// Distinguished error that escalates to a service shutdown.
    pub fn shutdown(reason: impl Into<String>) -> Self {
        Self::Shutdown(reason.into())
    }

    pub fn internal(source: impl Into<BoxError>) -> Self {
        Self::Internal(source.into())
    }

    /// Decorate the error with context. Classification is unaffected.
    pub fn wrap(self, context: impl Into<String>) -> Self {
        Self::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Unwrap down to the root cause.
    ///
    /// Follows [`Error::Wrapped`] layers and any pipeline error boxed inside
    /// a request or unclassified error.
    pub fn cause(&self) -> &Error {
        let mut root = self;
        loop {
            let inner = match root {
                Error::Wrapped { source, .. } => Some(source.as_ref()),
                Error::Request { source, .. } | Error::Internal(source) => source.downcast_ref::<Error>(),
                Error::Validation(_) | Error::Shutdown(_) => None,
            };
            match inner {
                Some(next) => root = next,
                None => return root,
            }
        }
    }

    /// Whether the root cause is a shutdown error.
    pub fn is_shutdown(&self) -> bool {
        matches!(self.cause(), Error::Shutdown(_))
    }

    /// Response status for the root cause.
    pub fn status(&self) -> StatusCode {
        match self.cause() {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Request { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing body for the root cause.
    ///
    /// Shutdown and unclassified errors never leak their message.
    pub fn to_response(&self) -> ErrorResponse {
        match self.cause() {
            Error::Validation(fields) => ErrorResponse {
                error: VALIDATION_ERROR_MESSAGE.to_string(),
                fields: fields.clone(),
            },
            Error::Request { source, .. } => ErrorResponse {
                error: source.to_string(),
                fields: FieldErrors::default(),
            },
            _ => ErrorResponse {
                error: INTERNAL_ERROR_MESSAGE.to_string(),
                fields: FieldErrors::default(),
            },
        }
    }
}

/// Body written to clients for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    #[schema(value_type = Vec<FieldError>)]
    pub fields: FieldErrors,
}

/// Validate that an identifier is a well formed UUID.
pub fn check_id(id: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(id).map_err(|_| Error::bad_request("ID is not in its proper form"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cause_unwraps_every_layer() {
        let err = Error::shutdown("values missing")
            .wrap("errors stage")
            .wrap("dispatch");

        assert!(matches!(err.cause(), Error::Shutdown(msg) if msg == "values missing"));
        assert!(err.is_shutdown());
        assert_eq!(err.to_string(), "dispatch: errors stage: values missing");
    }

    #[test]
    fn cause_reaches_boxed_pipeline_errors() {
        let err = Error::internal(Error::shutdown("values missing"));
        assert!(err.is_shutdown());

        let err = Error::request(StatusCode::NOT_FOUND, Error::shutdown("values missing").wrap("lookup"));
        assert!(err.is_shutdown());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = Error::internal(Error::forbidden("not yours"));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_response().error, "not yours");

        // A plain boxed error is its own root.
        let err = Error::request(StatusCode::CONFLICT, "already exists");
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn classification_uses_root_cause() {
        let err = Error::not_found("user 42").wrap("users.query_by_id");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_response().error, "user 42");
        assert!(!err.is_shutdown());
    }

    #[test]
    fn validation_maps_to_400_with_fields() {
        let err = FieldErrors::default()
            .with("email", "email is a required field")
            .with("name", "name is a required field")
            .into_result()
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(body["error"], VALIDATION_ERROR_MESSAGE);
        assert_eq!(body["fields"][0]["field"], "email");
        assert_eq!(body["fields"][1]["field"], "name");
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::default().into_result().is_ok());
    }

    #[test]
    fn internal_and_shutdown_hide_detail() {
        let internal = Error::internal("connection refused: db.internal:5432");
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_string(&internal.to_response()).unwrap();
        assert_eq!(body, r#"{"error":"internal error"}"#);

        let shutdown = Error::shutdown("web values missing from context");
        assert_eq!(shutdown.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(shutdown.to_response().error, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn check_id_rejects_malformed_ids() {
        assert!(check_id("1b24502a-4781-47cb-99c2-3403c23bedac").is_ok());

        let err = check_id("not-an-id").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
