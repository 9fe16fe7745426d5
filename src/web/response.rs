// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use base64ct::{Base64, Encoding};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};

use super::Context;
use crate::error::Error;

/// Request bodies larger than this are rejected by [`decode`].
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Default)]
struct Slot {
    written: bool,
    response: Option<Response>,
}

/// Response sink shared by every stage of one request.
///
/// Accepts exactly one response.
#[derive(Clone, Default)]
pub struct ResponseWriter {
    slot: Arc<Mutex<Slot>>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, response: Response) -> Result<(), Error> {
        let mut slot = self.slot.lock();
        if slot.written {
            return Err(Error::internal("response already written"));
        }
        slot.written = true;
        slot.response = Some(response);
        Ok(())
    }

    pub fn is_written(&self) -> bool {
        self.slot.lock().written
    }

    /// Remove the written response, leaving the writer marked as written.
    pub fn take(&self) -> Option<Response> {
        self.slot.lock().response.take()
    }
}

impl std::fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("written", &self.is_written())
            .finish()
    }
}

/// Serialize `data` as JSON and write it with `status`.
///
/// The status is recorded in the request values before writing. 204 and 304
/// responses carry no body.
pub fn respond<T>(ctx: &Context, w: &ResponseWriter, status: StatusCode, data: &T) -> Result<(), Error>
where
    T: Serialize + ?Sized,
{
    let values = ctx.values()?;

    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        values.set_status(status);
        return w.write(status.into_response());
    }

    let body = serde_json::to_vec(data).map_err(|e| Error::internal(e).wrap("respond: marshal"))?;
    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .map_err(|e| Error::internal(e).wrap("respond: build"))?;

    values.set_status(status);
    w.write(response)
}

/// Named path segments captured by the router.
#[derive(Debug, Clone, Default)]
pub struct PathParams(pub HashMap<String, String>);

/// Look up a named path segment such as `id` in `/users/{id}`.
pub fn param<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.extensions()
        .get::<PathParams>()
        .and_then(|params| params.0.get(name))
        .map(String::as_str)
}

/// Read the body as JSON.
pub async fn decode<T: DeserializeOwned>(req: Request) -> Result<T, Error> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| Error::bad_request(format!("unable to read payload: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::bad_request(format!("unable to decode payload: {e}")))
}

/// Credentials from an `Authorization: Basic` header.
pub fn basic_auth(req: &Request) -> Option<(String, String)> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = Base64::decode_vec(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Peer address when the server was started with connect info.
pub fn remote_addr(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
