// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! EdDSA JWT authentication with key rotation and role-based authorization.
//!
//! ## Auth Flow
//!
//! 1. A client exchanges Basic credentials for a token at `/v1/users/token`
//! 2. The token is signed with the active key and names it in its `kid`
//! 3. Later requests send `Authorization: Bearer <token>`
//! 4. [`Authenticate`] verifies the token against the key named by `kid`
//!    and attaches the [`Claims`] to the request context
//! 5. [`Authorize`] admits the request if the claims hold any required role
//!
//! ## Security
//!
//! - Only `EdDSA` tokens are accepted; `none` and HMAC headers are rejected
//! - Expiry is checked with zero leeway
//! - Verification failures are indistinguishable to the caller

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod keystore;
pub mod middleware;

pub use authenticator::Authenticator;
pub use claims::{Claims, ROLE_ADMIN, ROLE_USER};
pub use error::AuthError;
pub use keystore::{KeyLookup, KeyStore, KeyStoreError, PrivateKey, PublicKey};
pub use middleware::{get_claims, set_claims, Authenticate, Authorize};
