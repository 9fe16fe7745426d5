// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Authenticator
//!
//! Issues and verifies EdDSA (Ed25519) JWTs.
//!
//! Every token carries the id of the key that signed it in its `kid`
//! header. New tokens are always signed with the active key, while
//! verification resolves whichever key the token names. Rotating keys is
//! therefore a matter of adding a new key, switching the active kid and
//! removing the old key once its tokens have expired.
//!
//! ## Verification
//!
//! 1. Parse the header; the algorithm must be `EdDSA` and a `kid` present
//! 2. Resolve the public key for that `kid`
//! 3. Verify the signature and decode the claims (`exp` and `sub` required)
//! 4. Check `iat <= now < exp` with zero leeway
//!
//! Any failure is reported as [`AuthError::InvalidToken`]. The specific
//! reason is only logged at debug level.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};
use tracing::debug;

use super::{AuthError, Claims, KeyLookup};

pub const ALGORITHM: Algorithm = Algorithm::EdDSA;

pub struct Authenticator {
    active_kid: String,
    keys: Arc<dyn KeyLookup>,
    validation: Validation,
}

impl Authenticator {
    /// Fails if `active_kid` cannot be resolved in `keys`.
    pub fn new(keys: Arc<dyn KeyLookup>, active_kid: impl Into<String>) -> Result<Self, AuthError> {
        let active_kid = active_kid.into();
        if keys.private_key(&active_kid).is_err() {
            return Err(AuthError::ActiveKidMissing(active_kid));
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_aud = false;
        // The validity window is checked against the caller's clock below.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            active_kid,
            keys,
            validation,
        })
    }

    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    /// Sign `claims` with the active key.
    ///
    /// Claims whose `exp` is not after `iat` could never validate and are
    /// refused.
    pub fn generate_token(&self, claims: &Claims) -> Result<String, AuthError> {
        if claims.exp <= claims.iat {
            return Err(AuthError::EmptyLifetime {
                iat: claims.iat,
                exp: claims.exp,
            });
        }

        let key = self.keys.private_key(&self.active_kid)?;

        let mut header = Header::new(ALGORITHM);
        header.kid = Some(self.active_kid.clone());

        encode(&header, claims, &key.encoding_key()).map_err(AuthError::Signing)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_token_at(token, Utc::now().timestamp())
    }

    /// Verify `token` as of `now` (seconds since the epoch).
    pub fn validate_token_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        self.verify(token, now).map_err(|reason| {
            debug!(%reason, "token rejected");
            AuthError::InvalidToken
        })
    }

    fn verify(&self, token: &str, now: i64) -> Result<Claims, String> {
        let header = decode_header(token).map_err(|e| format!("parsing header: {e}"))?;
        if header.alg != ALGORITHM {
            return Err(format!("unexpected signing method {:?}", header.alg));
        }
        let kid = header.kid.ok_or("kid missing from header")?;

        let public = self
            .keys
            .public_key(&kid)
            .map_err(|e| format!("resolving kid: {e}"))?;

        let data = decode::<Claims>(token, &public.decoding_key(), &self.validation)
            .map_err(|e| format!("verifying token: {e}"))?;

        if !data.claims.is_valid_at(now) {
            return Err(format!(
                "outside validity window iat={} exp={} now={now}",
                data.claims.iat, data.claims.exp
            ));
        }
        Ok(data.claims)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("active_kid", &self.active_kid)
            .finish_non_exhaustive()
    }
}
