// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User persistence boundary.
//!
//! Handlers only see the [`UserStore`] trait. [`InMemoryUserStore`] backs
//! local runs and tests; a database-backed store plugs in behind the same
//! trait.
//!
//! The in-memory store digests passwords with a single salted SHA-256
//! round. That is fine for development seeds but is not a password hash;
//! production credentials belong in a store using a slow KDF.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Claims;
use crate::models::{NewUser, User};

/// Lifetime of tokens minted from [`UserStore::authenticate`] claims.
pub const TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("authentication failed")]
    AuthFailure,

    #[error("email {0:?} is already registered")]
    Duplicate(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Check `password` for `email` and return the claims to sign.
    async fn authenticate(
        &self,
        now: DateTime<Utc>,
        email: &str,
        password: &str,
    ) -> Result<Claims, StoreError>;

    async fn query_by_id(&self, id: Uuid) -> Result<User, StoreError>;

    /// Add a user. Emails are unique.
    async fn create(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, StoreError>;

    /// Readiness probe.
    async fn status_check(&self) -> Result<(), StoreError>;
}

struct StoredUser {
    user: User,
    salt: [u8; 16],
    password_hash: Vec<u8>,
}

pub struct InMemoryUserStore {
    issuer: String,
    users: RwLock<HashMap<Uuid, StoredUser>>,
}

impl InMemoryUserStore {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        let mut users = self.users.write();
        if users.values().any(|stored| stored.user.email == new.email) {
            return Err(StoreError::Duplicate(new.email));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            roles: new.roles,
            date_created: now,
        };
        let salt = *Uuid::new_v4().as_bytes();
        let password_hash = hash_password(&salt, &new.password);

        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                salt,
                password_hash,
            },
        );
        Ok(user)
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

fn hash_password(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn authenticate(
        &self,
        now: DateTime<Utc>,
        email: &str,
        password: &str,
    ) -> Result<Claims, StoreError> {
        let users = self.users.read();
        let stored = users
            .values()
            .find(|stored| stored.user.email == email)
            .ok_or(StoreError::NotFound)?;

        let candidate = hash_password(&stored.salt, password);
        if !bool::from(candidate.ct_eq(&stored.password_hash)) {
            return Err(StoreError::AuthFailure);
        }

        Ok(Claims::new(
            stored.user.id.to_string(),
            self.issuer.clone(),
            now,
            Duration::hours(TOKEN_TTL_HOURS),
            stored.user.roles.iter().cloned(),
        ))
    }

    async fn query_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.users
            .read()
            .get(&id)
            .map(|stored| stored.user.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        self.insert(new, now)
    }

    async fn status_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
