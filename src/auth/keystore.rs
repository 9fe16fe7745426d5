// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key Store
//!
//! In-memory map from key id (`kid`) to Ed25519 signing key.
//!
//! ## Loading
//!
//! [`KeyStore::from_dir`] reads one PKCS#8 PEM file per key from a single
//! directory. The file stem is the key id:
//!
//! ```text
//! zarf/keys/
//! ├── 54bb2165-71e1-41a6-af3e-7da4a0e1e2c1.pem   -> kid "54bb2165-..."
//! └── 2024-rotation.pem                          -> kid "2024-rotation"
//! ```
//!
//! Sub-directories and files without a `.pem` extension are skipped.
//!
//! ## Concurrency
//!
//! Lookups take a shared read lock, so any number of verifications run in
//! parallel. [`KeyStore::add`] and [`KeyStore::remove`] take the write lock.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64ct::{Base64, Encoding};
use jsonwebtoken::{DecodingKey, EncodingKey};
use parking_lot::RwLock;
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use thiserror::Error;

/// Key files larger than this are truncated before parsing.
pub const MAX_KEY_FILE_BYTES: u64 = 1024 * 1024;

const PEM_TAG: &str = "PRIVATE KEY";

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("kid lookup failed: {0}")]
    KidNotFound(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("reading key directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("loading key file {}: {source}", path.display())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: Box<KeyStoreError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Ed25519 private key in PKCS#8 DER form.
pub struct PrivateKey {
    der: Vec<u8>,
    public: PublicKey,
}

impl PrivateKey {
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, KeyStoreError> {
        let pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der)
            .map_err(|e| KeyStoreError::InvalidKey(e.to_string()))?;
        Ok(Self {
            der: der.to_vec(),
            public: PublicKey(pair.public_key().as_ref().to_vec()),
        })
    }

    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, KeyStoreError> {
        let block = pem::parse(pem_bytes).map_err(|e| KeyStoreError::InvalidKey(e.to_string()))?;
        if block.tag() != PEM_TAG {
            return Err(KeyStoreError::InvalidKey(format!(
                "unexpected PEM block {:?}, want {PEM_TAG:?}",
                block.tag()
            )));
        }
        Self::from_pkcs8_der(block.contents())
    }

    /// Fresh random key.
    pub fn generate() -> Result<Self, KeyStoreError> {
        let doc = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new())
            .map_err(|_| KeyStoreError::InvalidKey("key generation failed".to_string()))?;
        Self::from_pkcs8_der(doc.as_ref())
    }

    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new(PEM_TAG, self.der.clone()))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_ed_der(&self.der)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Raw 32-byte Ed25519 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_ed_der(&self.0)
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.0)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_base64()).finish()
    }
}

/// Key resolution used by the authenticator.
pub trait KeyLookup: Send + Sync {
    fn private_key(&self, kid: &str) -> Result<Arc<PrivateKey>, KeyStoreError>;
    fn public_key(&self, kid: &str) -> Result<PublicKey, KeyStoreError>;
}

#[derive(Debug, Default)]
pub struct KeyStore {
    keys: RwLock<HashMap<String, Arc<PrivateKey>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(keys: HashMap<String, PrivateKey>) -> Self {
        let keys = keys.into_iter().map(|(kid, key)| (kid, Arc::new(key))).collect();
        Self {
            keys: RwLock::new(keys),
        }
    }

    /// Load every `<kid>.pem` file in `dir`.
    ///
    /// The first malformed key file aborts loading.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| KeyStoreError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut keys = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|source| KeyStoreError::Directory {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();

            if entry.file_type()?.is_dir() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("pem") {
                continue;
            }
            let Some(kid) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let key = read_key_file(&path).map_err(|source| KeyStoreError::KeyFile {
                path: path.clone(),
                source: Box::new(source),
            })?;
            keys.insert(kid.to_string(), key);
        }

        Ok(Self::from_map(keys))
    }

    /// Insert or replace the key stored under `kid`.
    pub fn add(&self, kid: impl Into<String>, key: PrivateKey) {
        self.keys.write().insert(kid.into(), Arc::new(key));
    }

    pub fn remove(&self, kid: &str) {
        self.keys.write().remove(kid);
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.read().contains_key(kid)
    }

    /// Key ids in sorted order.
    pub fn kids(&self) -> Vec<String> {
        let mut kids: Vec<String> = self.keys.read().keys().cloned().collect();
        kids.sort();
        kids
    }
}

impl KeyLookup for KeyStore {
    fn private_key(&self, kid: &str) -> Result<Arc<PrivateKey>, KeyStoreError> {
        self.keys
            .read()
            .get(kid)
            .cloned()
            .ok_or_else(|| KeyStoreError::KidNotFound(kid.to_string()))
    }

    fn public_key(&self, kid: &str) -> Result<PublicKey, KeyStoreError> {
        self.private_key(kid).map(|key| key.public_key().clone())
    }
}

fn read_key_file(path: &Path) -> Result<PrivateKey, KeyStoreError> {
    let mut pem_bytes = Vec::new();
    fs::File::open(path)?
        .take(MAX_KEY_FILE_BYTES)
        .read_to_end(&mut pem_bytes)?;
    PrivateKey::from_pem(&pem_bytes)
}
