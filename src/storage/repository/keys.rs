// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mint authority keypairs on local storage.
//!
//! ## Storage Layout
//!
//! ```text
//! data/keys/{mint}.json    # mode 0600
//! {
//!   "mint": "...",
//!   "publicKey": "...",
//!   "secretKey": [64 bytes],
//!   "createdAt": "...",
//!   "origin": "created" | "regenerated"
//! }
//! ```
//!
//! ## Security
//!
//! - Secrets are plaintext JSON protected by file permissions only
//! - `Debug` never prints the secret
//! - The secret buffer is wiped when the record is dropped
//! - Secrets are NEVER returned via API

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::KeyStore;
use crate::ledger::{Address, KeyError, Keypair};
use crate::storage::{LocalStorage, StorageError, StorageResult};

/// How an authority keypair came to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrigin {
    /// Generated when the token was created; controls the mint.
    #[default]
    Created,
    /// Generated after the original was lost; not the on-chain authority.
    Regenerated,
}

/// Persisted form of a mint authority keypair.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredKeypair {
    pub mint: Address,
    pub public_key: Address,
    /// `seed || public`, 64 bytes.
    pub secret_key: Vec<u8>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub origin: KeyOrigin,
}

impl StoredKeypair {
    pub fn new(mint: Address, keypair: &Keypair, origin: KeyOrigin) -> Self {
        Self {
            mint,
            public_key: keypair.address(),
            secret_key: keypair.to_secret_bytes().to_vec(),
            created_at: Utc::now(),
            origin,
        }
    }

    /// Rebuild the keypair, checking it against the recorded public key.
    pub fn to_keypair(&self) -> Result<Keypair, KeyError> {
        let keypair = Keypair::from_secret_bytes(&self.secret_key)?;
        if keypair.address() != self.public_key {
            return Err(KeyError::Mismatch);
        }
        Ok(keypair)
    }
}

impl fmt::Debug for StoredKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredKeypair")
            .field("mint", &self.mint)
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("origin", &self.origin)
            .finish()
    }
}

impl Drop for StoredKeypair {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

/// File-backed [`KeyStore`].
pub struct KeyRepository {
    storage: Arc<LocalStorage>,
}

impl KeyRepository {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }
}

impl KeyStore for KeyRepository {
    fn load(&self, mint: &Address) -> StorageResult<Option<StoredKeypair>> {
        match self.storage.read_json(self.storage.paths().key(mint)) {
            Ok(key) => Ok(Some(key)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, key: &StoredKeypair) -> StorageResult<()> {
        self.storage
            .write_secret_json(self.storage.paths().key(&key.mint), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<LocalStorage>) {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::open(StoragePaths::new(temp.path())).unwrap();
        (temp, Arc::new(storage))
    }

    #[test]
    fn save_and_load_round_trips_keypair() {
        let (_temp, storage) = setup();
        let repo = KeyRepository::new(storage);
        let mint = Keypair::generate().address();
        let authority = Keypair::generate();

        repo.save(&StoredKeypair::new(mint, &authority, KeyOrigin::Created))
            .unwrap();

        let stored = repo.load(&mint).unwrap().unwrap();
        assert_eq!(stored.origin, KeyOrigin::Created);
        assert_eq!(stored.to_keypair().unwrap(), authority);
    }

    #[test]
    fn missing_key_is_none() {
        let (_temp, storage) = setup();
        let repo = KeyRepository::new(storage);
        assert!(repo.load(&Keypair::generate().address()).unwrap().is_none());
    }

    #[test]
    fn file_uses_camel_case_layout() {
        let (_temp, storage) = setup();
        let repo = KeyRepository::new(storage.clone());
        let mint = Keypair::generate().address();
        let authority = Keypair::generate();
        repo.save(&StoredKeypair::new(mint, &authority, KeyOrigin::Regenerated))
            .unwrap();

        let raw = storage.read_raw(storage.paths().key(&mint)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["mint"], mint.to_string());
        assert_eq!(json["publicKey"], authority.address().to_string());
        assert_eq!(json["secretKey"].as_array().unwrap().len(), 64);
        assert_eq!(json["origin"], "regenerated");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn mismatched_public_key_is_rejected() {
        let mint = Keypair::generate().address();
        let mut stored = StoredKeypair::new(mint, &Keypair::generate(), KeyOrigin::Created);
        stored.public_key = Keypair::generate().address();

        assert_eq!(stored.to_keypair(), Err(KeyError::Mismatch));
    }

    #[test]
    fn debug_redacts_secret() {
        let stored = StoredKeypair::new(
            Keypair::generate().address(),
            &Keypair::generate(),
            KeyOrigin::Created,
        );
        let debug = format!("{stored:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&format!("{:?}", stored.secret_key)));
    }
}
