// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key Vault
//!
//! Custody of mint authority keypairs, one per token.
//!
//! Absence is not an error: [`KeyVault::retrieve`] returns `Ok(None)` and the
//! caller decides whether to regenerate. A regenerated keypair is a new
//! authority; it does not restore control over a mint whose original
//! authority was lost.

use std::sync::Arc;

use tracing::{info, warn};

use crate::ledger::{Address, KeyError, Keypair};
use crate::storage::{KeyOrigin, KeyStore, StorageError, StoredKeypair};

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("key storage failed: {0}")]
    Storage(#[from] StorageError),

    /// The stored record exists but does not form a usable keypair.
    #[error("stored key for {mint} is corrupt: {reason}")]
    CorruptKey { mint: Address, reason: KeyError },
}

/// A keypair together with how it was produced.
#[derive(Debug, Clone)]
pub struct VaultEntry {
    pub keypair: Keypair,
    pub origin: KeyOrigin,
}

/// Per-token signing key custody on top of a [`KeyStore`].
#[derive(Clone)]
pub struct KeyVault {
    store: Arc<dyn KeyStore>,
}

impl KeyVault {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Persist `keypair` as the authority of `mint`, replacing any prior one.
    pub fn store(
        &self,
        mint: &Address,
        keypair: &Keypair,
        origin: KeyOrigin,
    ) -> Result<(), VaultError> {
        self.store
            .save(&StoredKeypair::new(*mint, keypair, origin))?;
        info!(mint = %mint, authority = %keypair.address(), ?origin, "Stored mint authority");
        Ok(())
    }

    /// The authority of `mint`, or `None` when nothing is stored.
    pub fn retrieve(&self, mint: &Address) -> Result<Option<Keypair>, VaultError> {
        Ok(self.retrieve_entry(mint)?.map(|entry| entry.keypair))
    }

    /// Like [`retrieve`](Self::retrieve), keeping the origin.
    pub fn retrieve_entry(&self, mint: &Address) -> Result<Option<VaultEntry>, VaultError> {
        let Some(stored) = self.store.load(mint)? else {
            return Ok(None);
        };

        let keypair = stored.to_keypair().map_err(|reason| {
            warn!(mint = %mint, error = %reason, "Stored mint authority is unusable");
            VaultError::CorruptKey {
                mint: *mint,
                reason,
            }
        })?;

        Ok(Some(VaultEntry {
            keypair,
            origin: stored.origin,
        }))
    }

    /// Install a freshly generated `keypair` as the authority of `mint`.
    pub fn regenerate(&self, mint: &Address, keypair: Keypair) -> Result<Keypair, VaultError> {
        self.store(mint, &keypair, KeyOrigin::Regenerated)?;
        warn!(
            mint = %mint,
            authority = %keypair.address(),
            "Regenerated mint authority; the original authority is not recoverable"
        );
        Ok(keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn vault() -> (Arc<MemoryStore>, KeyVault) {
        let store = Arc::new(MemoryStore::new());
        let vault = KeyVault::new(store.clone());
        (store, vault)
    }

    #[test]
    fn retrieve_absent_is_none() {
        let (_store, vault) = vault();
        assert!(vault
            .retrieve(&Keypair::generate().address())
            .unwrap()
            .is_none());
    }

    #[test]
    fn store_then_retrieve() {
        let (_store, vault) = vault();
        let mint = Keypair::generate().address();
        let authority = Keypair::generate();

        vault.store(&mint, &authority, KeyOrigin::Created).unwrap();

        let entry = vault.retrieve_entry(&mint).unwrap().unwrap();
        assert_eq!(entry.keypair, authority);
        assert_eq!(entry.origin, KeyOrigin::Created);
    }

    #[test]
    fn regenerate_overwrites_with_new_authority() {
        let (_store, vault) = vault();
        let mint = Keypair::generate().address();
        let original = Keypair::generate();
        vault.store(&mint, &original, KeyOrigin::Created).unwrap();

        let fresh = vault.regenerate(&mint, Keypair::generate()).unwrap();
        assert_ne!(fresh, original);

        let entry = vault.retrieve_entry(&mint).unwrap().unwrap();
        assert_eq!(entry.keypair, fresh);
        assert_eq!(entry.origin, KeyOrigin::Regenerated);
    }

    #[test]
    fn corrupt_record_is_reported() {
        let (store, vault) = vault();
        let mint = Keypair::generate().address();
        let mut stored = StoredKeypair::new(mint, &Keypair::generate(), KeyOrigin::Created);
        stored.secret_key.truncate(10);
        KeyStore::save(store.as_ref(), &stored).unwrap();

        let result = vault.retrieve(&mint);
        assert!(matches!(
            result,
            Err(VaultError::CorruptKey {
                reason: KeyError::InvalidLength(10),
                ..
            })
        ));
    }

    #[test]
    fn storage_failure_is_fatal() {
        let (store, vault) = vault();
        store.fail_writes(true);
        let result = vault.regenerate(&Keypair::generate().address(), Keypair::generate());
        assert!(matches!(result, Err(VaultError::Storage(_))));
    }
}
