// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory token and key store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{KeyStore, StoredKeypair, TokenRecord, TokenStore};
use crate::ledger::Address;
use crate::storage::{StorageError, StorageResult};

/// Volatile [`TokenStore`] + [`KeyStore`].
///
/// Counts token writes and can be switched into a failing mode, which makes
/// it handy for exercising persistence paths in tests.
#[derive(Default)]
pub struct MemoryStore {
    tokens: Mutex<HashMap<Address, TokenRecord>>,
    keys: Mutex<HashMap<Address, StoredKeypair>>,
    token_writes: AtomicUsize,
    fail_writes: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful token saves so far.
    pub fn token_writes(&self) -> usize {
        self.token_writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent save fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Forget the key of `mint`, as if the key file was lost.
    pub fn remove_key(&self, mint: &Address) -> Option<StoredKeypair> {
        lock(&self.keys).remove(mint)
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("simulated write failure")));
        }
        Ok(())
    }
}

impl TokenStore for MemoryStore {
    fn load_all(&self) -> StorageResult<Vec<TokenRecord>> {
        Ok(lock(&self.tokens).values().cloned().collect())
    }

    fn save(&self, record: &TokenRecord) -> StorageResult<()> {
        self.check_writable()?;
        lock(&self.tokens).insert(record.mint, record.clone());
        self.token_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl KeyStore for MemoryStore {
    fn load(&self, mint: &Address) -> StorageResult<Option<StoredKeypair>> {
        Ok(lock(&self.keys).get(mint).cloned())
    }

    fn save(&self, key: &StoredKeypair) -> StorageResult<()> {
        self.check_writable()?;
        lock(&self.keys).insert(key.mint, key.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Keypair;
    use crate::storage::KeyOrigin;
    use chrono::Utc;

    #[test]
    fn counts_writes_and_fails_on_demand() {
        let store = MemoryStore::new();
        let record = TokenRecord {
            mint: Keypair::generate().address(),
            name: "Gold".to_string(),
            decimals: 9,
            supply: 0.0,
            balance: 0.0,
            created_at: Utc::now(),
        };

        TokenStore::save(&store, &record).unwrap();
        assert_eq!(store.token_writes(), 1);

        store.fail_writes(true);
        assert!(TokenStore::save(&store, &record).is_err());
        assert_eq!(store.token_writes(), 1);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn remove_key_forgets_it() {
        let store = MemoryStore::new();
        let mint = Keypair::generate().address();
        KeyStore::save(
            &store,
            &StoredKeypair::new(mint, &Keypair::generate(), KeyOrigin::Created),
        )
        .unwrap();

        assert!(store.load(&mint).unwrap().is_some());
        store.remove_key(&mint);
        assert!(store.load(&mint).unwrap().is_none());
    }
}
