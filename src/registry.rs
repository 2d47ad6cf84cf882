// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Registry
//!
//! The local list of tokens this manager knows about, with supply and
//! balance cached from the ledger. The ledger stays authoritative; the
//! registry is what the user sees between reconcile cycles.
//!
//! Every mutation is written to the [`TokenStore`] before the in-memory copy
//! changes, so a failed write leaves both sides as they were. Records whose
//! cached values did not change are not rewritten.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::ledger::Address;
use crate::storage::{StorageResult, TokenRecord, TokenStore};

/// Result of [`TokenRegistry::insert`].
#[derive(Debug, Clone, PartialEq)]
pub enum Inserted {
    Added(TokenRecord),
    /// The mint was already registered; the existing record is returned.
    AlreadyPresent(TokenRecord),
}

pub struct TokenRegistry {
    store: Arc<dyn TokenStore>,
    records: RwLock<Vec<TokenRecord>>,
}

impl TokenRegistry {
    /// Load every persisted record, ordered by creation time.
    pub fn load(store: Arc<dyn TokenStore>) -> StorageResult<Self> {
        let mut records = store.load_all()?;
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.mint.cmp(&b.mint))
        });
        debug!(count = records.len(), "Loaded token registry");

        Ok(Self {
            store,
            records: RwLock::new(records),
        })
    }

    /// Copy of every record, oldest first.
    pub async fn snapshot(&self) -> Vec<TokenRecord> {
        self.records.read().await.clone()
    }

    pub async fn get(&self, mint: &Address) -> Option<TokenRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.mint == *mint)
            .cloned()
    }

    pub async fn contains(&self, mint: &Address) -> bool {
        self.records.read().await.iter().any(|r| r.mint == *mint)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Register a token unless its mint is already known.
    ///
    /// `created_at` is strictly greater than every existing record's.
    pub async fn insert(
        &self,
        mint: Address,
        name: String,
        decimals: u8,
        supply: f64,
        balance: f64,
    ) -> StorageResult<Inserted> {
        let mut records = self.records.write().await;

        if let Some(existing) = records.iter().find(|r| r.mint == mint) {
            return Ok(Inserted::AlreadyPresent(existing.clone()));
        }

        let latest = records.iter().map(|r| r.created_at).max();
        let record = TokenRecord {
            mint,
            name,
            decimals,
            supply,
            balance,
            created_at: next_timestamp(latest),
        };

        self.store.save(&record)?;
        records.push(record.clone());
        Ok(Inserted::Added(record))
    }

    /// Update cached supply and balance from ledger values.
    ///
    /// Returns `true` when the record changed and was persisted. Unknown
    /// mints and unchanged values return `false` without writing.
    pub async fn apply_ledger_state(
        &self,
        mint: &Address,
        supply: f64,
        balance: f64,
    ) -> StorageResult<bool> {
        let mut records = self.records.write().await;
        let Some(index) = records.iter().position(|r| r.mint == *mint) else {
            return Ok(false);
        };

        if records[index].supply == supply && records[index].balance == balance {
            return Ok(false);
        }

        let mut updated = records[index].clone();
        updated.supply = supply;
        updated.balance = balance;

        self.store.save(&updated)?;
        records[index] = updated;
        Ok(true)
    }

    /// Change the display name of a token. `None` when the mint is unknown.
    pub async fn rename(&self, mint: &Address, name: String) -> StorageResult<Option<TokenRecord>> {
        let mut records = self.records.write().await;
        let Some(index) = records.iter().position(|r| r.mint == *mint) else {
            return Ok(None);
        };

        if records[index].name == name {
            return Ok(Some(records[index].clone()));
        }

        let mut updated = records[index].clone();
        updated.name = name;

        self.store.save(&updated)?;
        records[index] = updated.clone();
        Ok(Some(updated))
    }
}

fn next_timestamp(latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match latest {
        Some(latest) if now <= latest => latest + Duration::milliseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Keypair;
    use crate::storage::MemoryStore;

    fn registry() -> (Arc<MemoryStore>, TokenRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = TokenRegistry::load(store.clone()).unwrap();
        (store, registry)
    }

    fn mint() -> Address {
        Keypair::generate().address()
    }

    #[tokio::test]
    async fn insert_persists_and_rejects_duplicates() {
        let (store, registry) = registry();
        let gold = mint();

        let first = registry
            .insert(gold, "Gold".into(), 9, 0.0, 0.0)
            .await
            .unwrap();
        assert!(matches!(first, Inserted::Added(_)));
        assert_eq!(store.token_writes(), 1);

        let second = registry
            .insert(gold, "Other".into(), 6, 1.0, 1.0)
            .await
            .unwrap();
        match second {
            Inserted::AlreadyPresent(record) => assert_eq!(record.name, "Gold"),
            other => panic!("expected AlreadyPresent, got {other:?}"),
        }
        assert_eq!(store.token_writes(), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn created_at_is_strictly_increasing() {
        let (_store, registry) = registry();
        for i in 0..20 {
            registry
                .insert(mint(), format!("T{i}"), 9, 0.0, 0.0)
                .await
                .unwrap();
        }

        let snapshot = registry.snapshot().await;
        for pair in snapshot.windows(2) {
            assert!(pair[0].created_at < pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn unchanged_ledger_state_is_not_rewritten() {
        let (store, registry) = registry();
        let gold = mint();
        registry
            .insert(gold, "Gold".into(), 9, 0.0, 0.0)
            .await
            .unwrap();

        assert!(registry.apply_ledger_state(&gold, 100.0, 60.0).await.unwrap());
        assert_eq!(store.token_writes(), 2);

        assert!(!registry.apply_ledger_state(&gold, 100.0, 60.0).await.unwrap());
        assert_eq!(store.token_writes(), 2);

        assert!(!registry.apply_ledger_state(&mint(), 1.0, 1.0).await.unwrap());
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_untouched() {
        let (store, registry) = registry();
        let gold = mint();
        registry
            .insert(gold, "Gold".into(), 9, 5.0, 5.0)
            .await
            .unwrap();

        store.fail_writes(true);
        assert!(registry.apply_ledger_state(&gold, 9.0, 9.0).await.is_err());
        assert!(registry.rename(&gold, "Lead".into()).await.is_err());

        let record = registry.get(&gold).await.unwrap();
        assert_eq!(record.supply, 5.0);
        assert_eq!(record.name, "Gold");
    }

    #[tokio::test]
    async fn reload_restores_order() {
        let store = Arc::new(MemoryStore::new());
        let names = ["A", "B", "C"];
        {
            let registry = TokenRegistry::load(store.clone()).unwrap();
            for name in names {
                registry
                    .insert(mint(), name.into(), 9, 0.0, 0.0)
                    .await
                    .unwrap();
            }
        }

        let reloaded = TokenRegistry::load(store).unwrap();
        let loaded: Vec<String> = reloaded
            .snapshot()
            .await
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(loaded, names);
    }

    #[tokio::test]
    async fn rename_unknown_is_none() {
        let (_store, registry) = registry();
        assert!(registry.rename(&mint(), "X".into()).await.unwrap().is_none());
    }
}
