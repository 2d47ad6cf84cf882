// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-token serialization.
//!
//! Operations on the same mint run one at a time; operations on different
//! mints run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::ledger::Address;

#[derive(Default)]
pub struct TokenLocks {
    locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

impl TokenLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lock for a specific mint.
    async fn lock_for(&self, mint: &Address) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(*mint)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `mint`. Released when the guard drops.
    pub async fn acquire(&self, mint: &Address) -> OwnedMutexGuard<()> {
        self.lock_for(mint).await.lock_owned().await
    }

    /// Drop locks nobody is holding or waiting on.
    pub async fn cleanup(&self) {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of mints with a lock entry.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
