// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to persisted state.
//!
//! The manager only sees [`TokenStore`] and [`KeyStore`]. The file-backed
//! repositories write through [`LocalStorage`](super::LocalStorage); the
//! in-memory store backs tests and throwaway sessions.

pub mod keys;
pub mod memory;
pub mod tokens;

pub use keys::{KeyOrigin, KeyRepository, StoredKeypair};
pub use memory::MemoryStore;
pub use tokens::{TokenRecord, TokenRepository};

use super::StorageResult;
use crate::ledger::Address;

/// Durable list of token records.
pub trait TokenStore: Send + Sync {
    /// Every persisted record, in no particular order.
    fn load_all(&self) -> StorageResult<Vec<TokenRecord>>;

    /// Insert or overwrite the record for `record.mint`.
    fn save(&self, record: &TokenRecord) -> StorageResult<()>;
}

/// Durable per-mint authority keypairs.
pub trait KeyStore: Send + Sync {
    /// The stored keypair for `mint`, or `None` when nothing is stored.
    fn load(&self, mint: &Address) -> StorageResult<Option<StoredKeypair>>;

    /// Insert or overwrite the keypair for `key.mint`.
    fn save(&self, key: &StoredKeypair) -> StorageResult<()>;
}
