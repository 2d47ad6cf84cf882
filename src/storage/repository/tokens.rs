// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token registry records on local storage.
//!
//! ## Storage Layout
//!
//! ```text
//! data/tokens/{mint}.json
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::TokenStore;
use crate::ledger::Address;
use crate::storage::{LocalStorage, StorageResult};

/// A token known to this manager.
///
/// `supply` and `balance` are display amounts cached from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenRecord {
    /// Mint address (base58)
    #[schema(value_type = String)]
    pub mint: Address,
    /// User-supplied display name
    pub name: String,
    /// Fixed at creation
    pub decimals: u8,
    /// Total supply
    pub supply: f64,
    /// Balance held by the connected wallet
    pub balance: f64,
    /// When the token entered the registry
    pub created_at: DateTime<Utc>,
}

/// File-backed [`TokenStore`].
pub struct TokenRepository {
    storage: Arc<LocalStorage>,
}

impl TokenRepository {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }
}

impl TokenStore for TokenRepository {
    fn load_all(&self) -> StorageResult<Vec<TokenRecord>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().tokens_dir(), "json")?;
        let mut records = Vec::with_capacity(ids.len());

        for id in &ids {
            let path = self.storage.paths().tokens_dir().join(format!("{id}.json"));
            match self.storage.read_json::<TokenRecord>(&path) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Skipping unreadable token record");
                }
            }
        }

        Ok(records)
    }

    fn save(&self, record: &TokenRecord) -> StorageResult<()> {
        self.storage
            .write_json(self.storage.paths().token(&record.mint), record)
    }
}
