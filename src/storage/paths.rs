// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Where each kind of record lives under the data directory.

use std::path::{Path, PathBuf};

use crate::ledger::Address;

/// Data directory used when `DATA_DIR` is unset, relative to the working dir.
pub const DATA_ROOT: &str = "data";

#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Token Registry ==========

    pub fn tokens_dir(&self) -> PathBuf {
        self.root.join("tokens")
    }

    /// Path to the record of one token.
    pub fn token(&self, mint: &Address) -> PathBuf {
        self.tokens_dir().join(format!("{mint}.json"))
    }

    // ========== Key Vault ==========

    pub fn keys_dir(&self) -> PathBuf {
        self.root.join("keys")
    }

    /// Path to the authority keypair of one token.
    pub fn key(&self, mint: &Address) -> PathBuf {
        self.keys_dir().join(format!("{mint}.json"))
    }

    // ========== Audit Log ==========

    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// One directory per day, named `YYYY-MM-DD`.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}
