// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Storage Module
//!
//! Persistent state lives in plain JSON files under the data directory
//! (`DATA_DIR`, default `./data`).
//!
//! ## Storage Layout
//!
//! ```text
//! data/
//!   tokens/
//!     {mint}.json           # Token registry record
//!   keys/
//!     {mint}.json           # Mint authority keypair (mode 0600, NEVER exposed via API)
//!   audit/
//!     {date}/events.jsonl   # Daily custody audit log
//! ```
//!
//! ## Important Notes
//!
//! - Every write is atomic (temp file + rename)
//! - Secrets are NOT encrypted at rest; protect the data directory
//! - The manager talks to the [`TokenStore`] / [`KeyStore`] traits only

pub mod audit;
pub mod local_fs;
pub mod paths;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use local_fs::{LocalStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{
    KeyOrigin, KeyRepository, KeyStore, MemoryStore, StoredKeypair, TokenRecord, TokenRepository,
    TokenStore,
};
