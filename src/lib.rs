// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Token Manager - Token Lifecycle & Key Custody Service
//!
//! Creates SPL-style token mints, keeps custody of their mint authority
//! keys, mints and transfers supply for a connected wallet, and keeps a
//! local token registry reconciled against the ledger.
//!
//! ## Modules
//!
//! - `lifecycle` - Token creation, minting, transfers and authority recovery
//! - `vault` - Mint authority key custody
//! - `registry` - Persisted token list with cached supply and balance
//! - `reconciler` - Periodic registry refresh from the ledger
//! - `history` - Transaction history reconstruction
//! - `ledger` - Ledger gateway trait, keys and an in-process ledger
//! - `storage` - JSON file storage, repositories and the audit log
//! - `api` - HTTP API handlers (Axum)

pub mod amount;
pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod ledger;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod reconciler;
pub mod registry;
pub mod state;
pub mod storage;
pub mod vault;
