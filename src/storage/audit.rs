// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for custody-sensitive operations.
//!
//! Authority key creation and regeneration, token creation and import,
//! minting, transfers and wallet sessions are appended to a daily JSONL file.
//! Key material never appears in an event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LocalStorage, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Custody
    AuthorityCreated,
    AuthorityRegenerated,

    // Tokens
    TokenCreated,
    TokenImported,
    TokenRenamed,
    TokensMinted,
    TokensTransferred,

    // Session
    WalletConnected,
    WalletDisconnected,
}

/// One line of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    /// Wallet connected when the event happened
    pub wallet: Option<String>,
    pub mint: Option<String>,
    /// Free-form context such as amounts and signatures
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    pub success: bool,
    pub error: Option<String>,
}

/// Day bucket of the log file an event lands in.
fn day_of(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            wallet: None,
            mint: None,
            details: None,
            success: true,
            error: None,
        }
    }

    pub fn with_wallet(mut self, wallet: impl ToString) -> Self {
        self.wallet = Some(wallet.to_string());
        self
    }

    pub fn with_mint(mut self, mint: impl ToString) -> Self {
        self.mint = Some(mint.to_string());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Record the operation as failed with `reason`.
    pub fn failed(self, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            ..self
        }
    }
}

/// Daily JSONL files under `audit/`.
pub struct AuditRepository<'a> {
    storage: &'a LocalStorage,
}

impl<'a> AuditRepository<'a> {
    pub fn new(storage: &'a LocalStorage) -> Self {
        Self { storage }
    }

    /// Append `event` to the file of its day.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let line = serde_json::to_string(event)?;
        let path = self.storage.paths().audit_events_file(&day_of(&event.timestamp));
        self.storage.append_line(path, &line)
    }

    /// Every event logged on `date` (`YYYY-MM-DD`), oldest first.
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let raw = self
            .storage
            .read_raw(self.storage.paths().audit_events_file(date))?;

        serde_json::Deserializer::from_slice(&raw)
            .into_iter::<AuditEvent>()
            .map(|event| {
                event.map_err(|e| StorageError::Malformed(format!("audit log for {date}: {e}")))
            })
            .collect()
    }

    /// Events of `date` that touch `mint`.
    pub fn search_by_mint(&self, mint: &str, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let mut events = self.read_events(date)?;
        events.retain(|event| event.mint.as_deref() == Some(mint));
        Ok(events)
    }
}
