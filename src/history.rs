// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # History Reconstruction
//!
//! Turns raw ledger transactions touching a mint into a readable log.
//!
//! Classification looks only at the shape of the pre/post token balance
//! snapshots:
//!
//! | pre | post | kind | amount / parties |
//! |-----|------|------|------------------|
//! | 0 | 1 | `Mint` | amount and recipient from `post[0]` |
//! | 1 | 2 | `Transfer` | sender from `pre[0]`, recipient and amount from `post[1]` |
//! | other | other | `Unknown` | amount 0, no parties |
//!
//! Entries whose detail is missing or fails to load are dropped; the rest
//! keep ledger order (newest first). Nothing here is persisted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::amount::from_base_units;
use crate::ledger::{Address, LedgerGateway, LedgerResult, TokenBalanceEntry, TransactionDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Mint,
    Transfer,
    Unknown,
}

/// One reconstructed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionRecord {
    pub signature: String,
    pub kind: TransactionKind,
    /// Display amount, using the decimals reported in the snapshot
    pub amount: f64,
    /// Sending owner, for transfers
    pub from: Option<String>,
    /// Receiving owner
    pub to: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    fn unknown(signature: &str, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            signature: signature.to_string(),
            kind: TransactionKind::Unknown,
            amount: 0.0,
            from: None,
            to: None,
            timestamp,
        }
    }
}

fn display_amount(entry: &TokenBalanceEntry) -> Option<f64> {
    let raw: u64 = entry.ui_token_amount.amount.parse().ok()?;
    Some(from_base_units(raw, entry.ui_token_amount.decimals))
}

/// Classify one transaction from its balance snapshots.
pub fn classify(detail: &TransactionDetail) -> TransactionRecord {
    let timestamp = detail
        .block_time
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    let unknown = || TransactionRecord::unknown(&detail.signature, timestamp);

    let Some(meta) = detail.meta.as_ref() else {
        return unknown();
    };
    let pre = meta.pre_token_balances.as_deref().unwrap_or_default();
    let post = meta.post_token_balances.as_deref().unwrap_or_default();

    match (pre.len(), post.len()) {
        (0, 1) => match display_amount(&post[0]) {
            Some(amount) => TransactionRecord {
                signature: detail.signature.clone(),
                kind: TransactionKind::Mint,
                amount,
                from: None,
                to: post[0].owner.clone(),
                timestamp,
            },
            None => unknown(),
        },
        (1, 2) => match display_amount(&post[1]) {
            Some(amount) => TransactionRecord {
                signature: detail.signature.clone(),
                kind: TransactionKind::Transfer,
                amount,
                from: pre[0].owner.clone(),
                to: post[1].owner.clone(),
                timestamp,
            },
            None => unknown(),
        },
        _ => unknown(),
    }
}

/// Fetches and classifies the recent transactions of a mint.
#[derive(Clone)]
pub struct HistoryReconstructor {
    ledger: Arc<dyn LedgerGateway>,
    limit: usize,
}

impl HistoryReconstructor {
    pub fn new(ledger: Arc<dyn LedgerGateway>, limit: usize) -> Self {
        Self { ledger, limit }
    }

    /// Up to `limit` most recent transactions touching `mint`, newest first.
    ///
    /// Only the signature listing can fail; per-transaction failures drop
    /// that entry.
    pub async fn reconstruct(&self, mint: &Address) -> LedgerResult<Vec<TransactionRecord>> {
        let signatures = self
            .ledger
            .get_signatures_for_address(mint, self.limit)
            .await?;

        let details = join_all(
            signatures
                .iter()
                .map(|info| self.ledger.get_transaction_detail(&info.signature)),
        )
        .await;

        let records: Vec<TransactionRecord> = signatures
            .iter()
            .zip(details)
            .filter_map(|(info, detail)| match detail {
                Ok(Some(mut detail)) => {
                    if detail.block_time.is_none() {
                        detail.block_time = info.block_time;
                    }
                    Some(classify(&detail))
                }
                Ok(None) => {
                    debug!(signature = %info.signature, "Transaction detail unavailable, skipping");
                    None
                }
                Err(e) => {
                    warn!(
                        mint = %mint,
                        signature = %info.signature,
                        error = %e,
                        "Failed to fetch transaction detail"
                    );
                    None
                }
            })
            .collect();

        debug!(
            mint = %mint,
            listed = signatures.len(),
            kept = records.len(),
            "Reconstructed history"
        );
        Ok(records)
    }
}
