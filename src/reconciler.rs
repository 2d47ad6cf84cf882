// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Balance Reconciler
//!
//! Background task that keeps the token registry in step with the ledger
//! while a wallet is connected.
//!
//! ## Strategy
//!
//! Every `interval` (default 30 s) the reconciler:
//! 1. Refreshes the connected wallet's native balance.
//! 2. Takes a snapshot of the registry.
//! 3. For each token, under that token's lock, re-reads supply from the mint
//!    and the wallet's balance from its derived holding account (a missing
//!    account reads as 0), then writes the record only if a value changed.
//!
//! A failing token keeps its cached values; the cycle moves on.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`. Dropping the
//! [`ReconcilerHandle`] cancels the task.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::amount::from_base_units;
use crate::ledger::{Address, LedgerError, LedgerGateway, LedgerResult, MintInfo};
use crate::lifecycle::{TokenError, TokenLocks};
use crate::registry::TokenRegistry;

/// Outcome of one reconcile cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReconcileReport {
    /// Records whose supply or balance changed
    pub updated: usize,
    pub unchanged: usize,
    /// Records left as they were because the ledger could not be read
    pub failed: usize,
    /// Native balance of the wallet in lamports, if it could be read
    pub native_balance: Option<u64>,
}

/// Read supply and the owner's holding balance of `mint`, in base units.
pub(crate) async fn fetch_ledger_state(
    ledger: &dyn LedgerGateway,
    mint: &Address,
    owner: &Address,
) -> LedgerResult<(MintInfo, u64)> {
    let info = ledger.get_mint_info(mint).await?;
    let holding = ledger.holding_account_address(mint, owner);
    let balance = match ledger.get_account_info(&holding).await {
        Ok(account) => account.amount,
        Err(LedgerError::AccountNotFound(_)) => 0,
        Err(e) => return Err(e),
    };
    Ok((info, balance))
}

/// Refresh one registry record from the ledger. The caller holds the lock.
///
/// Returns whether the record changed.
pub(crate) async fn sync_token(
    ledger: &dyn LedgerGateway,
    registry: &TokenRegistry,
    mint: &Address,
    owner: &Address,
) -> Result<bool, TokenError> {
    let (info, balance) = fetch_ledger_state(ledger, mint, owner)
        .await
        .map_err(|e| TokenError::ledger("refresh", e))?;

    let changed = registry
        .apply_ledger_state(
            mint,
            from_base_units(info.supply, info.decimals),
            from_base_units(balance, info.decimals),
        )
        .await?;
    Ok(changed)
}

/// Periodic re-synchronization of the registry for one wallet.
#[derive(Clone)]
pub struct BalanceReconciler {
    ledger: Arc<dyn LedgerGateway>,
    registry: Arc<TokenRegistry>,
    locks: Arc<TokenLocks>,
    native_balance: Arc<RwLock<Option<u64>>>,
    owner: Address,
    interval: Duration,
}

impl BalanceReconciler {
    pub fn new(
        ledger: Arc<dyn LedgerGateway>,
        registry: Arc<TokenRegistry>,
        locks: Arc<TokenLocks>,
        native_balance: Arc<RwLock<Option<u64>>>,
        owner: Address,
        interval: Duration,
    ) -> Self {
        Self {
            ledger,
            registry,
            locks,
            native_balance,
            owner,
            interval,
        }
    }

    /// Run one full cycle.
    pub async fn reconcile_once(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        match self.ledger.get_balance(&self.owner).await {
            Ok(lamports) => {
                *self.native_balance.write().await = Some(lamports);
                report.native_balance = Some(lamports);
            }
            Err(e) => {
                warn!(wallet = %self.owner, error = %e, "Failed to refresh native balance");
            }
        }

        let tokens = self.registry.snapshot().await;
        if tokens.is_empty() {
            return report;
        }

        for token in &tokens {
            let _guard = self.locks.acquire(&token.mint).await;
            match sync_token(
                self.ledger.as_ref(),
                &self.registry,
                &token.mint,
                &self.owner,
            )
            .await
            {
                Ok(true) => report.updated += 1,
                Ok(false) => report.unchanged += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(mint = %token.mint, error = %e, "Reconciler: failed to refresh token");
                }
            }
        }

        debug!(
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed,
            "Reconcile cycle complete"
        );
        report
    }

    /// Run the loop until the cancellation token is triggered.
    ///
    /// The first cycle runs one `interval` after start; callers that need
    /// fresh state immediately run [`reconcile_once`](Self::reconcile_once).
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            wallet = %self.owner,
            interval_secs = self.interval.as_secs(),
            "Balance reconciler starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!(wallet = %self.owner, "Balance reconciler shutting down");
                    return;
                }
            }

            if shutdown.is_cancelled() {
                info!(wallet = %self.owner, "Balance reconciler shutting down");
                return;
            }

            self.reconcile_once().await;
        }
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self) -> ReconcilerHandle {
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.run(shutdown.clone()));
        ReconcilerHandle {
            shutdown,
            task: Some(task),
        }
    }
}

/// Owner of a running reconciler task.
pub struct ReconcilerHandle {
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Cancel the task and wait for it to exit.
    pub async fn stop(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Balance reconciler task ended abnormally");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
