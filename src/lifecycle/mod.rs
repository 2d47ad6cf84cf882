// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Lifecycle Manager
//!
//! Orchestrates token creation, minting, transfers and mint authority
//! recovery for the connected wallet.
//!
//! ## Per-token States
//!
//! ```text
//! Uninitialized -> Creating -> Active(Known)
//!                                 |
//!                    key missing  v
//!                             Active(Lost) -- mint --> Active(Recovered)
//! ```
//!
//! `Active(Lost)` means the registry knows the token but the vault holds no
//! usable authority. The next mint regenerates one. The new key becomes the
//! custodied authority, but it does not regain on-chain control of a mint
//! whose original authority was lost; a ledger that enforces authorities
//! rejects it with [`TokenError::AuthorityRejected`].
//!
//! ## Ordering
//!
//! - Validation happens before any ledger call.
//! - Every operation on a mint holds that mint's lock from its first
//!   ledger call to its last registry write.
//! - A new authority is persisted right after its mint exists.

pub mod error;
pub mod flags;
pub mod locks;


use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use utoipa::ToSchema;

pub use error::{parse_address, ErrorKind, TokenError};
pub use flags::{InProgress, OperationFlags, OperationKind};
pub use locks::TokenLocks;

use crate::amount::{from_base_units, to_base_units, MAX_DECIMALS};
use crate::config::ManagerConfig;
use crate::history::{HistoryReconstructor, TransactionRecord};
use crate::ledger::{Address, Keypair, LedgerError, LedgerGateway, Payer};
use crate::reconciler::{self, BalanceReconciler, ReconcileReport, ReconcilerHandle};
use crate::registry::{Inserted, TokenRegistry};
use crate::storage::{
    AuditEvent, AuditEventType, AuditRepository, KeyOrigin, KeyStore, LocalStorage,
    StorageResult, TokenRecord, TokenStore,
};
use crate::vault::{KeyVault, VaultError};

/// Whether the vault holds a usable authority for a registered token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityStatus {
    /// The authority generated at creation.
    Known,
    /// No usable key; the next mint regenerates one.
    Lost,
    /// A regenerated key is in custody.
    Recovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Creating,
    Active(AuthorityStatus),
}

impl LifecycleState {
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Creating => "creating",
            LifecycleState::Active(_) => "active",
        }
    }

    pub fn authority(&self) -> Option<AuthorityStatus> {
        match self {
            LifecycleState::Active(status) => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MintOutcome {
    pub signature: String,
    pub amount: f64,
    /// The authority was regenerated during this call.
    pub authority_regenerated: bool,
    pub token: TokenRecord,
}

impl MintOutcome {
    /// Succeeded, but only after replacing a lost authority.
    pub fn is_degraded(&self) -> bool {
        self.authority_regenerated
    }
}

#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub signature: String,
    pub amount: f64,
    pub recipient: Address,
    pub token: TokenRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddTokenOutcome {
    Added(TokenRecord),
    /// Informational: the mint was already registered.
    AlreadyPresent(TokenRecord),
}

struct WalletSession {
    address: Address,
    reconciler: ReconcilerHandle,
}

/// Removes a mint from the creating set when creation ends either way.
struct CreatingGuard<'a> {
    creating: &'a Mutex<HashSet<Address>>,
    mint: Address,
}

impl Drop for CreatingGuard<'_> {
    fn drop(&mut self) {
        lock_set(self.creating).remove(&self.mint);
    }
}

fn lock_set(set: &Mutex<HashSet<Address>>) -> std::sync::MutexGuard<'_, HashSet<Address>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct TokenLifecycleManager {
    ledger: Arc<dyn LedgerGateway>,
    vault: KeyVault,
    registry: Arc<TokenRegistry>,
    locks: Arc<TokenLocks>,
    flags: OperationFlags,
    history: HistoryReconstructor,
    session: RwLock<Option<WalletSession>>,
    native_balance: Arc<RwLock<Option<u64>>>,
    creating: Mutex<HashSet<Address>>,
    audit: Option<Arc<LocalStorage>>,
    config: ManagerConfig,
}

impl TokenLifecycleManager {
    /// Build a manager, loading the registry from `tokens`.
    pub fn new(
        ledger: Arc<dyn LedgerGateway>,
        tokens: Arc<dyn TokenStore>,
        keys: Arc<dyn KeyStore>,
        config: ManagerConfig,
    ) -> StorageResult<Self> {
        let registry = Arc::new(TokenRegistry::load(tokens)?);
        let history = HistoryReconstructor::new(ledger.clone(), config.history_limit);

        Ok(Self {
            ledger,
            vault: KeyVault::new(keys),
            registry,
            locks: Arc::new(TokenLocks::new()),
            flags: OperationFlags::default(),
            history,
            session: RwLock::new(None),
            native_balance: Arc::new(RwLock::new(None)),
            creating: Mutex::new(HashSet::new()),
            audit: None,
            config,
        })
    }

    /// Record custody events in the audit log of `storage`.
    pub fn with_audit(mut self, storage: Arc<LocalStorage>) -> Self {
        self.audit = Some(storage);
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    fn audit(&self, event: AuditEvent) {
        if let Some(storage) = &self.audit {
            if let Err(e) = AuditRepository::new(storage).log(&event) {
                warn!(error = %e, event_type = ?event.event_type, "Failed to write audit event");
            }
        }
    }

    async fn require_wallet(&self) -> Result<Address, TokenError> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.address)
            .ok_or(TokenError::WalletNotConnected)
    }

    async fn require_token(&self, mint: &Address) -> Result<TokenRecord, TokenError> {
        self.registry
            .get(mint)
            .await
            .ok_or(TokenError::UnknownToken(*mint))
    }

    fn reconciler_for(&self, owner: Address) -> BalanceReconciler {
        BalanceReconciler::new(
            self.ledger.clone(),
            self.registry.clone(),
            self.locks.clone(),
            self.native_balance.clone(),
            owner,
            self.config.reconcile_interval,
        )
    }

    // ========== Wallet Session ==========

    /// Connect `address` as the active wallet.
    ///
    /// Runs one reconcile cycle immediately, then keeps reconciling in the
    /// background until disconnect. A previous session is replaced.
    pub async fn connect_wallet(&self, address: &str) -> Result<ReconcileReport, TokenError> {
        let address = parse_address(address)?;
        let reconciler = self.reconciler_for(address);

        let previous = {
            let mut session = self.session.write().await;
            session.replace(WalletSession {
                address,
                reconciler: reconciler.clone().spawn(),
            })
        };
        if let Some(previous) = previous {
            info!(wallet = %previous.address, "Replacing wallet session");
            previous.reconciler.stop().await;
        }

        let report = reconciler.reconcile_once().await;
        let tokens = self.registry.len().await;
        info!(wallet = %address, tokens, "Wallet connected");
        self.audit(AuditEvent::new(AuditEventType::WalletConnected).with_wallet(address));
        Ok(report)
    }

    /// End the wallet session and stop background reconciliation.
    pub async fn disconnect_wallet(&self) -> Option<Address> {
        let session = self.session.write().await.take()?;
        session.reconciler.stop().await;
        *self.native_balance.write().await = None;

        info!(wallet = %session.address, "Wallet disconnected");
        self.audit(AuditEvent::new(AuditEventType::WalletDisconnected).with_wallet(session.address));
        Some(session.address)
    }

    pub async fn connected_wallet(&self) -> Option<Address> {
        self.session.read().await.as_ref().map(|s| s.address)
    }

    /// Native balance of the connected wallet in lamports, read fresh.
    pub async fn wallet_balance(&self) -> Result<u64, TokenError> {
        let owner = self.require_wallet().await?;
        let lamports = self
            .ledger
            .get_balance(&owner)
            .await
            .map_err(|e| TokenError::ledger("get_balance", e))?;
        *self.native_balance.write().await = Some(lamports);
        Ok(lamports)
    }

    /// Last native balance seen by a refresh, without a ledger call.
    pub async fn cached_wallet_balance(&self) -> Option<u64> {
        *self.native_balance.read().await
    }

    // ========== Token Creation ==========

    /// Create a new token owned by the connected wallet.
    ///
    /// `decimals` defaults to the configured precision.
    pub async fn create_token(
        &self,
        name: &str,
        decimals: Option<u8>,
    ) -> Result<TokenRecord, TokenError> {
        let _flag = self.flags.begin(OperationKind::CreateToken);

        let owner = self.require_wallet().await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(TokenError::EmptyName);
        }
        let decimals = decimals.unwrap_or(self.config.default_decimals);
        if decimals > MAX_DECIMALS {
            return Err(TokenError::InvalidDecimals {
                got: decimals,
                max: MAX_DECIMALS,
            });
        }

        let available = self
            .ledger
            .get_balance(&owner)
            .await
            .map_err(|e| TokenError::ledger("get_balance", e))?;
        *self.native_balance.write().await = Some(available);
        if available < self.config.min_creation_lamports {
            warn!(
                wallet = %owner,
                available,
                required = self.config.min_creation_lamports,
                "Insufficient balance to create token"
            );
            return Err(TokenError::InsufficientFunds {
                required: self.config.min_creation_lamports,
                available,
            });
        }

        let authority = Keypair::generate();
        info!(wallet = %owner, authority = %authority.address(), token_name = name, decimals, "Creating token");
        self.fund_authority(&authority).await?;

        let mint = self
            .ledger
            .create_mint(
                &authority,
                &authority.address(),
                Some(&authority.address()),
                decimals,
            )
            .await
            .map_err(|e| TokenError::ledger("create_mint", e))?;

        lock_set(&self.creating).insert(mint);
        let _creating = CreatingGuard {
            creating: &self.creating,
            mint,
        };
        let _guard = self.locks.acquire(&mint).await;

        self.vault.store(&mint, &authority, KeyOrigin::Created)?;
        self.audit(
            AuditEvent::new(AuditEventType::AuthorityCreated)
                .with_wallet(owner)
                .with_mint(mint)
                .with_details(serde_json::json!({ "authority": authority.address().to_string() })),
        );

        self.ledger
            .get_or_create_holding_account(Payer::Authority(&authority), &mint, &owner)
            .await
            .map_err(|e| TokenError::ledger("create_holding_account", e))?;

        let record = match self
            .registry
            .insert(mint, name.to_string(), decimals, 0.0, 0.0)
            .await?
        {
            Inserted::Added(record) | Inserted::AlreadyPresent(record) => record,
        };

        info!(mint = %mint, name = %record.name, "Token created");
        self.audit(
            AuditEvent::new(AuditEventType::TokenCreated)
                .with_wallet(owner)
                .with_mint(mint)
                .with_details(serde_json::json!({ "name": record.name, "decimals": decimals })),
        );
        Ok(record)
    }

    /// Ask the faucet to fund `authority` and wait for confirmation.
    async fn fund_authority(&self, authority: &Keypair) -> Result<(), TokenError> {
        let address = authority.address();
        let signature = self
            .ledger
            .request_funding(&address, self.config.funding_lamports)
            .await
            .map_err(|e| match e {
                LedgerError::RateLimited(detail) => {
                    warn!(authority = %address, detail, "Faucet rate limited");
                    TokenError::RateLimited { address }
                }
                other => TokenError::ledger("request_funding", other),
            })?;
        self.ledger
            .confirm_transaction(&signature)
            .await
            .map_err(|e| TokenError::ledger("confirm_funding", e))
    }

    // ========== Minting ==========

    /// Resolve the custodied authority, regenerating it when it is lost.
    ///
    /// Returns the keypair and whether it was regenerated by this call.
    async fn resolve_authority(&self, mint: &Address) -> Result<(Keypair, bool), TokenError> {
        match self.vault.retrieve(mint) {
            Ok(Some(keypair)) => return Ok((keypair, false)),
            Ok(None) => {
                warn!(mint = %mint, "No mint authority in custody, regenerating");
            }
            Err(VaultError::CorruptKey { reason, .. }) => {
                warn!(mint = %mint, error = %reason, "Mint authority unusable, regenerating");
            }
            Err(e) => return Err(e.into()),
        }

        // Funded before custody so a faucet failure leaves the token Lost.
        let candidate = Keypair::generate();
        self.fund_authority(&candidate).await?;

        let keypair = self.vault.regenerate(mint, candidate)?;
        self.audit(
            AuditEvent::new(AuditEventType::AuthorityRegenerated)
                .with_mint(mint)
                .with_details(serde_json::json!({ "authority": keypair.address().to_string() })),
        );
        Ok((keypair, true))
    }

    /// Mint `amount` (display units) into the connected wallet.
    pub async fn mint_tokens(&self, mint: &Address, amount: f64) -> Result<MintOutcome, TokenError> {
        let _flag = self.flags.begin(OperationKind::MintTokens);

        let owner = self.require_wallet().await?;
        let record = self.require_token(mint).await?;
        let raw = to_base_units(amount, record.decimals)?;

        let _guard = self.locks.acquire(mint).await;
        let (authority, regenerated) = self.resolve_authority(mint).await?;

        let account = self
            .ledger
            .get_or_create_holding_account(Payer::Authority(&authority), mint, &owner)
            .await
            .map_err(|e| TokenError::ledger("create_holding_account", e))?;

        let signature = match self
            .ledger
            .mint_to(&authority, mint, &account.address, raw)
            .await
        {
            Ok(signature) => signature,
            Err(e) => {
                self.audit(
                    AuditEvent::new(AuditEventType::TokensMinted)
                        .with_wallet(owner)
                        .with_mint(mint)
                        .failed(e.to_string()),
                );
                return Err(match e {
                    LedgerError::AuthorityMismatch { .. } => {
                        warn!(mint = %mint, authority = %authority.address(), "Ledger rejected mint authority");
                        TokenError::AuthorityRejected { mint: *mint }
                    }
                    other => TokenError::ledger("mint_to", other),
                });
            }
        };
        self.ledger
            .confirm_transaction(&signature)
            .await
            .map_err(|e| TokenError::ledger("confirm_mint", e))?;

        let token = self.refresh_locked(&record, &owner).await;
        info!(mint = %mint, amount, %signature, regenerated, "Minted tokens");
        self.audit(
            AuditEvent::new(AuditEventType::TokensMinted)
                .with_wallet(owner)
                .with_mint(mint)
                .with_details(serde_json::json!({
                    "amount": amount,
                    "signature": signature,
                    "authority_regenerated": regenerated,
                })),
        );

        Ok(MintOutcome {
            signature,
            amount,
            authority_regenerated: regenerated,
            token,
        })
    }

    // ========== Transfers ==========

    /// Send `amount` (display units) from the connected wallet to `recipient`.
    ///
    /// Fees and rent are paid by the custodied authority when there is one,
    /// otherwise by the wallet. A lost authority is not regenerated here.
    pub async fn transfer_tokens(
        &self,
        mint: &Address,
        recipient: &str,
        amount: f64,
    ) -> Result<TransferOutcome, TokenError> {
        let _flag = self.flags.begin(OperationKind::TransferTokens);

        let owner = self.require_wallet().await?;
        let record = self.require_token(mint).await?;
        let recipient = parse_address(recipient)?;
        let raw = to_base_units(amount, record.decimals)?;

        let _guard = self.locks.acquire(mint).await;
        let authority = match self.vault.retrieve(mint) {
            Ok(authority) => authority,
            Err(VaultError::CorruptKey { reason, .. }) => {
                warn!(mint = %mint, error = %reason, "Mint authority unusable, wallet pays fees");
                None
            }
            Err(e) => return Err(e.into()),
        };
        let payer = match &authority {
            Some(keypair) => Payer::Authority(keypair),
            None => Payer::Wallet(owner),
        };

        let source = self
            .ledger
            .get_or_create_holding_account(payer, mint, &owner)
            .await
            .map_err(|e| TokenError::ledger("create_holding_account", e))?;
        if source.amount < raw {
            return Err(TokenError::InsufficientTokenBalance {
                available: from_base_units(source.amount, record.decimals),
                requested: amount,
            });
        }

        let destination = self
            .ledger
            .get_or_create_holding_account(payer, mint, &recipient)
            .await
            .map_err(|e| match e {
                LedgerError::InsufficientFunds(detail) => TokenError::InsufficientFeeBalance(detail),
                other => {
                    warn!(mint = %mint, recipient = %recipient, error = %other, "Destination account creation failed");
                    TokenError::DestinationAccountCreation {
                        recipient,
                        reason: other.to_string(),
                    }
                }
            })?;

        let signature = self
            .ledger
            .transfer(payer, &source.address, &destination.address, &owner, raw)
            .await
            .map_err(|e| match e {
                LedgerError::InsufficientTokenBalance {
                    available,
                    requested,
                } => TokenError::InsufficientTokenBalance {
                    available: from_base_units(available, record.decimals),
                    requested: from_base_units(requested, record.decimals),
                },
                other => TokenError::ledger("transfer", other),
            })?;
        self.ledger
            .confirm_transaction(&signature)
            .await
            .map_err(|e| TokenError::ledger("confirm_transfer", e))?;

        let token = self.refresh_locked(&record, &owner).await;
        info!(mint = %mint, recipient = %recipient, amount, %signature, "Transferred tokens");
        self.audit(
            AuditEvent::new(AuditEventType::TokensTransferred)
                .with_wallet(owner)
                .with_mint(mint)
                .with_details(serde_json::json!({
                    "amount": amount,
                    "recipient": recipient.to_string(),
                    "signature": signature,
                })),
        );

        Ok(TransferOutcome {
            signature,
            amount,
            recipient,
            token,
        })
    }

    // ========== Registry Operations ==========

    /// Register a token created elsewhere.
    ///
    /// An empty `name` becomes `Token N`. The wallet's holding account is
    /// looked up, never created.
    pub async fn add_existing_token(
        &self,
        mint: &str,
        name: &str,
    ) -> Result<AddTokenOutcome, TokenError> {
        let _flag = self.flags.begin(OperationKind::AddToken);

        let owner = self.require_wallet().await?;
        let mint = parse_address(mint)?;
        if let Some(existing) = self.registry.get(&mint).await {
            info!(mint = %mint, "Token already registered");
            return Ok(AddTokenOutcome::AlreadyPresent(existing));
        }

        let guard = self.locks.acquire(&mint).await;
        let (info, balance) =
            match reconciler::fetch_ledger_state(self.ledger.as_ref(), &mint, &owner).await {
                Ok(state) => state,
                Err(e) => {
                    drop(guard);
                    self.locks.cleanup().await;
                    return Err(match e {
                        LedgerError::AccountNotFound(_) => TokenError::UnknownMint(mint),
                        other => TokenError::ledger("get_mint_info", other),
                    });
                }
            };

        let name = match name.trim() {
            "" => format!("Token {}", self.registry.len().await + 1),
            trimmed => trimmed.to_string(),
        };

        let inserted = self
            .registry
            .insert(
                mint,
                name,
                info.decimals,
                from_base_units(info.supply, info.decimals),
                from_base_units(balance, info.decimals),
            )
            .await?;

        Ok(match inserted {
            Inserted::Added(record) => {
                info!(mint = %mint, name = %record.name, "Imported existing token");
                self.audit(
                    AuditEvent::new(AuditEventType::TokenImported)
                        .with_wallet(owner)
                        .with_mint(mint),
                );
                AddTokenOutcome::Added(record)
            }
            Inserted::AlreadyPresent(record) => AddTokenOutcome::AlreadyPresent(record),
        })
    }

    /// Refresh one token from the ledger.
    pub async fn refresh_token(&self, mint: &Address) -> Result<TokenRecord, TokenError> {
        let owner = self.require_wallet().await?;
        self.require_token(mint).await?;

        let _guard = self.locks.acquire(mint).await;
        reconciler::sync_token(self.ledger.as_ref(), &self.registry, mint, &owner).await?;
        self.require_token(mint).await
    }

    /// Post-operation refresh; a failure keeps the cached record.
    async fn refresh_locked(&self, record: &TokenRecord, owner: &Address) -> TokenRecord {
        if let Err(e) =
            reconciler::sync_token(self.ledger.as_ref(), &self.registry, &record.mint, owner).await
        {
            warn!(mint = %record.mint, error = %e, "Refresh after operation failed");
        }
        self.registry
            .get(&record.mint)
            .await
            .unwrap_or_else(|| record.clone())
    }

    /// Run one reconcile cycle for the connected wallet now.
    pub async fn reconcile_now(&self) -> Result<ReconcileReport, TokenError> {
        let owner = self.require_wallet().await?;
        Ok(self.reconciler_for(owner).reconcile_once().await)
    }

    pub async fn rename_token(&self, mint: &Address, name: &str) -> Result<TokenRecord, TokenError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TokenError::EmptyName);
        }
        self.require_token(mint).await?;

        let _guard = self.locks.acquire(mint).await;
        let record = self
            .registry
            .rename(mint, name.to_string())
            .await?
            .ok_or(TokenError::UnknownToken(*mint))?;

        self.audit(
            AuditEvent::new(AuditEventType::TokenRenamed)
                .with_mint(mint)
                .with_details(serde_json::json!({ "name": record.name })),
        );
        Ok(record)
    }

    /// A throwaway address to try transfers against. Nothing is stored.
    pub fn generate_test_recipient(&self) -> Address {
        Keypair::generate().address()
    }

    // ========== Queries ==========

    pub async fn tokens(&self) -> Vec<TokenRecord> {
        self.registry.snapshot().await
    }

    pub async fn token(&self, mint: &Address) -> Option<TokenRecord> {
        self.registry.get(mint).await
    }

    pub async fn token_state(&self, mint: &Address) -> Result<LifecycleState, TokenError> {
        if lock_set(&self.creating).contains(mint) {
            return Ok(LifecycleState::Creating);
        }
        if !self.registry.contains(mint).await {
            return Ok(LifecycleState::Uninitialized);
        }

        let status = match self.vault.retrieve_entry(mint) {
            Ok(Some(entry)) => match entry.origin {
                KeyOrigin::Created => AuthorityStatus::Known,
                KeyOrigin::Regenerated => AuthorityStatus::Recovered,
            },
            Ok(None) | Err(VaultError::CorruptKey { .. }) => AuthorityStatus::Lost,
            Err(e) => return Err(e.into()),
        };
        Ok(LifecycleState::Active(status))
    }

    pub fn in_progress(&self) -> InProgress {
        self.flags.snapshot()
    }

    /// Reconstructed recent transactions of a registered token.
    pub async fn history(&self, mint: &Address) -> Result<Vec<TransactionRecord>, TokenError> {
        let _flag = self.flags.begin(OperationKind::FetchHistory);

        self.require_token(mint).await?;
        self.history
            .reconstruct(mint)
            .await
            .map_err(|e| TokenError::ledger("get_signatures_for_address", e))
    }
}
