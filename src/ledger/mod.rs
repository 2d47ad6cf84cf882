// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger integration boundary.
//!
//! The manager never talks to an RPC node directly. Everything goes through
//! [`LedgerGateway`], which the transport layer implements with its own
//! timeout and retry policy. Amounts at this boundary are always base units.
//!
//! - `keys` - addresses and ed25519 keypairs
//! - `simulated` - in-process ledger used by tests and the demo binary

pub mod keys;
pub mod simulated;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use keys::{Address, AddressError, KeyError, Keypair};
pub use simulated::SimulatedLedger;

/// Errors reported by a ledger gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The node or faucet answered "429 Too Many Requests".
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The fee payer cannot cover fees or rent.
    #[error("insufficient funds for fees: {0}")]
    InsufficientFunds(String),

    #[error("insufficient token balance: available {available}, requested {requested}")]
    InsufficientTokenBalance { available: u64, requested: u64 },

    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The signer is not the mint authority recorded on-chain.
    #[error("signer {signer} is not the mint authority of {mint}")]
    AuthorityMismatch { mint: String, signer: String },

    #[error("transaction {0} was not confirmed")]
    Unconfirmed(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Who pays fees and rent for a transaction.
#[derive(Debug, Clone, Copy)]
pub enum Payer<'a> {
    /// A custody-held keypair (the mint authority).
    Authority(&'a Keypair),
    /// The connected wallet; signing happens in the wallet, outside this crate.
    Wallet(Address),
}

impl Payer<'_> {
    pub fn address(&self) -> Address {
        match self {
            Payer::Authority(keypair) => keypair.address(),
            Payer::Wallet(address) => *address,
        }
    }
}

/// On-chain state of a mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintInfo {
    pub address: Address,
    /// Total supply in base units.
    pub supply: u64,
    pub decimals: u8,
    pub mint_authority: Option<Address>,
    pub freeze_authority: Option<Address>,
}

/// A holding account for one (owner, mint) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingAccount {
    pub address: Address,
    pub mint: Address,
    pub owner: Address,
    /// Balance in base units.
    pub amount: u64,
}

/// A signature returned by an address history query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    /// Unix seconds, when the node knows it.
    pub block_time: Option<i64>,
}

/// Raw token amount as reported inside transaction metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiTokenAmount {
    /// Base units, as a decimal string.
    pub amount: String,
    pub decimals: u8,
}

/// One entry of a pre/post token balance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalanceEntry {
    pub account_index: u8,
    pub mint: String,
    pub owner: Option<String>,
    pub ui_token_amount: UiTokenAmount,
}

/// Execution metadata of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMeta {
    pub pre_token_balances: Option<Vec<TokenBalanceEntry>>,
    pub post_token_balances: Option<Vec<TokenBalanceEntry>>,
}

/// Full detail of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub signature: String,
    pub block_time: Option<i64>,
    pub meta: Option<TransactionMeta>,
}

/// The remote ledger, as seen by the token manager.
///
/// Implementations own transport concerns (connection, timeouts, retries).
/// Methods returning `String` return the transaction signature.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Native balance of `address` in lamports.
    async fn get_balance(&self, address: &Address) -> LedgerResult<u64>;

    /// Ask the faucet to fund `recipient` with `lamports`.
    async fn request_funding(&self, recipient: &Address, lamports: u64) -> LedgerResult<String>;

    /// Create a new mint paid for by `payer`. Returns the mint address.
    async fn create_mint(
        &self,
        payer: &Keypair,
        mint_authority: &Address,
        freeze_authority: Option<&Address>,
        decimals: u8,
    ) -> LedgerResult<Address>;

    /// Address of the holding account for `(mint, owner)`. Pure derivation.
    fn holding_account_address(&self, mint: &Address, owner: &Address) -> Address;

    /// Fetch the holding account for `(mint, owner)`, creating it if missing.
    async fn get_or_create_holding_account(
        &self,
        payer: Payer<'_>,
        mint: &Address,
        owner: &Address,
    ) -> LedgerResult<HoldingAccount>;

    /// Mint `amount` base units into `account`, signed by `authority`.
    async fn mint_to(
        &self,
        authority: &Keypair,
        mint: &Address,
        account: &Address,
        amount: u64,
    ) -> LedgerResult<String>;

    /// Move `amount` base units from `source` to `destination`.
    async fn transfer(
        &self,
        payer: Payer<'_>,
        source: &Address,
        destination: &Address,
        owner: &Address,
        amount: u64,
    ) -> LedgerResult<String>;

    async fn get_mint_info(&self, mint: &Address) -> LedgerResult<MintInfo>;

    async fn get_account_info(&self, account: &Address) -> LedgerResult<HoldingAccount>;

    /// Most recent signatures touching `address`, newest first.
    async fn get_signatures_for_address(
        &self,
        address: &Address,
        limit: usize,
    ) -> LedgerResult<Vec<SignatureInfo>>;

    /// Transaction detail, or `None` when the node no longer has it.
    async fn get_transaction_detail(
        &self,
        signature: &str,
    ) -> LedgerResult<Option<TransactionDetail>>;

    /// Wait until `signature` is confirmed.
    async fn confirm_transaction(&self, signature: &str) -> LedgerResult<()>;
}
