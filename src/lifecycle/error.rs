// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::Serialize;
use utoipa::ToSchema;

use crate::amount::AmountError;
use crate::ledger::{Address, AddressError, LedgerError};
use crate::storage::StorageError;
use crate::vault::VaultError;

/// Broad category of a [`TokenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected before any network call.
    Validation,
    Funds,
    RateLimit,
    Authority,
    Ledger,
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token name must not be empty")]
    EmptyName,

    #[error("decimals must be between 0 and {max}, got {got}")]
    InvalidDecimals { got: u8, max: u8 },

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: AddressError },

    #[error("no wallet connected")]
    WalletNotConnected,

    #[error("token {0} is not registered")]
    UnknownToken(Address),

    #[error("insufficient balance to create a token: need {required} lamports, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("insufficient native balance for transaction fees: {0}")]
    InsufficientFeeBalance(String),

    #[error("insufficient token balance: available {available}, requested {requested}")]
    InsufficientTokenBalance { available: f64, requested: f64 },

    #[error("faucet rate limited while funding {address}")]
    RateLimited { address: Address },

    #[error("the ledger rejected the current authority of {mint}")]
    AuthorityRejected { mint: Address },

    #[error("could not create a holding account for recipient {recipient}: {reason}")]
    DestinationAccountCreation { recipient: Address, reason: String },

    #[error("mint {0} does not exist on the ledger")]
    UnknownMint(Address),

    #[error("{operation} failed: {source}")]
    Ledger {
        operation: &'static str,
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::EmptyName
            | TokenError::InvalidDecimals { .. }
            | TokenError::InvalidAmount(_)
            | TokenError::InvalidAddress { .. }
            | TokenError::WalletNotConnected
            | TokenError::UnknownToken(_) => ErrorKind::Validation,
            TokenError::InsufficientFunds { .. }
            | TokenError::InsufficientFeeBalance(_)
            | TokenError::InsufficientTokenBalance { .. } => ErrorKind::Funds,
            TokenError::RateLimited { .. } => ErrorKind::RateLimit,
            TokenError::AuthorityRejected { .. } => ErrorKind::Authority,
            TokenError::DestinationAccountCreation { .. }
            | TokenError::UnknownMint(_)
            | TokenError::Ledger { .. } => ErrorKind::Ledger,
            TokenError::Vault(_) | TokenError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// What the user can do about it, when there is something to do.
    pub fn remedy(&self) -> Option<String> {
        match self {
            TokenError::WalletNotConnected => Some("Connect a wallet first.".to_string()),
            TokenError::InsufficientFunds { required, .. } => Some(format!(
                "Add at least {} SOL to the connected wallet and try again.",
                crate::amount::format_amount(*required, 9)
            )),
            TokenError::InsufficientFeeBalance(_) => {
                Some("Fund the fee payer with SOL and try again.".to_string())
            }
            TokenError::RateLimited { address } => Some(format!(
                "The faucet is rate limited. Fund {address} from another faucet or a funded wallet, then retry later."
            )),
            TokenError::AuthorityRejected { .. } => Some(
                "The original mint authority is lost and a regenerated key cannot mint this token. Create a new token to keep minting."
                    .to_string(),
            ),
            TokenError::DestinationAccountCreation { .. } => {
                Some("Check the recipient address and try again.".to_string())
            }
            _ => None,
        }
    }

    /// Wrap a ledger failure, recognizing fee-payer shortfalls.
    pub(crate) fn ledger(operation: &'static str, source: LedgerError) -> Self {
        match source {
            LedgerError::InsufficientFunds(detail) => TokenError::InsufficientFeeBalance(detail),
            source => TokenError::Ledger { operation, source },
        }
    }
}

/// Parse user input into an [`Address`].
pub fn parse_address(input: &str) -> Result<Address, TokenError> {
    input.parse().map_err(|reason| TokenError::InvalidAddress {
        input: input.to_string(),
        reason,
    })
}
