// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive
//! `ToSchema` for the OpenAPI document.
//!
//! Addresses travel as base58 strings and amounts as display values (base
//! units divided by `10^decimals`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::history::TransactionRecord;
use crate::lifecycle::{
    AddTokenOutcome, AuthorityStatus, InProgress, LifecycleState, MintOutcome, TransferOutcome,
};
use crate::reconciler::ReconcileReport;
use crate::storage::TokenRecord;

// =============================================================================
// Wallet
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectWalletRequest {
    /// Base58 wallet address
    pub address: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConnectWalletResponse {
    pub address: String,
    /// Result of the reconcile cycle run on connect
    pub reconcile: ReconcileReport,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DisconnectWalletResponse {
    /// The wallet that was connected, if any.
    pub disconnected: Option<String>,
}

/// Current session, native balance and loading flags.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletStatusResponse {
    pub connected: bool,
    pub address: Option<String>,
    /// Native balance in lamports, as of the last refresh
    pub native_balance: Option<u64>,
    /// Native balance in SOL, formatted
    pub native_balance_display: Option<String>,
    pub in_progress: InProgress,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestRecipientResponse {
    pub address: String,
}

// =============================================================================
// Tokens
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTokenRequest {
    pub name: String,
    /// Defaults to 9
    #[serde(default)]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportTokenRequest {
    /// Base58 mint address
    pub mint: String,
    /// Display name; `Token N` when empty
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportTokenResponse {
    pub token: TokenRecord,
    /// The mint was registered before this request.
    pub already_present: bool,
}

impl From<AddTokenOutcome> for ImportTokenResponse {
    fn from(outcome: AddTokenOutcome) -> Self {
        match outcome {
            AddTokenOutcome::Added(token) => Self {
                token,
                already_present: false,
            },
            AddTokenOutcome::AlreadyPresent(token) => Self {
                token,
                already_present: true,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenListResponse {
    pub tokens: Vec<TokenRecord>,
    pub total: usize,
}

/// A registered token with its lifecycle state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenDetailResponse {
    pub token: TokenRecord,
    /// `uninitialized`, `creating` or `active`
    pub state: String,
    /// Custody of the mint authority, for active tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<AuthorityStatus>,
}

impl TokenDetailResponse {
    pub fn new(token: TokenRecord, state: LifecycleState) -> Self {
        Self {
            token,
            state: state.label().to_string(),
            authority: state.authority(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenameTokenRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MintTokensRequest {
    /// Display amount, must be positive
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MintTokensResponse {
    pub signature: String,
    pub amount: f64,
    /// A lost mint authority was replaced to complete this mint.
    pub authority_regenerated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub token: TokenRecord,
}

impl From<MintOutcome> for MintTokensResponse {
    fn from(outcome: MintOutcome) -> Self {
        let warning = outcome.is_degraded().then(|| {
            "The mint authority was lost and has been regenerated. The new key is now in custody."
                .to_string()
        });
        Self {
            signature: outcome.signature,
            amount: outcome.amount,
            authority_regenerated: outcome.authority_regenerated,
            warning,
            token: outcome.token,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferTokensRequest {
    /// Base58 recipient wallet address
    pub recipient: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferTokensResponse {
    pub signature: String,
    pub amount: f64,
    pub recipient: String,
    pub token: TokenRecord,
}

impl From<TransferOutcome> for TransferTokensResponse {
    fn from(outcome: TransferOutcome) -> Self {
        Self {
            signature: outcome.signature,
            amount: outcome.amount,
            recipient: outcome.recipient.to_string(),
            token: outcome.token,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenHistoryResponse {
    pub mint: String,
    /// Newest first
    pub transactions: Vec<TransactionRecord>,
}
