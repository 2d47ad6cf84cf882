// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token management API endpoints.
//!
//! Creation, minting and transfers act for the connected wallet and fail
//! with 409 when no wallet is connected. Mint addresses in paths are base58.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{ApiError, ErrorBody},
    lifecycle::parse_address,
    models::{
        CreateTokenRequest, ImportTokenRequest, ImportTokenResponse, MintTokensRequest,
        MintTokensResponse, RenameTokenRequest, TokenDetailResponse, TokenHistoryResponse,
        TokenListResponse, TransferTokensRequest, TransferTokensResponse,
    },
    reconciler::ReconcileReport,
    state::AppState,
    storage::TokenRecord,
};

/// List registered tokens, oldest first.
#[utoipa::path(
    get,
    path = "/v1/tokens",
    tag = "Tokens",
    responses(
        (status = 200, description = "Registered tokens", body = TokenListResponse)
    )
)]
pub async fn list_tokens(State(state): State<AppState>) -> Json<TokenListResponse> {
    let tokens = state.manager.tokens().await;
    let total = tokens.len();
    Json(TokenListResponse { tokens, total })
}

/// Create a token owned by the connected wallet.
///
/// Generates and custodies a fresh mint authority, funds it from the
/// faucet, creates the mint and the wallet's holding account.
#[utoipa::path(
    post,
    path = "/v1/tokens",
    tag = "Tokens",
    request_body = CreateTokenRequest,
    responses(
        (status = 201, description = "Token created", body = TokenRecord),
        (status = 400, description = "Invalid name or decimals", body = ErrorBody),
        (status = 409, description = "No wallet connected", body = ErrorBody),
        (status = 422, description = "Wallet balance too low", body = ErrorBody),
        (status = 429, description = "Faucet rate limited", body = ErrorBody),
        (status = 502, description = "Ledger failure", body = ErrorBody)
    )
)]
pub async fn create_token(
    State(state): State<AppState>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenRecord>), ApiError> {
    let record = state
        .manager
        .create_token(&request.name, request.decimals)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Register a token that already exists on the ledger.
///
/// Returns 200 with `already_present` when the mint is registered.
#[utoipa::path(
    post,
    path = "/v1/tokens/import",
    tag = "Tokens",
    request_body = ImportTokenRequest,
    responses(
        (status = 201, description = "Token imported", body = ImportTokenResponse),
        (status = 200, description = "Token was already registered", body = ImportTokenResponse),
        (status = 400, description = "Malformed mint address", body = ErrorBody),
        (status = 502, description = "Unknown mint or ledger failure", body = ErrorBody)
    )
)]
pub async fn import_token(
    State(state): State<AppState>,
    Json(request): Json<ImportTokenRequest>,
) -> Result<(StatusCode, Json<ImportTokenResponse>), ApiError> {
    let response = ImportTokenResponse::from(
        state
            .manager
            .add_existing_token(&request.mint, &request.name)
            .await?,
    );
    let status = if response.already_present {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(response)))
}

/// Reconcile every registered token against the ledger now.
#[utoipa::path(
    post,
    path = "/v1/tokens/refresh",
    tag = "Tokens",
    responses(
        (status = 200, description = "Reconcile cycle result", body = ReconcileReport),
        (status = 409, description = "No wallet connected", body = ErrorBody)
    )
)]
pub async fn refresh_tokens(
    State(state): State<AppState>,
) -> Result<Json<ReconcileReport>, ApiError> {
    Ok(Json(state.manager.reconcile_now().await?))
}

#[utoipa::path(
    get,
    path = "/v1/tokens/{mint}",
    tag = "Tokens",
    params(
        ("mint" = String, Path, description = "Mint address")
    ),
    responses(
        (status = 200, description = "Token with lifecycle state", body = TokenDetailResponse),
        (status = 404, description = "Token not registered", body = ErrorBody)
    )
)]
pub async fn get_token(
    State(state): State<AppState>,
    Path(mint): Path<String>,
) -> Result<Json<TokenDetailResponse>, ApiError> {
    let mint = parse_address(&mint)?;
    let record = state
        .manager
        .token(&mint)
        .await
        .ok_or_else(|| ApiError::not_found(format!("token {mint} is not registered")))?;
    let lifecycle = state.manager.token_state(&mint).await?;

    Ok(Json(TokenDetailResponse::new(record, lifecycle)))
}

#[utoipa::path(
    put,
    path = "/v1/tokens/{mint}/name",
    tag = "Tokens",
    params(
        ("mint" = String, Path, description = "Mint address")
    ),
    request_body = RenameTokenRequest,
    responses(
        (status = 200, description = "Token renamed", body = TokenRecord),
        (status = 400, description = "Empty name", body = ErrorBody),
        (status = 404, description = "Token not registered", body = ErrorBody)
    )
)]
pub async fn rename_token(
    State(state): State<AppState>,
    Path(mint): Path<String>,
    Json(request): Json<RenameTokenRequest>,
) -> Result<Json<TokenRecord>, ApiError> {
    let mint = parse_address(&mint)?;
    Ok(Json(state.manager.rename_token(&mint, &request.name).await?))
}

/// Mint tokens into the connected wallet.
///
/// A lost mint authority is regenerated on the way; the response then
/// carries `authority_regenerated` and a warning.
#[utoipa::path(
    post,
    path = "/v1/tokens/{mint}/mint",
    tag = "Tokens",
    params(
        ("mint" = String, Path, description = "Mint address")
    ),
    request_body = MintTokensRequest,
    responses(
        (status = 200, description = "Tokens minted", body = MintTokensResponse),
        (status = 400, description = "Invalid amount", body = ErrorBody),
        (status = 404, description = "Token not registered", body = ErrorBody),
        (status = 409, description = "Authority rejected or no wallet", body = ErrorBody),
        (status = 422, description = "Insufficient fee balance", body = ErrorBody),
        (status = 429, description = "Faucet rate limited", body = ErrorBody)
    )
)]
pub async fn mint_tokens(
    State(state): State<AppState>,
    Path(mint): Path<String>,
    Json(request): Json<MintTokensRequest>,
) -> Result<Json<MintTokensResponse>, ApiError> {
    let mint = parse_address(&mint)?;
    let outcome = state.manager.mint_tokens(&mint, request.amount).await?;
    Ok(Json(outcome.into()))
}

/// Transfer tokens from the connected wallet.
#[utoipa::path(
    post,
    path = "/v1/tokens/{mint}/transfer",
    tag = "Tokens",
    params(
        ("mint" = String, Path, description = "Mint address")
    ),
    request_body = TransferTokensRequest,
    responses(
        (status = 200, description = "Tokens transferred", body = TransferTokensResponse),
        (status = 400, description = "Invalid recipient or amount", body = ErrorBody),
        (status = 404, description = "Token not registered", body = ErrorBody),
        (status = 422, description = "Insufficient token or fee balance", body = ErrorBody),
        (status = 502, description = "Destination account creation failed", body = ErrorBody)
    )
)]
pub async fn transfer_tokens(
    State(state): State<AppState>,
    Path(mint): Path<String>,
    Json(request): Json<TransferTokensRequest>,
) -> Result<Json<TransferTokensResponse>, ApiError> {
    let mint = parse_address(&mint)?;
    let outcome = state
        .manager
        .transfer_tokens(&mint, &request.recipient, request.amount)
        .await?;
    Ok(Json(outcome.into()))
}

/// Recent mint and transfer activity, newest first.
#[utoipa::path(
    get,
    path = "/v1/tokens/{mint}/history",
    tag = "Tokens",
    params(
        ("mint" = String, Path, description = "Mint address")
    ),
    responses(
        (status = 200, description = "Reconstructed history", body = TokenHistoryResponse),
        (status = 404, description = "Token not registered", body = ErrorBody),
        (status = 502, description = "Ledger failure", body = ErrorBody)
    )
)]
pub async fn token_history(
    State(state): State<AppState>,
    Path(mint): Path<String>,
) -> Result<Json<TokenHistoryResponse>, ApiError> {
    let address = parse_address(&mint)?;
    let transactions = state.manager.history(&address).await?;
    Ok(Json(TokenHistoryResponse {
        mint: address.to_string(),
        transactions,
    }))
}
