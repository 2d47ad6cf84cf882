// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ErrorBody,
    history::{TransactionKind, TransactionRecord},
    lifecycle::{AuthorityStatus, InProgress},
    models::{
        ConnectWalletRequest, ConnectWalletResponse, CreateTokenRequest,
        DisconnectWalletResponse, ImportTokenRequest, ImportTokenResponse, MintTokensRequest,
        MintTokensResponse, RenameTokenRequest, TestRecipientResponse, TokenDetailResponse,
        TokenHistoryResponse, TokenListResponse, TransferTokensRequest, TransferTokensResponse,
        WalletStatusResponse,
    },
    reconciler::ReconcileReport,
    state::AppState,
    storage::TokenRecord,
};

pub mod health;
pub mod tokens;
pub mod wallet;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wallet", get(wallet::wallet_status))
        .route("/wallet/connect", post(wallet::connect_wallet))
        .route("/wallet/disconnect", post(wallet::disconnect_wallet))
        .route("/wallet/test-recipient", post(wallet::test_recipient))
        .route(
            "/tokens",
            get(tokens::list_tokens).post(tokens::create_token),
        )
        .route("/tokens/import", post(tokens::import_token))
        .route("/tokens/refresh", post(tokens::refresh_tokens))
        .route("/tokens/{mint}", get(tokens::get_token))
        .route("/tokens/{mint}/name", put(tokens::rename_token))
        .route("/tokens/{mint}/mint", post(tokens::mint_tokens))
        .route("/tokens/{mint}/transfer", post(tokens::transfer_tokens))
        .route("/tokens/{mint}/history", get(tokens::token_history))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        wallet::wallet_status,
        wallet::connect_wallet,
        wallet::disconnect_wallet,
        wallet::test_recipient,
        tokens::list_tokens,
        tokens::create_token,
        tokens::import_token,
        tokens::refresh_tokens,
        tokens::get_token,
        tokens::rename_token,
        tokens::mint_tokens,
        tokens::transfer_tokens,
        tokens::token_history
    ),
    components(
        schemas(
            ErrorBody,
            TokenRecord,
            TransactionRecord,
            TransactionKind,
            AuthorityStatus,
            InProgress,
            ReconcileReport,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            ConnectWalletRequest,
            ConnectWalletResponse,
            DisconnectWalletResponse,
            WalletStatusResponse,
            TestRecipientResponse,
            CreateTokenRequest,
            ImportTokenRequest,
            ImportTokenResponse,
            TokenListResponse,
            TokenDetailResponse,
            RenameTokenRequest,
            MintTokensRequest,
            MintTokensResponse,
            TransferTokensRequest,
            TransferTokensResponse,
            TokenHistoryResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Wallet", description = "Wallet session and native balance"),
        (name = "Tokens", description = "Token creation, minting, transfers and history")
    )
)]
struct ApiDoc;

/// Empty data dir, simulated ledger, no wallet connected.
#[cfg(test)]
pub(crate) fn test_state() -> (
    tempfile::TempDir,
    AppState,
    std::sync::Arc<crate::ledger::SimulatedLedger>,
) {
    use std::sync::Arc;

    use crate::config::ManagerConfig;
    use crate::ledger::SimulatedLedger;
    use crate::lifecycle::TokenLifecycleManager;
    use crate::storage::{KeyRepository, LocalStorage, StoragePaths, TokenRepository};

    let temp = tempfile::TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::open(StoragePaths::new(temp.path())).unwrap());
    let ledger = Arc::new(SimulatedLedger::new());
    let manager = TokenLifecycleManager::new(
        ledger.clone(),
        Arc::new(TokenRepository::new(storage.clone())),
        Arc::new(KeyRepository::new(storage.clone())),
        ManagerConfig::default(),
    )
    .unwrap()
    .with_audit(storage.clone());

    (temp, AppState::new(manager, storage), ledger)
}
