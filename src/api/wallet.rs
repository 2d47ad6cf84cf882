// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet session endpoints.
//!
//! Connecting a wallet starts background balance reconciliation for every
//! registered token; disconnecting stops it.

use axum::{extract::State, Json};

use crate::{
    amount::{format_amount, DEFAULT_DECIMALS},
    error::{ApiError, ErrorBody},
    models::{
        ConnectWalletRequest, ConnectWalletResponse, DisconnectWalletResponse,
        TestRecipientResponse, WalletStatusResponse,
    },
    state::AppState,
};

/// Session status with the last known native balance.
#[utoipa::path(
    get,
    path = "/v1/wallet",
    tag = "Wallet",
    responses(
        (status = 200, description = "Wallet session status", body = WalletStatusResponse)
    )
)]
pub async fn wallet_status(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    let address = state.manager.connected_wallet().await;
    let native_balance = state.manager.cached_wallet_balance().await;

    Json(WalletStatusResponse {
        connected: address.is_some(),
        address: address.map(|a| a.to_string()),
        native_balance,
        native_balance_display: native_balance.map(|l| format_amount(l, DEFAULT_DECIMALS)),
        in_progress: state.manager.in_progress(),
    })
}

/// Connect a wallet and reconcile its tokens.
#[utoipa::path(
    post,
    path = "/v1/wallet/connect",
    tag = "Wallet",
    request_body = ConnectWalletRequest,
    responses(
        (status = 200, description = "Wallet connected", body = ConnectWalletResponse),
        (status = 400, description = "Malformed address", body = ErrorBody)
    )
)]
pub async fn connect_wallet(
    State(state): State<AppState>,
    Json(request): Json<ConnectWalletRequest>,
) -> Result<Json<ConnectWalletResponse>, ApiError> {
    let report = state.manager.connect_wallet(&request.address).await?;
    let address = state
        .manager
        .connected_wallet()
        .await
        .map(|a| a.to_string())
        .unwrap_or(request.address);

    Ok(Json(ConnectWalletResponse {
        address,
        reconcile: report,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/wallet/disconnect",
    tag = "Wallet",
    responses(
        (status = 200, description = "Session ended", body = DisconnectWalletResponse)
    )
)]
pub async fn disconnect_wallet(State(state): State<AppState>) -> Json<DisconnectWalletResponse> {
    let disconnected = state.manager.disconnect_wallet().await;
    Json(DisconnectWalletResponse {
        disconnected: disconnected.map(|a| a.to_string()),
    })
}

/// A fresh address to try transfers against. Its key is discarded.
#[utoipa::path(
    post,
    path = "/v1/wallet/test-recipient",
    tag = "Wallet",
    responses(
        (status = 200, description = "Throwaway recipient", body = TestRecipientResponse)
    )
)]
pub async fn test_recipient(State(state): State<AppState>) -> Json<TestRecipientResponse> {
    Json(TestRecipientResponse {
        address: state.manager.generate_test_recipient().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;
    use crate::ledger::Keypair;

    #[tokio::test]
    async fn status_reflects_session() {
        let (_temp, state, ledger) = test_state();
        let Json(status) = wallet_status(State(state.clone())).await;
        assert!(!status.connected);
        assert_eq!(status.native_balance, None);

        let wallet = Keypair::generate().address();
        ledger.fund(&wallet, 1_500_000_000);
        let Json(connected) = connect_wallet(
            State(state.clone()),
            Json(ConnectWalletRequest {
                address: wallet.to_string(),
            }),
        )
        .await
        .expect("connect succeeds");
        assert_eq!(connected.address, wallet.to_string());
        assert_eq!(connected.reconcile.native_balance, Some(1_500_000_000));

        let Json(status) = wallet_status(State(state.clone())).await;
        assert!(status.connected);
        assert_eq!(status.native_balance_display.as_deref(), Some("1.5"));

        let Json(done) = disconnect_wallet(State(state.clone())).await;
        assert_eq!(done.disconnected, Some(wallet.to_string()));
    }

    #[tokio::test]
    async fn connect_rejects_bad_address() {
        let (_temp, state, _ledger) = test_state();
        let err = connect_wallet(
            State(state),
            Json(ConnectWalletRequest {
                address: "0x1234".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recipient_is_valid_address() {
        let (_temp, state, _ledger) = test_state();
        let Json(response) = test_recipient(State(state)).await;
        assert!(crate::lifecycle::parse_address(&response.address).is_ok());
    }
}
