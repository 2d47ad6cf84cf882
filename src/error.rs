// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::lifecycle::{ErrorKind, TokenError};
use crate::storage::StorageError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub remedy: Option<String>,
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    /// What the caller can do about it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remedy: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            remedy: None,
        }
    }

    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remedy = Some(remedy.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        let status = match (&err, err.kind()) {
            (TokenError::UnknownToken(_), _) => StatusCode::NOT_FOUND,
            (TokenError::WalletNotConnected, _) => StatusCode::CONFLICT,
            (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::Funds) => StatusCode::UNPROCESSABLE_ENTITY,
            (_, ErrorKind::RateLimit) => StatusCode::TOO_MANY_REQUESTS,
            (_, ErrorKind::Authority) => StatusCode::CONFLICT,
            (_, ErrorKind::Ledger) => StatusCode::BAD_GATEWAY,
            (_, ErrorKind::Storage) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }

        Self {
            status,
            message: err.to_string(),
            remedy: err.remedy(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        TokenError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            remedy: self.remedy,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    use crate::amount::AmountError;
    use crate::ledger::{Address, LedgerError};

    fn status_of(err: TokenError) -> StatusCode {
        ApiError::from(err).status
    }

    #[test]
    fn token_errors_map_to_status_codes() {
        let mint = Address::new([3; 32]);

        assert_eq!(status_of(TokenError::EmptyName), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(TokenError::InvalidAmount(AmountError::NonPositive(0.0))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(TokenError::UnknownToken(mint)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(TokenError::WalletNotConnected), StatusCode::CONFLICT);
        assert_eq!(
            status_of(TokenError::InsufficientFunds {
                required: 10,
                available: 1
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(TokenError::RateLimited { address: mint }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(TokenError::AuthorityRejected { mint }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(TokenError::ledger("get_mint_info", LedgerError::Rpc("down".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(TokenError::Storage(StorageError::NotInitialized)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn remedy_is_carried_over() {
        let err = ApiError::from(TokenError::WalletNotConnected);
        assert_eq!(err.remedy.as_deref(), Some("Connect a wallet first."));
        assert!(ApiError::from(TokenError::EmptyName).remedy.is_none());
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[tokio::test]
    async fn remedy_appears_in_body() {
        let response = ApiError::new(StatusCode::TOO_MANY_REQUESTS, "slow down")
            .with_remedy("wait")
            .into_response();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "slow down");
        assert_eq!(body["remedy"], "wait");
    }
}
