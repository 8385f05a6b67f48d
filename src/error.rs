/*
 * Responsibility
 * - gate が返す拒否理由 (AppError) の定義
 * - IntoResponse 実装 (HTTP status / {"error": "..."} の JSON body)
 * - TokenValidator のエラーを拒否理由に変換
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::access_jwt::TokenError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Every way a request can be turned away by this crate.
///
/// The `Display` text is the exact `error` field clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("missing authorization header")]
    MissingCredential,
    #[error("invalid authorization header format")]
    MalformedCredential,
    #[error("invalid token")]
    InvalidCredential,
    #[error("token expired")]
    ExpiredCredential,
    #[error("invalid token claims")]
    MalformedClaims,
    #[error("admin access required")]
    PrivilegeRequired,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential
            | AppError::MalformedCredential
            | AppError::InvalidCredential
            | AppError::ExpiredCredential
            | AppError::MalformedClaims => StatusCode::UNAUTHORIZED,
            AppError::PrivilegeRequired => StatusCode::FORBIDDEN,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // RFC 6750 challenge for 401s.
    fn challenge(&self) -> Option<HeaderValue> {
        match self {
            AppError::MissingCredential => Some(HeaderValue::from_static("Bearer")),
            AppError::MalformedCredential
            | AppError::InvalidCredential
            | AppError::ExpiredCredential
            | AppError::MalformedClaims => {
                Some(HeaderValue::from_static(r#"Bearer error="invalid_token""#))
            }
            AppError::PrivilegeRequired | AppError::Internal => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };

        let mut res = (self.status(), Json(body)).into_response();
        if let Some(challenge) = self.challenge() {
            res.headers_mut().insert(header::WWW_AUTHENTICATE, challenge);
        }
        res
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AppError::ExpiredCredential,
            TokenError::Invalid => AppError::InvalidCredential,
        }
    }
}
