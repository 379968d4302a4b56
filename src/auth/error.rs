// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::session::AnonymousCause;

/// Reasons a token fails verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Not a compact HS256 token, or the payload has missing/unknown fields
    #[error("token is malformed")]
    Malformed,
    /// Signature does not match the server secret
    #[error("token signature is invalid")]
    InvalidSignature,
    /// `now` is at or past the expiry timestamp
    #[error("token has expired")]
    Expired,
}

/// Failure to mint a token.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
    #[error("token lifetime must be positive, got {0}s")]
    InvalidTtl(i64),
}

/// Rejection returned by the `Auth` extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `accessToken` cookie present
    MissingToken,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
        }
    }

    /// Every rejection means the caller is not logged in.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl From<DecodeError> for AuthError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Malformed => AuthError::MalformedToken,
            DecodeError::InvalidSignature => AuthError::InvalidSignature,
            DecodeError::Expired => AuthError::TokenExpired,
        }
    }
}

impl From<AnonymousCause> for AuthError {
    fn from(cause: AnonymousCause) -> Self {
        match cause {
            AnonymousCause::MissingToken => AuthError::MissingToken,
            AnonymousCause::Malformed => AuthError::MalformedToken,
            AnonymousCause::InvalidSignature => AuthError::InvalidSignature,
            AnonymousCause::Expired => AuthError::TokenExpired,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Login is required"),
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
