// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require a valid login cookie:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! The access gate middleware only redirects browsers away from protected
//! pages. API handlers that need the caller's identity extract it here.
//! Wrap it in `Result<Auth, AuthError>` to handle the rejection yourself.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{session::Session, AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Verifies the `accessToken` cookie and provides the user.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let now = chrono::Utc::now().timestamp();
        match state.gate.sessions().authenticate(&parts.headers, now) {
            Session::Authenticated(user) => Ok(Auth(user)),
            Session::Anonymous(cause) => Err(cause.into()),
        }
    }
}
