// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session check and logout endpoints.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{session::clear_access_token_cookie, Auth, AuthError, AuthenticatedUser, Role},
    state::AppState,
};

/// Identity of the logged-in user as seen by the frontend.
#[derive(Debug, Serialize, ToSchema)]
pub struct InfoUser {
    /// User ID (token subject)
    pub id: String,
    /// Role name (`Admin`, `Uploader` or `Reader`)
    pub role: Role,
}

impl From<AuthenticatedUser> for InfoUser {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            id: user.user_id,
            role: user.role,
        }
    }
}

/// Response body shared by the auth endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthStatusResponse {
    /// `success` or `error`
    pub code: String,
    pub message: String,
    #[serde(rename = "infoUser", skip_serializing_if = "Option::is_none")]
    pub info_user: Option<InfoUser>,
}

impl AuthStatusResponse {
    fn success(message: &str, info_user: Option<InfoUser>) -> Self {
        Self {
            code: "success".to_string(),
            message: message.to_string(),
            info_user,
        }
    }

    fn error(message: &str) -> Self {
        Self {
            code: "error".to_string(),
            message: message.to_string(),
            info_user: None,
        }
    }
}

fn clearing_headers(secure: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match clear_access_token_cookie(secure) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => tracing::error!("Failed to build cookie removal header: {err}"),
    }
    headers
}

/// Report whether the `accessToken` cookie holds a valid login.
///
/// A cookie that is present but no longer valid is cleared.
#[utoipa::path(
    get,
    path = "/auth/check",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = AuthStatusResponse),
        (status = 401, description = "Token is missing or invalid", body = AuthStatusResponse),
    )
)]
pub async fn check(State(state): State<AppState>, auth: Result<Auth, AuthError>) -> Response {
    match auth {
        Ok(Auth(user)) => (
            StatusCode::OK,
            Json(AuthStatusResponse::success("Token is valid", Some(user.into()))),
        )
            .into_response(),
        Err(AuthError::MissingToken) => (
            StatusCode::UNAUTHORIZED,
            Json(AuthStatusResponse::error("Token is invalid")),
        )
            .into_response(),
        Err(err) => {
            tracing::debug!(error = %err, "Clearing invalid access token");
            (
                StatusCode::UNAUTHORIZED,
                clearing_headers(state.cookie_secure),
                Json(AuthStatusResponse::error("Token is invalid")),
            )
                .into_response()
        }
    }
}

/// Log out by clearing the `accessToken` cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Cookie cleared", body = AuthStatusResponse),
    )
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        clearing_headers(state.cookie_secure),
        Json(AuthStatusResponse::success("Logged out", None)),
    )
        .into_response()
}
