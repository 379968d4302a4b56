// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors answered outside the auth endpoints.
//!
//! Bodies use the portal's `{ code, message }` envelope so the frontend can
//! handle them like any other API reply.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The access gate let the request through but no handler serves it
    #[error("No route for {0}")]
    NoRoute(String),
}

#[derive(Serialize)]
struct Envelope {
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoRoute(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            code: "error",
            message: self.to_string(),
        };
        (self.status_code(), Json(envelope)).into_response()
    }
}
