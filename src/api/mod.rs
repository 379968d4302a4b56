// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, Method, Uri,
    },
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{with_access_gate, Role},
    config::ServerConfig,
    error::ApiError,
    state::AppState,
};

pub mod auth;
pub mod health;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router.
///
/// Every route, including the fallback, sits behind the access gate.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let gate = state.gate.clone();

    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/auth/check", get(auth::check))
        .route("/auth/logout", post(auth::logout))
        .fallback(not_mounted)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    with_access_gate(routes, gate)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors_layer(server))
}

/// Only the configured frontend may call with credentials. Other origins get
/// no `Access-Control-Allow-Origin` header at all.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([server.frontend_origin.clone()]))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
}

/// Paths the gate let through but no handler serves.
async fn not_mounted(uri: Uri) -> ApiError {
    ApiError::NoRoute(uri.path().to_string())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::check,
        auth::logout
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            auth::AuthStatusResponse,
            auth::InfoUser,
            Role
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Session check and logout")
    )
)]
struct ApiDoc;
