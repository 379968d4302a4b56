// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access gate middleware for Axum.
//!
//! Runs the session gate and access policy before any handler. Allowed
//! requests are forwarded untouched; everything else is answered with a
//! `307 Temporary Redirect` to the login or home page.
//!
//! ```rust,ignore
//! let gate = Arc::new(auth_config.build_gate()?);
//! let app = with_access_gate(Router::new().route("/profile", get(profile)), gate);
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::HOST, HeaderMap},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Redirect, Response},
    Router,
};
use url::Url;

use super::policy::{AccessDecision, AccessPolicy};
use super::session::SessionGate;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/account/login";

/// Where visitors without the required standing are sent.
pub const HOME_PATH: &str = "/";

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Session gate + access policy, shared read-only across requests.
#[derive(Debug, Clone)]
pub struct AccessGate {
    sessions: SessionGate,
    policy: AccessPolicy,
    public_origin: Option<Url>,
}

impl AccessGate {
    pub fn new(sessions: SessionGate, policy: AccessPolicy) -> Self {
        Self {
            sessions,
            policy,
            public_origin: None,
        }
    }

    /// Resolve redirect locations against a fixed origin instead of the
    /// request's `Host` header.
    pub fn with_public_origin(mut self, origin: Option<Url>) -> Self {
        self.public_origin = origin;
        self
    }

    pub fn sessions(&self) -> &SessionGate {
        &self.sessions
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Decide a request for `path` with the given headers at time `now`.
    pub fn decide(&self, path: &str, headers: &HeaderMap, now: i64) -> AccessDecision {
        let credentials = self.sessions.credentials(headers, now);
        self.policy.evaluate(path, &credentials)
    }

    /// Absolute (when a base is known) URL for a redirect decision.
    pub fn redirect_location(&self, decision: AccessDecision, headers: &HeaderMap) -> Option<String> {
        let target = match decision {
            AccessDecision::Allow => return None,
            AccessDecision::RedirectLogin(_) => LOGIN_PATH,
            AccessDecision::RedirectHome(_) => HOME_PATH,
        };

        let base = self
            .public_origin
            .clone()
            .or_else(|| request_origin(headers));

        let location = base
            .and_then(|base| base.join(target).ok())
            .map(|url| url.to_string())
            .unwrap_or_else(|| target.to_string());

        Some(location)
    }
}

/// Base URL of the request as seen by the browser.
fn request_origin(headers: &HeaderMap) -> Option<Url> {
    let host = headers.get(HOST)?.to_str().ok()?.trim();
    if host.is_empty() || host.contains(['/', '\\', '@', '?', '#']) {
        return None;
    }

    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| v == "http" || v == "https")
        .unwrap_or_else(|| "http".to_string());

    Url::parse(&format!("{scheme}://{host}/")).ok()
}

/// Access gate middleware function.
pub async fn access_gate(
    State(gate): State<Arc<AccessGate>>,
    request: Request,
    next: Next,
) -> Response {
    let now = chrono::Utc::now().timestamp();
    let decision = gate.decide(request.uri().path(), request.headers(), now);

    let Some(location) = gate.redirect_location(decision, request.headers()) else {
        return next.run(request).await;
    };

    tracing::info!(
        path = %request.uri().path(),
        decision = ?decision,
        reason = decision.reason().map(|r| r.as_str()).unwrap_or_default(),
        location = %location,
        "Request redirected by access policy"
    );

    Redirect::temporary(&location).into_response()
}

/// Put every route of `router` behind the access gate.
pub fn with_access_gate(router: Router, gate: Arc<AccessGate>) -> Router {
    router.layer(from_fn_with_state(gate, access_gate))
}
