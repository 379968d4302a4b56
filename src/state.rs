// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Instant;

use crate::auth::AccessGate;

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub cookie_secure: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(gate: AccessGate, cookie_secure: bool) -> Self {
        Self {
            gate: Arc::new(gate),
            cookie_secure,
            started_at: Instant::now(),
        }
    }
}

/// State with the built-in rule table and a fixed test secret.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use crate::auth::{AccessPolicy, PolicyTable, SessionGate, TokenCodec};

    let gate = AccessGate::new(
        SessionGate::new(TokenCodec::new(b"app-state-test-secret"), "0"),
        AccessPolicy::new(PolicyTable::default(), "0"),
    );
    AppState::new(gate, false)
}
