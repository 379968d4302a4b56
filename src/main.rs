// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{future::Future, io, process};

use manga_portal_gate::{
    api::router,
    config::{AuthConfig, ConfigError, LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    state::AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Logging format has to be known before anything else is logged.
    let server = match ServerConfig::from_env() {
        Ok(server) => server,
        Err(err) => {
            init_tracing(LogFormat::Pretty);
            exit_with(err);
        }
    };
    init_tracing(server.log_format);

    let auth = match AuthConfig::from_env() {
        Ok(auth) => auth,
        Err(err) => exit_with(err),
    };
    let gate = match auth.build_gate() {
        Ok(gate) => gate,
        Err(err) => exit_with(err),
    };

    tracing::info!(
        rules = gate.policy().table().rules().len(),
        admin_role_tag = %auth.admin_role_tag,
        cookie_secure = auth.cookie_secure,
        "Access policy loaded"
    );

    let app = router(AppState::new(gate, auth.cookie_secure), &server);

    let addr = server.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {addr}: {err}");
            process::exit(1);
        }
    };

    tracing::info!("Manga portal gate listening on http://{addr} (docs at /docs)");

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server failed: {err}");
        process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn exit_with(err: ConfigError) -> ! {
    tracing::error!("Invalid configuration: {err}");
    process::exit(1);
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await;
}

/// Resolve once `signal` fires. If the handler cannot be installed this
/// never resolves, so the server runs until killed.
async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(err) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_resolves_shutdown() {
        wait_for_signal(async { Ok(()) }).await;
    }

    #[tokio::test]
    async fn failed_signal_handler_never_triggers_shutdown() {
        let still_running = tokio::select! {
            biased;
            _ = wait_for_signal(async { Err(io::Error::other("no signal handler")) }) => false,
            _ = std::future::ready(()) => true,
        };
        assert!(still_running);
    }
}
