// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use anyhow::Context;
use tokio::net::TcpListener;

use clerk_auth_gateway::{
    api::{cors_layer, router},
    auth::TokenVerifier,
    config::AppConfig,
    logging,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the real environment still applies.
    let _ = dotenvy::dotenv();
    logging::init();

    let config = AppConfig::from_env().context("Missing required Clerk configuration")?;

    let verifier = TokenVerifier::from_settings(&config.auth)
        .context("Failed to initialise token verifier")?;
    tracing::info!(
        jwks_url = %config.auth.jwks_url,
        issuer = %config.auth.issuer,
        cache_ttl = ?config.auth.cache_ttl,
        "Token verifier configured"
    );

    let state = AppState::new(verifier, config.admin_email_suffix.as_str());
    let app = router(state, cors_layer(&config.cors_allowed_origins));

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    tracing::info!(addr = %config.addr, "Clerk auth gateway listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Clerk auth gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
