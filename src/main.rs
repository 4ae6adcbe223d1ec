// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use axum_server::Handle;
use tokio::signal;
use tracing::{error, info, warn};

use timeless_api::api::router;
use timeless_api::config::{Config, LogFormat};
use timeless_api::logging;
use timeless_api::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(LogFormat::from_env());

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let addr = match config.bind_address() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if !config.cognito.is_complete() {
        warn!(
            "COGNITO_USER_POOL_ID or COGNITO_CLIENT_ID is not set; every authenticated request will be rejected"
        );
    }
    info!(
        region = %config.cognito.region,
        user_pool_id = %config.cognito.user_pool_id,
        issuer = %config.cognito.issuer(),
        "Cognito user pool configured"
    );

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to initialize JWKS client");
            return ExitCode::FAILURE;
        }
    };
    let jwks_url = state.verifier.keys().source().jwks_url().to_string();

    // A cold cache is fine; the first request will fetch the keys.
    match state.verifier.keys().warm().await {
        Ok(()) => info!(
            url = %jwks_url,
            keys = state.verifier.keys().key_count().await,
            "JWKS cache warmed"
        ),
        Err(e) => warn!(url = %jwks_url, error = %e, "Failed to warm JWKS cache"),
    }

    let app = router(state);

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        let grace = config.shutdown_grace;
        async move {
            shutdown_signal().await;
            info!(grace_secs = grace.as_secs(), "Draining in-flight requests");
            handle.graceful_shutdown(Some(grace));
        }
    });

    info!(%addr, "Timeless API listening (docs at /docs)");

    if let Err(e) = axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await
    {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    info!("Server shutdown complete");
    ExitCode::SUCCESS
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown"),
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGINT");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown");
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
