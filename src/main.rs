// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{path::Path, process::ExitCode, sync::Arc};

use tokio::{net::TcpListener, signal};

use task_manager_server::{
    api::router,
    auth::{CredentialHasher, TokenService},
    config::{AppConfig, DatabaseLocation, JWT_SECRET_ENV},
    logging::init_tracing,
    state::AppState,
    storage::RedbStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.using_default_secret {
        tracing::warn!(
            "{JWT_SECRET_ENV} is not set; using the development default secret. Do not run this in production."
        );
    }

    let store = match &config.database {
        DatabaseLocation::File(path) => {
            tracing::info!(path = %path, "opening database");
            RedbStore::open(Path::new(path))?
        }
        DatabaseLocation::InMemory => {
            tracing::warn!("using in-memory database; data will not survive a restart");
            RedbStore::in_memory()?
        }
    };

    let hasher = CredentialHasher::new(config.hash_cost)?;
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl)
        .with_leeway(config.token_leeway_secs);
    let state = AppState::new(Arc::new(store), tokens, hasher, config.store_timeout);
    let app = router(state);

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "task manager listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
