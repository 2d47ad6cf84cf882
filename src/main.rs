// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, error::Error, net::SocketAddr, sync::Arc};

use relational_token_manager::{
    api::router,
    config::{
        env_parse, ManagerConfig, DATA_DIR_ENV, DEFAULT_HOST, DEFAULT_PORT,
        DEFAULT_SIM_WALLET_LAMPORTS, HOST_ENV, PORT_ENV, SIM_WALLET_LAMPORTS_ENV,
        WALLET_ADDRESS_ENV,
    },
    ledger::SimulatedLedger,
    lifecycle::{parse_address, TokenLifecycleManager},
    logging::{init_logging, LogFormat},
    state::AppState,
    storage::{KeyRepository, LocalStorage, StoragePaths, TokenRepository},
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    init_logging(LogFormat::from_env());

    if let Err(e) = run().await {
        error!(error = %e, "Token manager failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let paths = match env::var(DATA_DIR_ENV) {
        Ok(dir) => StoragePaths::new(dir),
        Err(_) => StoragePaths::default(),
    };
    let storage = Arc::new(LocalStorage::open(paths)?);
    info!(data_dir = %storage.paths().root().display(), "Storage initialized");

    let config = ManagerConfig::from_env();
    let ledger = Arc::new(SimulatedLedger::new());
    let manager = TokenLifecycleManager::new(
        ledger.clone(),
        Arc::new(TokenRepository::new(storage.clone())),
        Arc::new(KeyRepository::new(storage.clone())),
        config,
    )?
    .with_audit(storage.clone());
    let tokens = manager.tokens().await.len();
    info!(tokens, "Token registry loaded");

    if let Ok(wallet) = env::var(WALLET_ADDRESS_ENV) {
        let address = parse_address(&wallet)?;
        let lamports = env_parse(SIM_WALLET_LAMPORTS_ENV).unwrap_or(DEFAULT_SIM_WALLET_LAMPORTS);
        ledger.fund(&address, lamports);
        let report = manager.connect_wallet(&wallet).await?;
        info!(wallet = %address, updated = report.updated, failed = report.failed, "Startup wallet connected");
    }

    let state = AppState::new(manager, storage);
    let app = router(state.clone());

    let host = env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port: u16 = env_parse(PORT_ENV).unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Token manager listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(wallet) = state.manager.disconnect_wallet().await {
        info!(wallet = %wallet, "Reconciler stopped");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
