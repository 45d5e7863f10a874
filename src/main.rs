//! Pointbook service entry point: compose the config, storage, services,
//! background pollers and the HTTP gateway, then run until a shutdown
//! signal arrives and drain.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;

use pointbook::auth::AuthKeys;
use pointbook::config::AppConfig;
use pointbook::db::Database;
use pointbook::gateway::{self, state::AppState};
use pointbook::logging;
use pointbook::poller::{AccrualClient, AccrualPoller, WithdrawalFinalizer};
use pointbook::repo::Repo;
use pointbook::service::{OperationService, UserService};

/// In-flight requests get this long to finish after the shutdown signal.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cfg = AppConfig::load().context("error while loading config")?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting pointbook");

    let db = Database::connect(&cfg.database_uri)
        .await
        .context("db connection failed")?;
    db.migrate().await.context("db migration failed")?;

    let repo = Arc::new(Repo::new(db.pool().clone()));
    let users = Arc::new(UserService::new(Arc::clone(&repo)));
    let operations = Arc::new(OperationService::new(Arc::clone(&repo)));
    let auth = Arc::new(
        AuthKeys::new(cfg.auth_secret(), &cfg.auth_alg, cfg.auth_ttl)
            .context("auth setup failed")?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let client = AccrualClient::new(&cfg.accrual_address, cfg.accrual_timeout)
        .context("accrual client setup failed")?;
    let poller = AccrualPoller::new(Arc::clone(&operations), client, cfg.accrual_poll_interval);
    tokio::spawn(poller.run(shutdown_rx.clone()));

    let finalizer = WithdrawalFinalizer::new(Arc::clone(&operations));
    tokio::spawn(finalizer.run(shutdown_rx.clone()));

    let state = AppState::new(users, operations, auth);
    let server_shutdown = {
        let mut rx = shutdown_rx.clone();
        async move {
            let _ = rx.changed().await;
        }
    };
    let mut server = tokio::spawn(gateway::run_server(
        cfg.run_address.clone(),
        state,
        server_shutdown,
    ));

    tokio::select! {
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(true);
            match tokio::time::timeout(STOP_TIMEOUT, &mut server).await {
                Ok(joined) => joined.context("server task failed")??,
                Err(_) => {
                    tracing::warn!("drain deadline exceeded, aborting server");
                    server.abort();
                }
            }
        }
        joined = &mut server => {
            // the server ended on its own (e.g. the bind failed)
            let _ = shutdown_tx.send(true);
            joined.context("server task failed")??;
        }
    }

    db.close().await;
    tracing::info!("application stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
