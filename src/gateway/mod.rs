//! HTTP gateway: routing, middleware and the server loop.

pub mod handlers;
pub mod middleware;
pub mod state;
pub mod types;

use std::future::Future;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use tokio::net::TcpListener;

use self::middleware::{auth_middleware, request_id_middleware};
use self::state::AppState;

/// Build the `/api/user` route tree.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/orders", post(handlers::orders_create).get(handlers::orders_list))
        .route("/balance", get(handlers::balance_get))
        .route("/balance/withdraw", post(handlers::withdraw_create))
        .route("/balance/history", get(handlers::history_list))
        .route("/withdrawals", get(handlers::withdrawals_list))
        .route("/promos", post(handlers::promo_apply))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .merge(protected);

    Router::new()
        .nest("/api/user", api)
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves, then stop accepting and drain.
pub async fn run_server(
    addr: String,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
