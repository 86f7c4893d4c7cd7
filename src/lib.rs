//! # FlashFeast backend
//!
//! Food-ordering service: menu catalog, order creation with per-field
//! validation, and live order tracking.
//!
//! The interesting part is the status propagation pipeline. Creating an order
//! persists it as `Order Received` and starts a [`simulator::StatusSimulator`]
//! run that walks it through `Preparing`, `Out for Delivery` and `Delivered`
//! on a fixed per-stage delay, publishing every transition into the
//! [`rooms::Rooms`] channel keyed by order id. Clients tracking an order open
//! the `/ws` socket, join that room, and separately fetch one snapshot over
//! HTTP; the [`client`] module carries the reconciliation state machine that
//! merges the two streams, plus the file-persisted registry of "my orders".
//!
//! # Routes
//!
//! | Route               | Method    | Purpose                          |
//! |---------------------|-----------|----------------------------------|
//! | `/api/orders`       | POST      | create order, start simulation   |
//! | `/api/orders/{id}`  | GET       | current snapshot or 404          |
//! | `/api/menu`         | GET       | catalog listing                  |
//! | `/api/menu/seed`    | GET       | reset catalog to the sample set  |
//! | `/ws`               | GET       | subscription socket (joinOrder)  |
//!
//! # Configuration
//!
//! Env vars with logged defaults: `RUST_PORT` (5000), `REDIS_URL` (unset
//! means the in-memory store), `STAGE_DELAY_SECS` (10).

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod client;
pub mod config;
pub mod error;
pub mod menu;
pub mod order;
pub mod rooms;
pub mod routes;
pub mod simulator;
pub mod state;
pub mod store;

use routes::{create_order, menu as menu_handler, order_status, seed_menu, ws_handler};
use state::AppState;

/// Router over an already built state. Tests drive this directly with an
/// in-memory store.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/orders", post(create_order))
        .route("/api/orders/{id}", get(order_status))
        .route("/api/menu", get(menu_handler))
        .route("/api/menu/seed", get(seed_menu))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
