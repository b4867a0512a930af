//! HTTP surface for the restaurant services.
//!
//! One binary serves the menu, orders, inventory and billing APIs, either
//! all together or one per process, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod trace;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use chrono::Utc;
use inventory::InventoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::ServiceKind;
use state::AppState;
use trace::TraceId;

/// How often held reservations are checked for expiry.
pub const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Creates the Axum router for the services `service` covers.
pub fn create_app(state: AppState, metrics_handle: PrometheusHandle, service: ServiceKind) -> Router {
    let name = service.as_str();
    let mut app = Router::new().route(
        "/health",
        get(move |trace: TraceId| routes::health::check(trace, name)),
    );

    if service.serves(ServiceKind::Menu) {
        app = app.merge(routes::menu::router());
    }
    if service.serves(ServiceKind::Orders) {
        app = app.merge(routes::orders::router());
    }
    if service.serves(ServiceKind::Inventory) {
        app = app.merge(routes::inventory::router());
    }
    if service.serves(ServiceKind::Billing) {
        app = app.merge(routes::billing::router());
    }

    app.with_state(state)
        .merge(routes::metrics::router(metrics_handle))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Periodically hands back stock held by reservations that ran out.
pub fn spawn_expiry_sweeper(inventory: InventoryStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let expired = inventory.expire_due(Utc::now()).await;
            if !expired.is_empty() {
                tracing::info!(count = expired.len(), "expired reservations released");
            }
        }
    })
}
