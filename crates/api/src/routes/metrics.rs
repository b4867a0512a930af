//! Prometheus metrics endpoint and metric descriptions.

use axum::Router;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use metrics::Unit;
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Routes serving `/metrics` from `handle`.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(render)).with_state(handle)
}

/// GET /metrics
pub async fn render(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_TEXT)], handle.render())
}

/// Registers help text for the metrics the services emit. Call once after
/// the recorder is installed.
pub fn describe() {
    metrics::describe_counter!("saga_orders_created_total", "Orders accepted by the orchestrator");
    metrics::describe_counter!(
        "saga_orders_replayed_total",
        "Create requests answered from an earlier order with the same idempotency key"
    );
    metrics::describe_counter!("saga_orders_canceled_total", "Orders moved to canceled");
    metrics::describe_counter!("saga_orders_paid_total", "Orders moved to paid");
    metrics::describe_counter!(
        "saga_compensations_total",
        "Compensating actions run after a failed saga step"
    );
    metrics::describe_counter!(
        "saga_validation_rejections_total",
        "Orders rejected by menu validation"
    );
    metrics::describe_histogram!(
        "saga_duration_seconds",
        Unit::Seconds,
        "Time to run the order placement saga"
    );
    metrics::describe_counter!("menu_validations_total", "Menu validation requests");
    metrics::describe_counter!("inventory_reservations_total", "Reservations created");
    metrics::describe_counter!(
        "inventory_reservations_rejected_total",
        "Reservations refused for insufficient stock"
    );
    metrics::describe_counter!(
        "inventory_reservations_expired_total",
        "Reservations released by the expiry sweep"
    );
    metrics::describe_counter!("billing_payment_intents_total", "Payment intents created");
    metrics::describe_counter!("billing_captures_total", "Payments captured");
    metrics::describe_counter!("billing_refunds_total", "Payments refunded");
}
