//! Integration tests for the API server.

use std::sync::OnceLock;

use api::config::ServiceKind;
use api::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::Money;
use inventory::InventoryConfig;
use menu::NewMenuItem;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");
            api::routes::metrics::describe();
            handle
        })
        .clone()
}

/// Builds the all-in-one app with a small menu: X at 5.00, Y at 3.50 and an
/// unavailable Z.
async fn setup_with_config(config: InventoryConfig) -> (axum::Router, AppState) {
    let state = AppState::in_process(config);
    for item in [
        NewMenuItem::new("Burger", Money::from_cents(500)).with_id("X"),
        NewMenuItem::new("Fries", Money::from_cents(350)).with_id("Y"),
        NewMenuItem::new("Seasonal soup", Money::from_cents(400))
            .with_id("Z")
            .available(false),
    ] {
        state.catalog.create(item).await.unwrap();
    }
    let app = api::create_app(state.clone(), get_metrics_handle(), ServiceKind::All);
    (app, state)
}

async fn setup() -> (axum::Router, AppState) {
    setup_with_config(InventoryConfig::default()).await
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn order_body(key: Option<&str>) -> Value {
    let mut body = json!({
        "customer": {"id": "cust-1", "name": "Ada"},
        "items": [{"itemId": "X", "qty": 2, "unitPrice": "5.00"}]
    });
    if let Some(key) = key {
        body["idempotencyKey"] = json!(key);
    }
    body
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup().await;

    let (status, json) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "all");
    assert!(json["traceId"].as_str().unwrap().starts_with("trace_"));

    let (status, json) = send(&app, get("/v1/billing/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["service"], "billing");
}

#[tokio::test]
async fn test_trace_id_header_is_reused() {
    let (app, _) = setup().await;

    let request = Request::builder()
        .uri("/v1/orders/not-a-uuid")
        .header("x-trace-id", "trace_from_client")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "ORDER_NOT_FOUND");
    assert_eq!(json["error"]["traceId"], "trace_from_client");
}

#[tokio::test]
async fn test_order_lifecycle_end_to_end() {
    let (app, state) = setup().await;

    let (status, order) = send(&app, post("/v1/orders", order_body(Some("k-e2e")))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["totalAmount"], "10.00");
    assert_eq!(order["status"], "reserved");
    assert!(order["traceId"].is_string());
    let order_id = order["orderId"].as_str().unwrap().to_string();
    let payment_intent_id = order["paymentIntentId"].as_str().unwrap().to_string();
    assert!(order["reservationId"].is_string());

    let stock = state
        .inventory
        .stock_level(&common::ItemId::new("X"))
        .await
        .unwrap();
    assert_eq!(stock.reserved_quantity, 2);

    // Capturing through billing reports back to the order.
    let (status, capture) = send(
        &app,
        post_empty(&format!("/v1/billing/payments/{payment_intent_id}/capture")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(capture["status"], "captured");

    let (_, order) = send(&app, get(&format!("/v1/orders/{order_id}"))).await;
    assert_eq!(order["status"], "paid");

    let (status, order) = send(&app, post_empty(&format!("/v1/orders/{order_id}/cancel"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "canceled");

    let (_, intent) = send(
        &app,
        get(&format!("/v1/billing/payment-intents/{payment_intent_id}")),
    )
    .await;
    assert_eq!(intent["status"], "refunded");
    assert!(intent.get("clientSecret").is_none());
}

#[tokio::test]
async fn test_cancel_reserved_order_releases_stock() {
    let (app, state) = setup().await;

    let (_, order) = send(&app, post("/v1/orders", order_body(None))).await;
    let order_id = order["orderId"].as_str().unwrap();

    let (status, order) = send(&app, post_empty(&format!("/v1/orders/{order_id}/cancel"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "canceled");

    let stock = state
        .inventory
        .stock_level(&common::ItemId::new("X"))
        .await
        .unwrap();
    assert_eq!(stock.reserved_quantity, 0);
    assert_eq!(stock.available_quantity, 100);
}

#[tokio::test]
async fn test_replay_returns_same_order() {
    let (app, _) = setup().await;

    let (first_status, first) = send(&app, post("/v1/orders", order_body(Some("k-replay")))).await;
    let (second_status, second) = send(&app, post("/v1/orders", order_body(Some("k-replay")))).await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["orderId"], second["orderId"]);
    assert_eq!(first["paymentIntentId"], second["paymentIntentId"]);
}

#[tokio::test]
async fn test_menu_validation_failure() {
    let (app, _) = setup().await;

    let body = json!({
        "items": [
            {"itemId": "X", "qty": 1, "unitPrice": "4.00"},
            {"itemId": "Z", "qty": 1, "unitPrice": "4.00"}
        ]
    });
    let (status, json) = send(&app, post("/v1/orders", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "MENU_VALIDATION_FAILED");
    assert!(json["error"]["traceId"].is_string());
    let items = json["error"]["details"]["validatedItems"].as_array().unwrap();
    assert_eq!(items[0]["error"], "PRICE_MISMATCH");
    assert_eq!(items[1]["error"], "ITEM_UNAVAILABLE");
}

#[tokio::test]
async fn test_insufficient_stock_is_reported() {
    let (app, _) = setup_with_config(InventoryConfig {
        default_stock: Some(1),
        ..InventoryConfig::default()
    })
    .await;

    let (status, json) = send(&app, post("/v1/orders", order_body(None))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "INVENTORY_RESERVE_FAILED");
    assert!(json["error"]["details"]["orderId"].is_string());
    assert_eq!(json["error"]["details"]["upstream"]["code"], "INSUFFICIENT_STOCK");

    let order_id = json["error"]["details"]["orderId"].as_str().unwrap();
    let (_, order) = send(&app, get(&format!("/v1/orders/{order_id}"))).await;
    assert_eq!(order["status"], "canceled");
}

#[tokio::test]
async fn test_empty_order_rejected() {
    let (app, _) = setup().await;

    let (status, json) = send(&app, post("/v1/orders", json!({"items": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_oversized_quantities_rejected() {
    let (app, state) = setup().await;

    let body = json!({
        "items": [
            {"itemId": "X", "qty": 3_000_000_000u32, "unitPrice": "5.00"},
            {"itemId": "X", "qty": 3_000_000_000u32, "unitPrice": "5.00"}
        ]
    });
    let (status, json) = send(&app, post("/v1/orders", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
    assert!(state.inventory.list_stock().await.is_empty());
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let (app, _) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
    assert!(json["error"]["traceId"].is_string());
}

#[tokio::test]
async fn test_unknown_order_returns_404() {
    let (app, _) = setup().await;

    let (status, json) = send(
        &app,
        get("/v1/orders/00000000-0000-4000-8000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_event_returns_404() {
    let (app, _) = setup().await;

    let (_, order) = send(&app, post("/v1/orders", order_body(None))).await;
    let order_id = order["orderId"].as_str().unwrap();

    let (status, json) = send(
        &app,
        post(&format!("/v1/orders/{order_id}/events/shipped"), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "UNKNOWN_EVENT");
}

#[tokio::test]
async fn test_payment_captured_webhook() {
    let (app, _) = setup().await;

    let (_, order) = send(&app, post("/v1/orders", order_body(None))).await;
    let order_id = order["orderId"].as_str().unwrap();

    let (status, order) = send(
        &app,
        post_empty(&format!("/v1/orders/{order_id}/events/payment-captured")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "paid");

    // A second capture finds the order already paid.
    let (status, json) = send(
        &app,
        post_empty(&format!("/v1/orders/{order_id}/events/payment-captured")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "ORDER_INVALID_STATE");
}

#[tokio::test]
async fn test_commit_twice_conflicts() {
    let (app, _) = setup().await;

    let body = json!({
        "orderId": "00000000-0000-4000-8000-000000000001",
        "items": [{"itemId": "X", "qty": 1}]
    });
    let (status, receipt) = send(&app, post("/v1/inventory/reservations", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["status"], "reserved");
    let reservation_id = receipt["reservationId"].as_str().unwrap();

    let commit = format!("/v1/inventory/reservations/{reservation_id}/commit");
    let (status, state) = send(&app, post_empty(&commit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["status"], "committed");

    let (status, json) = send(&app, post_empty(&commit)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "RESERVATION_INVALID_STATE");
    assert_eq!(json["error"]["details"]["status"], "committed");
}

#[tokio::test]
async fn test_reservation_replay_and_stock_admin() {
    let (app, _) = setup().await;

    let request = Request::builder()
        .method("PUT")
        .uri("/v1/inventory/stock/Y")
        .header("content-type", "application/json")
        .body(Body::from(json!({"quantity": 5, "itemName": "Fries"}).to_string()))
        .unwrap();
    let (status, level) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(level["availableQuantity"], 5);

    let body = json!({
        "orderId": "00000000-0000-4000-8000-000000000002",
        "items": [{"itemId": "Y", "qty": 2}],
        "idempotencyKey": "k_reservation"
    });
    let (first, _) = send(&app, post("/v1/inventory/reservations", body.clone())).await;
    let (second, _) = send(&app, post("/v1/inventory/reservations", body)).await;
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::OK);

    let (_, stock) = send(&app, get("/v1/inventory/stock")).await;
    let fries = stock["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|level| level["itemId"] == "Y")
        .unwrap();
    assert_eq!(fries["reservedQuantity"], 2);
    assert_eq!(fries["availableQuantity"], 3);
}

#[tokio::test]
async fn test_menu_item_management() {
    let (app, _) = setup().await;

    let (status, item) = send(
        &app,
        post("/v1/menu/items", json!({"id": "W", "name": "Lemonade", "price": "2.50"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["price"], "2.50");

    let (status, json) = send(
        &app,
        post("/v1/menu/items", json!({"id": "W", "name": "Lemonade", "price": "2.50"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "ITEM_ALREADY_EXISTS");

    let (status, item) = send(
        &app,
        post("/v1/menu/items/W/availability", json!({"available": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["available"], false);

    let (_, menu) = send(&app, get("/v1/menu/items")).await;
    let ids: Vec<&str> = menu["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["id"].as_str())
        .collect();
    assert!(ids.contains(&"X"));
    assert!(!ids.contains(&"W"));
    assert!(!ids.contains(&"Z"));

    let (status, json) = send(&app, get("/v1/menu/items/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "ITEM_NOT_FOUND");
}

#[tokio::test]
async fn test_menu_validation_endpoint() {
    let (app, _) = setup().await;

    let body = json!({"items": [{"itemId": "Y", "qty": 3, "unitPrice": "3.50"}]});
    let (status, report) = send(&app, post("/v1/menu/validation", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["valid"], true);
    assert_eq!(report["validatedItems"][0]["currentPrice"], "3.50");
}

#[tokio::test]
async fn test_refund_route_cancels_order() {
    let (app, _) = setup().await;

    let (_, order) = send(&app, post("/v1/orders", order_body(None))).await;
    let order_id = order["orderId"].as_str().unwrap().to_string();
    let payment_intent_id = order["paymentIntentId"].as_str().unwrap().to_string();

    send(
        &app,
        post_empty(&format!("/v1/billing/payments/{payment_intent_id}/capture")),
    )
    .await;

    let (status, refund) = send(
        &app,
        post(
            "/v1/billing/refunds",
            json!({"orderId": order_id, "paymentIntentId": payment_intent_id, "amount": "10.00"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(refund["status"], "completed");

    let (_, order) = send(&app, get(&format!("/v1/orders/{order_id}"))).await;
    assert_eq!(order["status"], "canceled");
}

#[tokio::test]
async fn test_single_service_mounts_only_its_routes() {
    let state = AppState::in_process(InventoryConfig::default());
    let app = api::create_app(state, get_metrics_handle(), ServiceKind::Menu);

    let (status, json) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["service"], "menu");

    let (status, _) = send(&app, get("/v1/menu/items")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/v1/inventory/stock")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup().await;

    send(&app, post("/v1/orders", order_body(None))).await;

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("saga_orders_created_total"));
    assert!(text.contains("# HELP saga_orders_created_total"));
}
