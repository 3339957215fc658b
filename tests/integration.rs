use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::FixedOffset;
use clearlot_orders::api::rest::router;
use clearlot_orders::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn setup() -> (axum::Router, Arc<AppState>) {
    let offset = FixedOffset::east_opt(8 * 3600).unwrap();
    let (state, _notification_rx) = AppState::new(1024, 1024, offset);
    let shared = Arc::new(state);
    (router(shared.clone()), shared)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn create_order(app: &axum::Router, buyer: Uuid, seller: Uuid) -> Value {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders",
            json!({
                "buyer_id": buyer,
                "seller_id": seller,
                "offer_id": Uuid::new_v4(),
                "delivery_details": {
                    "recipient": "Sam Buyer",
                    "phone": "+63 900 000 0000",
                    "address": "12 Pier Road",
                    "city": "Manila",
                    "notes": null
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn post_action(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let res = app.clone().oneshot(json_request("POST", uri, body)).await.unwrap();
    let status = res.status();
    (status, body_json(res).await)
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["orders"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let _body = body_string(response).await;
}

#[tokio::test]
async fn get_nonexistent_order_returns_404() {
    let (app, _state) = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/orders/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_order_starts_pending() {
    let (app, _state) = setup();
    let order = create_order(&app, Uuid::new_v4(), Uuid::new_v4()).await;

    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_approval_status"], "pending");
    assert_eq!(order["has_rating"], false);
    assert!(order["payment_details"].is_null());
    assert!(order["shipping_details"].is_null());
}

#[tokio::test]
async fn stranger_cannot_fetch_a_party_view() {
    let (app, _state) = setup();
    let order = create_order(&app, Uuid::new_v4(), Uuid::new_v4()).await;
    let id = order["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(get_request(&format!(
            "/orders/{id}/view?role=buyer&viewer={}",
            Uuid::new_v4()
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Admin is always applicable.
    let res = app
        .oneshot(get_request(&format!(
            "/orders/{id}/view?role=admin&viewer={}",
            Uuid::new_v4()
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn full_lifecycle_flow() {
    let (app, _state) = setup();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();

    let order = create_order(&app, buyer, seller).await;
    let id = order["id"].as_str().unwrap().to_string();

    // Buyer uploads payment proof.
    let (status, body) = post_action(
        &app,
        &format!("/orders/{id}/receipt"),
        json!({ "actor": buyer, "receipt_preview": "receipts/preview-1.png", "receipt_file": "receipts/full-1.pdf" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["payment_details"]["receipt_file"], "receipts/full-1.pdf");

    // Admin approves payment.
    let (status, body) = post_action(&app, &format!("/orders/{id}/approve-payment"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert!(!body["payment_details"]["approved_at"].is_null());

    // Seller ships.
    let (status, body) = post_action(
        &app,
        &format!("/orders/{id}/ship"),
        json!({ "actor": seller, "photos": ["shipments/box-1.jpg"], "remarks": "fragile" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "shipped");
    assert_eq!(body["shipping_approval_status"], "pending");

    // Buyer's view mid-flight: step 3 of 5, confirm_delivery offered.
    let res = app
        .clone()
        .oneshot(get_request(&format!(
            "/orders/{id}/view?role=buyer&viewer={buyer}"
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let view = body_json(res).await;
    assert_eq!(view["step"], 3);
    assert_eq!(view["step_count"], 5);
    assert_eq!(view["terminal"], false);
    let kinds: Vec<&str> = view["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"confirm_delivery"));
    assert!(kinds.contains(&"view_shipment_status"));

    // Buyer confirms delivery.
    let (status, body) =
        post_action(&app, &format!("/orders/{id}/confirm-delivery"), json!({ "actor": buyer })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "delivered");

    // Terminal divergence: buyer sees completed, seller sees payout pending.
    let res = app
        .clone()
        .oneshot(get_request(&format!(
            "/orders/{id}/view?role=buyer&viewer={buyer}"
        )))
        .await
        .unwrap();
    let buyer_view = body_json(res).await;
    assert_eq!(buyer_view["step"], 5);
    assert_eq!(buyer_view["terminal"], true);

    let res = app
        .clone()
        .oneshot(get_request(&format!(
            "/orders/{id}/view?role=seller&viewer={seller}"
        )))
        .await
        .unwrap();
    let seller_view = body_json(res).await;
    assert_eq!(seller_view["step"], 5);
    assert_eq!(seller_view["terminal"], false);
    assert_eq!(seller_view["step_label"], "Awaiting Payout");

    // Admin pays out, twice: clearlot_paid then completed.
    let (status, body) = post_action(&app, &format!("/orders/{id}/payout"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "clearlot_paid");

    let (status, body) = post_action(&app, &format!("/orders/{id}/payout"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    // Seller rates; the action then disappears for good.
    let (status, body) =
        post_action(&app, &format!("/orders/{id}/rate"), json!({ "actor": seller })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_rating"], true);

    let res = app
        .clone()
        .oneshot(get_request(&format!(
            "/orders/{id}/view?role=seller&viewer={seller}"
        )))
        .await
        .unwrap();
    let rated_view = body_json(res).await;
    assert_eq!(rated_view["step"], 6);
    assert!(rated_view["actions"].as_array().unwrap().is_empty());

    let (status, _body) =
        post_action(&app, &format!("/orders/{id}/rate"), json!({ "actor": buyer })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn shipping_before_approval_conflicts() {
    let (app, _state) = setup();
    let seller = Uuid::new_v4();
    let order = create_order(&app, Uuid::new_v4(), seller).await;
    let id = order["id"].as_str().unwrap();

    let (status, _body) = post_action(
        &app,
        &format!("/orders/{id}/ship"),
        json!({ "actor": seller, "photos": null, "remarks": null }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn rejected_order_short_circuits_everything() {
    let (app, _state) = setup();
    let buyer = Uuid::new_v4();
    let order = create_order(&app, buyer, Uuid::new_v4()).await;
    let id = order["id"].as_str().unwrap().to_string();

    let (status, body) = post_action(&app, &format!("/orders/{id}/reject-payment"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let res = app
        .clone()
        .oneshot(get_request(&format!(
            "/orders/{id}/view?role=buyer&viewer={buyer}"
        )))
        .await
        .unwrap();
    let view = body_json(res).await;
    assert_eq!(view["step"], 0);
    assert_eq!(view["step_label"], "Cancelled");
    assert!(view["steps"].as_array().unwrap().is_empty());
    assert!(view["actions"].as_array().unwrap().is_empty());

    // Rejection is terminal.
    let (status, _body) = post_action(&app, &format!("/orders/{id}/approve-payment"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn address_is_locked_after_shipment() {
    let (app, _state) = setup();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let order = create_order(&app, buyer, seller).await;
    let id = order["id"].as_str().unwrap().to_string();

    let new_address = json!({
        "actor": buyer,
        "delivery_details": {
            "recipient": "Sam Buyer",
            "phone": "+63 900 000 0000",
            "address": "7 Harbor Lane",
            "city": "Cebu",
            "notes": "gate code 4411"
        }
    });

    let (status, body) =
        post_action(&app, &format!("/orders/{id}/address"), new_address.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivery_details"]["city"], "Cebu");

    post_action(&app, &format!("/orders/{id}/approve-payment"), json!({})).await;
    post_action(
        &app,
        &format!("/orders/{id}/ship"),
        json!({ "actor": seller, "photos": null, "remarks": null }),
    )
    .await;

    let (status, _body) = post_action(&app, &format!("/orders/{id}/address"), new_address).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn list_orders_filters_by_party_and_status() {
    let (app, _state) = setup();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();

    let first = create_order(&app, buyer, seller).await;
    let _second = create_order(&app, buyer, Uuid::new_v4()).await;
    let _other = create_order(&app, Uuid::new_v4(), seller).await;

    let first_id = first["id"].as_str().unwrap().to_string();
    post_action(&app, &format!("/orders/{first_id}/approve-payment"), json!({})).await;

    let res = app
        .clone()
        .oneshot(get_request(&format!("/orders?buyer={buyer}")))
        .await
        .unwrap();
    let list = body_json(res).await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let res = app
        .clone()
        .oneshot(get_request(&format!("/orders?buyer={buyer}&status=approved")))
        .await
        .unwrap();
    let list = body_json(res).await;
    let arr = list.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["id"], first_id);

    let res = app
        .oneshot(get_request(&format!("/orders?buyer={buyer}&status=bogus")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn anomalous_timestamps_are_repaired_in_the_view() {
    let (app, state) = setup();
    let buyer = Uuid::new_v4();
    let id = Uuid::new_v4();

    // Snapshot with a backdated shipped_at, the clock-skew scenario the
    // reconstructor exists to paper over.
    use clearlot_orders::models::order::{Order, PaymentDetails, RawStatus, ShippingDetails};
    state.store.insert(Order {
        id,
        buyer_id: buyer,
        seller_id: Uuid::new_v4(),
        offer_id: Uuid::new_v4(),
        status: RawStatus::Shipped,
        payment_approval_status: Default::default(),
        shipping_approval_status: Default::default(),
        payment_details: Some(PaymentDetails {
            approved_at: Some("2024-01-02T10:00:00Z".parse().unwrap()),
            ..Default::default()
        }),
        shipping_details: Some(ShippingDetails {
            shipped_at: Some("2024-01-01T09:00:00Z".parse().unwrap()),
            ..Default::default()
        }),
        delivery_details: None,
        has_rating: false,
        purchase_date: "2024-01-01T00:00:00Z".parse().unwrap(),
    });

    let res = app
        .oneshot(get_request(&format!(
            "/orders/{id}/view?role=buyer&viewer={buyer}"
        )))
        .await
        .unwrap();
    let view = body_json(res).await;

    let steps = view["steps"].as_array().unwrap();
    assert_eq!(steps[2]["time"], "2024-01-02T10:00:00Z");
    assert_eq!(steps[2]["corrected"], true);
    assert_eq!(state.metrics.timeline_corrections_total.get(), 1);
}
