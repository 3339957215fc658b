use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::normalize::LifecycleState;
use crate::engine::view::{build_view, OrderView};
use crate::error::AppError;
use crate::models::order::{DeliveryDetails, Order, RawStatus};
use crate::models::role::Role;
use crate::state::AppState;
use crate::store::OrderQuery;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/view", get(get_order_view))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub offer_id: Uuid,
    pub delivery_details: Option<DeliveryDetails>,
}

/// Buyer purchase action: the only way an order comes into existence,
/// always in `pending`.
async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = Order {
        id: Uuid::new_v4(),
        buyer_id: payload.buyer_id,
        seller_id: payload.seller_id,
        offer_id: payload.offer_id,
        status: RawStatus::Pending,
        payment_approval_status: Default::default(),
        shipping_approval_status: Default::default(),
        payment_details: None,
        shipping_details: None,
        delivery_details: payload.delivery_details,
        has_rating: false,
        purchase_date: Utc::now(),
    };

    state.store.insert(order.clone());
    state
        .metrics
        .orders_total
        .with_label_values(&[LifecycleState::Pending.as_str()])
        .inc();

    state.publish(&order);
    state.notify_counterparty(
        &order,
        Role::Seller,
        &format!("New order {} awaiting payment", order.id),
    );

    tracing::info!(order_id = %order.id, buyer_id = %order.buyer_id, "order created");

    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.store.get(id)?))
}

#[derive(Deserialize)]
pub struct ListOrdersParams {
    pub buyer: Option<Uuid>,
    pub seller: Option<Uuid>,
    /// Comma-separated status names, e.g. `delivered,completed`.
    pub status: Option<String>,
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<Order>>, AppError> {
    let statuses = match params.status.as_deref() {
        Some(raw) => raw
            .split(',')
            .filter(|part| !part.is_empty())
            .map(|part| {
                LifecycleState::parse(part.trim())
                    .ok_or_else(|| AppError::BadRequest(format!("unknown status: {part}")))
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let query = OrderQuery {
        buyer_id: params.buyer,
        seller_id: params.seller,
        statuses,
    };

    Ok(Json(state.store.query(&query)))
}

#[derive(Deserialize)]
pub struct ViewParams {
    pub role: Role,
    pub viewer: Uuid,
}

/// The full derived view for one viewer: display step, repaired timeline,
/// permitted actions. Recomputed from the stored snapshot on every call.
async fn get_order_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewParams>,
) -> Result<Json<OrderView>, AppError> {
    let order = state.store.get(id)?;
    let view = build_view(
        &order,
        params.role,
        params.viewer,
        state.clock.as_ref(),
        state.platform_offset,
    )?;

    let corrections = view.corrections();
    if corrections > 0 {
        state
            .metrics
            .timeline_corrections_total
            .inc_by(corrections as u64);
    }

    Ok(Json(view))
}
