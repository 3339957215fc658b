//! Action handlers: the external collaborators that mutate order records.
//! Each handler validates the transition, performs one field-level store
//! write, then publishes the fresh snapshot and notifies the counterparty.
//! None of them patch derived state; clients re-fetch the view.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::normalize::{can_transition, normalize, LifecycleState};
use crate::error::AppError;
use crate::models::order::{
    DeliveryDetails, Order, OrderPatch, PaymentApproval, PaymentPatch, RawStatus, ShippingApproval,
    ShippingPatch,
};
use crate::models::role::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/:id/receipt", post(upload_receipt))
        .route("/orders/:id/approve-payment", post(approve_payment))
        .route("/orders/:id/reject-payment", post(reject_payment))
        .route("/orders/:id/address", post(update_address))
        .route("/orders/:id/ship", post(mark_shipped))
        .route("/orders/:id/approve-shipping", post(approve_shipping))
        .route("/orders/:id/confirm-delivery", post(confirm_delivery))
        .route("/orders/:id/payout", post(mark_paid_out))
        .route("/orders/:id/rate", post(rate_counterparty))
}

fn require_party(order: &Order, role: Role, actor: Uuid) -> Result<(), AppError> {
    let is_party = match role {
        Role::Buyer => order.buyer_id == actor,
        Role::Seller => order.seller_id == actor,
        Role::Admin => true,
    };

    if is_party {
        Ok(())
    } else {
        Err(AppError::RoleNotApplicable)
    }
}

fn require_transition(order: &Order, to: LifecycleState) -> Result<(), AppError> {
    let from = normalize(order);
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "order {} cannot move from {} to {}",
            order.id,
            from.as_str(),
            to.as_str()
        )))
    }
}

/// Store write plus the shared bookkeeping every state-advancing handler
/// does: transition metric, snapshot event, counterparty notification.
fn advance(
    state: &AppState,
    id: Uuid,
    patch: OrderPatch,
    to: LifecycleState,
    recipient: Role,
    message: &str,
    action: &str,
) -> Result<Order, AppError> {
    let updated = state.store.patch(id, patch)?;

    state
        .metrics
        .orders_total
        .with_label_values(&[to.as_str()])
        .inc();
    state
        .metrics
        .actions_total
        .with_label_values(&[action, "success"])
        .inc();
    state.publish(&updated);
    state.notify_counterparty(&updated, recipient, message);

    tracing::info!(order_id = %id, status = to.as_str(), action, "order advanced");

    Ok(updated)
}

#[derive(Deserialize)]
pub struct UploadReceiptRequest {
    pub actor: Uuid,
    pub receipt_preview: Option<String>,
    pub receipt_file: Option<String>,
}

/// Buyer uploads payment evidence. Does not advance the status; the admin
/// approval does that.
async fn upload_receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UploadReceiptRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.get(id)?;
    require_party(&order, Role::Buyer, payload.actor)?;

    if normalize(&order) != LifecycleState::Pending {
        return Err(AppError::Conflict(format!(
            "order {id} is no longer awaiting payment"
        )));
    }

    let updated = state.store.patch(
        id,
        OrderPatch {
            payment: Some(PaymentPatch {
                receipt_preview: payload.receipt_preview,
                receipt_file: payload.receipt_file,
                timestamp: Some(Utc::now()),
                ..Default::default()
            }),
            ..Default::default()
        },
    )?;

    state
        .metrics
        .actions_total
        .with_label_values(&["upload_receipt", "success"])
        .inc();
    state.publish(&updated);

    Ok(Json(updated))
}

/// Admin approves the uploaded payment: `pending` -> `approved`.
async fn approve_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.get(id)?;
    require_transition(&order, LifecycleState::Approved)?;

    let patch = OrderPatch {
        status: Some(RawStatus::Approved),
        payment_approval_status: Some(PaymentApproval::Approved),
        payment: Some(PaymentPatch {
            approved_at: Some(Utc::now()),
            ..Default::default()
        }),
        ..Default::default()
    };

    let updated = advance(
        &state,
        id,
        patch,
        LifecycleState::Approved,
        Role::Seller,
        &format!("Payment approved for order {id}; prepare shipment"),
        "approve_payment",
    )?;

    Ok(Json(updated))
}

/// Admin rejects the payment: `pending` -> `rejected`, the terminal
/// failure state.
async fn reject_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.get(id)?;
    require_transition(&order, LifecycleState::Rejected)?;

    let patch = OrderPatch {
        status: Some(RawStatus::Rejected),
        payment_approval_status: Some(PaymentApproval::Rejected),
        ..Default::default()
    };

    let updated = advance(
        &state,
        id,
        patch,
        LifecycleState::Rejected,
        Role::Buyer,
        &format!("Payment for order {id} was rejected"),
        "reject_payment",
    )?;

    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct UpdateAddressRequest {
    pub actor: Uuid,
    pub delivery_details: DeliveryDetails,
}

/// Buyer edits the delivery address; only legal before shipment.
async fn update_address(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAddressRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.get(id)?;
    require_party(&order, Role::Buyer, payload.actor)?;

    let current = normalize(&order);
    if !matches!(current, LifecycleState::Pending | LifecycleState::Approved) {
        return Err(AppError::Conflict(format!(
            "delivery address for order {id} is locked after shipment"
        )));
    }

    let updated = state.store.patch(
        id,
        OrderPatch {
            delivery_details: Some(payload.delivery_details),
            ..Default::default()
        },
    )?;

    state
        .metrics
        .actions_total
        .with_label_values(&["update_address", "success"])
        .inc();
    state.publish(&updated);

    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct MarkShippedRequest {
    pub actor: Uuid,
    pub photos: Option<Vec<String>>,
    pub remarks: Option<String>,
}

/// Seller ships: `approved` -> `shipped`. Shipment evidence still awaits
/// admin approval, which gates nothing in the display pipeline.
async fn mark_shipped(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkShippedRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.get(id)?;
    require_party(&order, Role::Seller, payload.actor)?;
    if normalize(&order) != LifecycleState::Approved {
        return Err(AppError::Conflict(format!(
            "order {id} is not ready to ship"
        )));
    }

    let patch = OrderPatch {
        status: Some(RawStatus::Shipped),
        shipping: Some(ShippingPatch {
            shipped_at: Some(Utc::now()),
            photos: payload.photos,
            remarks: payload.remarks,
            ..Default::default()
        }),
        ..Default::default()
    };

    let updated = advance(
        &state,
        id,
        patch,
        LifecycleState::Shipped,
        Role::Buyer,
        &format!("Order {id} has shipped"),
        "mark_shipped",
    )?;

    Ok(Json(updated))
}

/// Admin accepts the shipment evidence. Informational only: the order is
/// already displayed as shipped.
async fn approve_shipping(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.get(id)?;
    if normalize(&order) != LifecycleState::Shipped {
        return Err(AppError::Conflict(format!("order {id} is not shipped")));
    }

    let updated = state.store.patch(
        id,
        OrderPatch {
            shipping_approval_status: Some(ShippingApproval::Approved),
            ..Default::default()
        },
    )?;

    state
        .metrics
        .actions_total
        .with_label_values(&["approve_shipping", "success"])
        .inc();
    state.publish(&updated);

    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct ConfirmDeliveryRequest {
    pub actor: Uuid,
}

/// Buyer confirms receipt: `shipped` -> `delivered`. From here the order is
/// terminal for the buyer; the seller still waits on the platform payout.
async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmDeliveryRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.get(id)?;
    require_party(&order, Role::Buyer, payload.actor)?;
    if normalize(&order) != LifecycleState::Shipped {
        return Err(AppError::Conflict(format!(
            "order {id} has no shipment to confirm"
        )));
    }

    let patch = OrderPatch {
        status: Some(RawStatus::Delivered),
        shipping: Some(ShippingPatch {
            delivery_confirmed_at: Some(Utc::now()),
            ..Default::default()
        }),
        ..Default::default()
    };

    let updated = advance(
        &state,
        id,
        patch,
        LifecycleState::Delivered,
        Role::Seller,
        &format!("Buyer confirmed delivery of order {id}"),
        "confirm_delivery",
    )?;

    Ok(Json(updated))
}

/// Admin pays the seller out: `delivered` -> `clearlot_paid`, and a second
/// call finalizes `clearlot_paid` -> `completed`.
async fn mark_paid_out(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.get(id)?;

    let (raw, to, message) = match normalize(&order) {
        LifecycleState::Delivered => (
            RawStatus::ClearlotPaid,
            LifecycleState::ClearlotPaid,
            format!("Payout for order {id} is on its way"),
        ),
        LifecycleState::ClearlotPaid => (
            RawStatus::Completed,
            LifecycleState::Completed,
            format!("Order {id} is complete"),
        ),
        other => {
            return Err(AppError::Conflict(format!(
                "order {id} is not awaiting payout (status {})",
                other.as_str()
            )))
        }
    };

    let patch = OrderPatch {
        status: Some(raw),
        ..Default::default()
    };

    let updated = advance(&state, id, patch, to, Role::Seller, &message, "mark_paid_out")?;

    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct RateRequest {
    pub actor: Uuid,
}

/// Either party rates the other, once. Sets the flag that permanently
/// removes the rate action from both sides.
async fn rate_counterparty(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RateRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.get(id)?;

    let role = if order.buyer_id == payload.actor {
        Role::Buyer
    } else if order.seller_id == payload.actor {
        Role::Seller
    } else {
        return Err(AppError::RoleNotApplicable);
    };

    if order.has_rating {
        return Err(AppError::Conflict(format!("order {id} is already rated")));
    }

    let current = normalize(&order);
    let may_rate = match role {
        Role::Buyer => matches!(
            current,
            LifecycleState::Delivered | LifecycleState::Completed
        ),
        Role::Seller => current == LifecycleState::Completed,
        Role::Admin => false,
    };
    if !may_rate {
        return Err(AppError::Conflict(format!(
            "order {id} cannot be rated yet"
        )));
    }

    let updated = state.store.patch(
        id,
        OrderPatch {
            has_rating: Some(true),
            ..Default::default()
        },
    )?;

    state
        .metrics
        .actions_total
        .with_label_values(&["rate_counterparty", "success"])
        .inc();
    state.publish(&updated);

    Ok(Json(updated))
}
