use serde::{Deserialize, Serialize};

use crate::engine::normalize::{normalize, LifecycleState};
use crate::engine::project::project;
use crate::models::order::Order;
use crate::models::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ViewUploadedReceipt,
    BeginShipmentUpload,
    ViewShipmentStatus,
    ConfirmDelivery,
    RateCounterparty,
    ContactPlatformSupport,
}

/// One permitted action, bound to the display step it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderAction {
    pub step: u8,
    pub kind: ActionKind,
    pub enabled: bool,
}

fn action(step: u8, kind: ActionKind) -> OrderAction {
    OrderAction { step, kind, enabled: true }
}

/// The ordered set of actions the viewing role may currently take. An
/// action whose precondition no longer holds is omitted entirely, never
/// returned disabled: `rate_counterparty` disappears for good once
/// `has_rating` flips. Read-only; executing an action is the handlers' job.
pub fn actions_for(order: &Order, role: Role) -> Vec<OrderAction> {
    let state = normalize(order);
    if state == LifecycleState::Rejected {
        return Vec::new();
    }

    let mut actions = Vec::new();

    match (role, state) {
        (Role::Buyer, LifecycleState::Pending) => {
            actions.push(action(1, ActionKind::ViewUploadedReceipt));
        }
        (Role::Seller, LifecycleState::Approved) => {
            actions.push(action(3, ActionKind::BeginShipmentUpload));
        }
        (Role::Seller, LifecycleState::Shipped) => {
            actions.push(action(3, ActionKind::ViewShipmentStatus));
        }
        (Role::Buyer, LifecycleState::Shipped) => {
            actions.push(action(3, ActionKind::ViewShipmentStatus));
            actions.push(action(4, ActionKind::ConfirmDelivery));
        }
        (Role::Buyer, LifecycleState::Delivered | LifecycleState::Completed)
            if !order.has_rating =>
        {
            actions.push(action(5, ActionKind::RateCounterparty));
        }
        (Role::Seller, LifecycleState::Completed) if !order.has_rating => {
            actions.push(action(6, ActionKind::RateCounterparty));
        }
        _ => {}
    }

    // Buyer and seller can reach platform support while the transaction is
    // live; closed orders offer nothing, and admin is the platform.
    if role != Role::Admin && !state.is_terminal() {
        actions.push(action(project(state, role), ActionKind::ContactPlatformSupport));
    }

    actions
}
