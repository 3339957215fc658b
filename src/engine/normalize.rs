use serde::{Deserialize, Serialize};

use crate::models::order::{Order, RawStatus};

/// Canonical lifecycle state, independent of viewer role. Everything
/// downstream of the normalizer branches on this, never on raw record
/// fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Pending,
    Approved,
    Shipped,
    Delivered,
    ClearlotPaid,
    Completed,
    Rejected,
}

impl LifecycleState {
    /// Position along the success path. `Rejected` sits outside the path
    /// and compares to nothing.
    pub fn rank(self) -> Option<u8> {
        match self {
            LifecycleState::Pending => Some(0),
            LifecycleState::Approved => Some(1),
            LifecycleState::Shipped => Some(2),
            LifecycleState::Delivered => Some(3),
            LifecycleState::ClearlotPaid => Some(4),
            LifecycleState::Completed => Some(5),
            LifecycleState::Rejected => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Approved => "approved",
            LifecycleState::Shipped => "shipped",
            LifecycleState::Delivered => "delivered",
            LifecycleState::ClearlotPaid => "clearlot_paid",
            LifecycleState::Completed => "completed",
            LifecycleState::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(LifecycleState::Pending),
            "approved" => Some(LifecycleState::Approved),
            "shipped" => Some(LifecycleState::Shipped),
            "delivered" => Some(LifecycleState::Delivered),
            "clearlot_paid" => Some(LifecycleState::ClearlotPaid),
            "completed" => Some(LifecycleState::Completed),
            "rejected" => Some(LifecycleState::Rejected),
            _ => None,
        }
    }
}

/// Maps a raw persisted record to its canonical state. Total: a missing or
/// unrecognized status fails closed to `Pending`, since any other choice
/// risks exposing an action the record cannot actually support.
pub fn normalize(order: &Order) -> LifecycleState {
    match order.status {
        RawStatus::Pending | RawStatus::Unrecognized => LifecycleState::Pending,
        RawStatus::Approved => LifecycleState::Approved,
        RawStatus::Shipped => LifecycleState::Shipped,
        RawStatus::Delivered => LifecycleState::Delivered,
        RawStatus::ClearlotPaid => LifecycleState::ClearlotPaid,
        RawStatus::Completed => LifecycleState::Completed,
        RawStatus::Rejected => LifecycleState::Rejected,
    }
}

/// Whether a store write moving `from` to `to` is a legal lifecycle
/// transition: strictly forward along the success path, with `Rejected`
/// reachable from `Pending` only.
pub fn can_transition(from: LifecycleState, to: LifecycleState) -> bool {
    if from.is_terminal() {
        return false;
    }
    match to {
        LifecycleState::Rejected => from == LifecycleState::Pending,
        _ => match (from.rank(), to.rank()) {
            (Some(from_rank), Some(to_rank)) => to_rank > from_rank,
            _ => false,
        },
    }
}
