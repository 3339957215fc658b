use uuid::Uuid;

use crate::engine::normalize::LifecycleState;
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::role::Role;

/// Synthetic display step for rejected orders, shared by all roles.
pub const CANCELLED_STEP: u8 = 0;

/// Metadata for one milestone in a role's step list.
#[derive(Debug, Clone, Copy)]
pub struct StepInfo {
    pub index: u8,
    pub label: &'static str,
    pub icon: &'static str,
    pub terminal: bool,
}

/// The buyer's five milestones. "Delivered" (step 4) is a timeline row the
/// buyer passes through but no state maps onto it directly: confirming
/// receipt jumps the buyer straight to the terminal step.
const BUYER_STEPS: [StepInfo; 5] = [
    StepInfo { index: 1, label: "Awaiting Payment", icon: "step-receipt", terminal: false },
    StepInfo { index: 2, label: "Payment Approved", icon: "step-paid", terminal: false },
    StepInfo { index: 3, label: "Shipped", icon: "step-truck", terminal: false },
    StepInfo { index: 4, label: "Delivered", icon: "step-box", terminal: false },
    StepInfo { index: 5, label: "Completed", icon: "step-check", terminal: true },
];

/// The seller's six milestones. Step 5 is the payout-pending stage the
/// buyer never sees: informative for the seller, actionable only for admin.
const SELLER_STEPS: [StepInfo; 6] = [
    StepInfo { index: 1, label: "Awaiting Payment", icon: "step-receipt", terminal: false },
    StepInfo { index: 2, label: "Payment Approved", icon: "step-paid", terminal: false },
    StepInfo { index: 3, label: "Shipped", icon: "step-truck", terminal: false },
    StepInfo { index: 4, label: "Delivered", icon: "step-box", terminal: false },
    StepInfo { index: 5, label: "Awaiting Payout", icon: "step-hourglass", terminal: false },
    StepInfo { index: 6, label: "Completed", icon: "step-check", terminal: true },
];

const CANCELLED_INFO: StepInfo = StepInfo {
    index: CANCELLED_STEP,
    label: "Cancelled",
    icon: "step-cross",
    terminal: true,
};

/// The ordered step list a role sees. Admin reads the buyer's framing: an
/// observer, not a party, for this subsystem.
pub fn steps_for(role: Role) -> &'static [StepInfo] {
    match role {
        Role::Buyer | Role::Admin => &BUYER_STEPS,
        Role::Seller => &SELLER_STEPS,
    }
}

pub fn step_info(role: Role, step: u8) -> StepInfo {
    if step == CANCELLED_STEP {
        return CANCELLED_INFO;
    }
    steps_for(role)[step as usize - 1]
}

/// Maps canonical state to the role's 1-based display step. Rejected is
/// step 0 for every role; the buyer collapses delivered, paid-out, and
/// completed into the same terminal step.
pub fn project(state: LifecycleState, role: Role) -> u8 {
    match role {
        Role::Buyer | Role::Admin => match state {
            LifecycleState::Pending => 1,
            LifecycleState::Approved => 2,
            LifecycleState::Shipped => 3,
            LifecycleState::Delivered
            | LifecycleState::ClearlotPaid
            | LifecycleState::Completed => 5,
            LifecycleState::Rejected => CANCELLED_STEP,
        },
        Role::Seller => match state {
            LifecycleState::Pending => 1,
            LifecycleState::Approved => 2,
            LifecycleState::Shipped => 3,
            LifecycleState::Delivered => 5,
            LifecycleState::ClearlotPaid | LifecycleState::Completed => 6,
            LifecycleState::Rejected => CANCELLED_STEP,
        },
    }
}

/// Confirms the viewer may take the requested role on this order. Admin
/// sees any order; buyer and seller must match the record's party ids.
/// Anyone else gets `RoleNotApplicable`, the one engine error that
/// propagates — callers must deny access rather than guess a role.
pub fn authorize_role(order: &Order, requested: Role, viewer: Uuid) -> Result<Role, AppError> {
    let applicable = match requested {
        Role::Admin => true,
        Role::Buyer => order.buyer_id == viewer,
        Role::Seller => order.seller_id == viewer,
    };

    if applicable {
        Ok(requested)
    } else {
        Err(AppError::RoleNotApplicable)
    }
}
