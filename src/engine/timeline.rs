use chrono::{DateTime, FixedOffset, Utc};
use tracing::warn;

use crate::engine::normalize::LifecycleState;
use crate::models::order::Order;
use crate::models::role::Role;

/// One reached milestone with its resolved display instant. `time` is
/// `None` when every candidate field was absent; the step still renders,
/// completion never depends on timestamp availability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStep {
    pub step: u8,
    pub time: Option<DateTime<Utc>>,
    pub corrected: bool,
}

/// Picks the raw display instant for one step from its role-specific
/// candidate chain: the first present field wins, `purchase_date` anchors
/// any step whose own candidates are all absent. No ordering correction
/// happens here.
pub fn resolve_step_time(
    order: &Order,
    state: LifecycleState,
    step: u8,
    role: Role,
) -> Option<DateTime<Utc>> {
    let approved_at = order.payment_details.as_ref().and_then(|p| p.approved_at);
    let shipped_at = order.shipping_details.as_ref().and_then(|s| s.shipped_at);
    let delivered_at = order.shipping_details.as_ref().and_then(|s| s.delivered_at);
    let confirmed_at = order
        .shipping_details
        .as_ref()
        .and_then(|s| s.delivery_confirmed_at);

    let resolved = match (step, role) {
        (1, _) => Some(order.purchase_date),
        (2, _) => approved_at,
        (3, _) => shipped_at.or(approved_at),
        (4, _) => delivered_at.or(confirmed_at).or(approved_at),
        (5, Role::Buyer | Role::Admin) => {
            // The buyer's terminal step: once the state is `delivered` the
            // carrier stamp is the truth, afterwards the confirmation stamp
            // takes over.
            let primary = if state == LifecycleState::Delivered {
                delivered_at.or(confirmed_at)
            } else {
                confirmed_at
            };
            primary.or(approved_at)
        }
        (5, Role::Seller) | (6, Role::Seller) => confirmed_at.or(approved_at),
        _ => None,
    };

    resolved.or(Some(order.purchase_date))
}

/// Resolves every step up to and including `current_step` and repairs
/// temporal inconsistencies: a step whose raw candidate lands strictly
/// before its predecessor's resolved time is clamped forward to that time.
/// The clamp only ever moves a step later, never earlier, and is logged for
/// offline data-quality review.
pub fn reconstruct(
    order: &Order,
    state: LifecycleState,
    role: Role,
    current_step: u8,
) -> Vec<ResolvedStep> {
    let mut timeline = Vec::with_capacity(current_step as usize);
    let mut floor: Option<DateTime<Utc>> = None;

    for step in 1..=current_step {
        let raw = resolve_step_time(order, state, step, role);

        let (time, corrected) = match (raw, floor) {
            (Some(t), Some(prev)) if t < prev => {
                warn!(
                    order_id = %order.id,
                    step,
                    raw_time = %t,
                    clamped_to = %prev,
                    "step timestamp precedes predecessor; clamping forward"
                );
                (Some(prev), true)
            }
            _ => (raw, false),
        };

        if let Some(t) = time {
            floor = Some(t);
        }

        timeline.push(ResolvedStep { step, time, corrected });
    }

    timeline
}

/// Formats a resolved instant for display in the platform's fixed civil
/// timezone: short date, short time, deterministic for a given stored
/// instant regardless of server local time.
pub fn format_step_time(time: DateTime<Utc>, platform_offset: FixedOffset) -> String {
    time.with_timezone(&platform_offset)
        .format("%b %-d, %Y %-I:%M %p")
        .to_string()
}

/// The marker shown for a reached step with no resolvable instant.
pub const TIME_UNKNOWN: &str = "unknown";

pub fn display_time(time: Option<DateTime<Utc>>, platform_offset: FixedOffset) -> String {
    match time {
        Some(t) => format_step_time(t, platform_offset),
        None => TIME_UNKNOWN.to_string(),
    }
}
