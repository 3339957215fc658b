use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::actions::{actions_for, OrderAction};
use crate::engine::clock::{relative_label, Clock};
use crate::engine::normalize::{normalize, LifecycleState};
use crate::engine::project::{authorize_role, project, step_info, steps_for, CANCELLED_STEP};
use crate::engine::timeline::{display_time, reconstruct};
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::role::Role;

/// One row of the rendered step list. Reached steps always carry a
/// `time_display`; `"unknown"` is a valid value there, not an omission.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub index: u8,
    pub label: &'static str,
    pub icon: &'static str,
    pub terminal: bool,
    pub reached: bool,
    pub time: Option<DateTime<Utc>>,
    pub time_display: Option<String>,
    pub corrected: bool,
}

/// Everything the rendering layer needs for one order and one viewer:
/// display step, per-step timestamp table, and permitted actions. Derived
/// on every access, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order_id: Uuid,
    pub role: Role,
    pub state: LifecycleState,
    pub step: u8,
    pub step_count: u8,
    pub step_label: &'static str,
    pub terminal: bool,
    pub steps: Vec<StepView>,
    pub actions: Vec<OrderAction>,
    pub last_updated: String,
}

impl OrderView {
    /// How many timeline clamps this view absorbed, for the data-quality
    /// counter kept by the caller.
    pub fn corrections(&self) -> usize {
        self.steps.iter().filter(|s| s.corrected).count()
    }
}

/// Runs the full pipeline for one snapshot: authorize, normalize, project,
/// reconstruct the timeline, resolve actions. Rejected orders short-circuit
/// to the synthetic cancelled step with an empty timeline and no actions.
pub fn build_view(
    order: &Order,
    requested: Role,
    viewer: Uuid,
    clock: &dyn Clock,
    platform_offset: FixedOffset,
) -> Result<OrderView, AppError> {
    let role = authorize_role(order, requested, viewer)?;
    let state = normalize(order);
    let step = project(state, role);
    let last_updated = relative_label(order.last_recorded_at(), clock.now());

    if state == LifecycleState::Rejected {
        let info = step_info(role, CANCELLED_STEP);
        return Ok(OrderView {
            order_id: order.id,
            role,
            state,
            step: CANCELLED_STEP,
            step_count: steps_for(role).len() as u8,
            step_label: info.label,
            terminal: true,
            steps: Vec::new(),
            actions: Vec::new(),
            last_updated,
        });
    }

    let timeline = reconstruct(order, state, role, step);

    let steps = steps_for(role)
        .iter()
        .map(|info| {
            let resolved = timeline.iter().find(|entry| entry.step == info.index);
            StepView {
                index: info.index,
                label: info.label,
                icon: info.icon,
                terminal: info.terminal,
                reached: resolved.is_some(),
                time: resolved.and_then(|entry| entry.time),
                time_display: resolved
                    .map(|entry| display_time(entry.time, platform_offset)),
                corrected: resolved.is_some_and(|entry| entry.corrected),
            }
        })
        .collect();

    let current = step_info(role, step);

    Ok(OrderView {
        order_id: order.id,
        role,
        state,
        step,
        step_count: steps_for(role).len() as u8,
        step_label: current.label,
        terminal: current.terminal,
        steps,
        actions: actions_for(order, role),
        last_updated,
    })
}
