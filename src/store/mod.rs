//! The Order Record Store: one document per order, point reads,
//! field-level partial updates with last-write-wins semantics, and party
//! queries. In-memory here; the engine only ever sees snapshots, so the
//! backing store can change without touching it.

use dashmap::DashMap;
use uuid::Uuid;

use crate::engine::normalize::{normalize, LifecycleState};
use crate::error::AppError;
use crate::models::order::{Order, OrderPatch};

#[derive(Default)]
pub struct OrderStore {
    orders: DashMap<Uuid, Order>,
}

/// Filter for range queries: party id plus an optional status set. An
/// empty status set matches every status.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub buyer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub statuses: Vec<LifecycleState>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Result<Order, AppError> {
        self.orders
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
    }

    pub fn insert(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    /// Applies a field-level partial update and returns the fresh snapshot.
    /// Concurrent writers resolve last-write-wins per field; callers are
    /// expected to re-derive any view from the returned snapshot rather
    /// than patch derived state locally.
    pub fn patch(&self, id: Uuid, patch: OrderPatch) -> Result<Order, AppError> {
        let mut entry = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

        entry.apply(patch);
        Ok(entry.clone())
    }

    /// Snapshots matching the filter, ordered by purchase date descending.
    pub fn query(&self, query: &OrderQuery) -> Vec<Order> {
        let mut matches: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| {
                let order = entry.value();
                if let Some(buyer) = query.buyer_id {
                    if order.buyer_id != buyer {
                        return false;
                    }
                }
                if let Some(seller) = query.seller_id {
                    if order.seller_id != seller {
                        return false;
                    }
                }
                query.statuses.is_empty() || query.statuses.contains(&normalize(order))
            })
            .map(|entry| entry.value().clone())
            .collect();

        matches.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        matches
    }
}
