//! Shared fixtures for the engine's unit tests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::order::{Order, RawStatus};

pub fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().expect("valid rfc3339 timestamp")
}

/// A bare order snapshot in the given status: parties assigned, no payment
/// or shipping sub-objects yet.
pub fn order_with_status(status: RawStatus) -> Order {
    Order {
        id: Uuid::from_u128(1),
        buyer_id: Uuid::from_u128(2),
        seller_id: Uuid::from_u128(3),
        offer_id: Uuid::from_u128(4),
        status,
        payment_approval_status: Default::default(),
        shipping_approval_status: Default::default(),
        payment_details: None,
        shipping_details: None,
        delivery_details: None,
        has_rating: false,
        purchase_date: ts("2024-01-01T00:00:00Z"),
    }
}
