use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status as persisted. Buyer, seller, and admin each write this field
/// independently, so a snapshot may carry a value this build does not know;
/// such values deserialize to `Unrecognized` and the normalizer treats them
/// as `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RawStatus {
    #[default]
    Pending,
    Approved,
    Shipped,
    Delivered,
    ClearlotPaid,
    Completed,
    Rejected,
    #[serde(other, rename = "unknown")]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentApproval {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingApproval {
    #[default]
    Pending,
    Approved,
}

/// Written piecemeal: the buyer uploads the receipt fields, the admin later
/// stamps `approved_at`. Either half can be present without the other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub receipt_preview: Option<String>,
    pub receipt_file: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Every field individually optional: `status` may advance past the step a
/// field represents before the field arrives (last-write-wins store).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivery_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub recipient: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub offer_id: Uuid,
    #[serde(default)]
    pub status: RawStatus,
    #[serde(default)]
    pub payment_approval_status: PaymentApproval,
    #[serde(default)]
    pub shipping_approval_status: ShippingApproval,
    pub payment_details: Option<PaymentDetails>,
    pub shipping_details: Option<ShippingDetails>,
    pub delivery_details: Option<DeliveryDetails>,
    #[serde(default)]
    pub has_rating: bool,
    pub purchase_date: DateTime<Utc>,
}

/// Field-level partial update. `None` leaves the stored field untouched;
/// sub-object patches merge per field rather than replacing the object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
    pub status: Option<RawStatus>,
    pub payment_approval_status: Option<PaymentApproval>,
    pub shipping_approval_status: Option<ShippingApproval>,
    pub payment: Option<PaymentPatch>,
    pub shipping: Option<ShippingPatch>,
    pub delivery_details: Option<DeliveryDetails>,
    pub has_rating: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentPatch {
    pub receipt_preview: Option<String>,
    pub receipt_file: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingPatch {
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivery_confirmed_at: Option<DateTime<Utc>>,
    pub photos: Option<Vec<String>>,
    pub remarks: Option<String>,
}

impl Order {
    /// The most recent instant any field of this record was stamped with.
    /// Used only for the relative "last updated" label, never for step
    /// resolution.
    pub fn last_recorded_at(&self) -> DateTime<Utc> {
        let mut latest = self.purchase_date;

        if let Some(payment) = &self.payment_details {
            for t in [payment.timestamp, payment.approved_at].into_iter().flatten() {
                latest = latest.max(t);
            }
        }

        if let Some(shipping) = &self.shipping_details {
            let stamps = [
                shipping.shipped_at,
                shipping.delivered_at,
                shipping.delivery_confirmed_at,
            ];
            for t in stamps.into_iter().flatten() {
                latest = latest.max(t);
            }
        }

        latest
    }

    pub fn apply(&mut self, patch: OrderPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(approval) = patch.payment_approval_status {
            self.payment_approval_status = approval;
        }
        if let Some(approval) = patch.shipping_approval_status {
            self.shipping_approval_status = approval;
        }
        if let Some(payment) = patch.payment {
            let details = self.payment_details.get_or_insert_with(Default::default);
            if payment.receipt_preview.is_some() {
                details.receipt_preview = payment.receipt_preview;
            }
            if payment.receipt_file.is_some() {
                details.receipt_file = payment.receipt_file;
            }
            if payment.timestamp.is_some() {
                details.timestamp = payment.timestamp;
            }
            if payment.approved_at.is_some() {
                details.approved_at = payment.approved_at;
            }
        }
        if let Some(shipping) = patch.shipping {
            let details = self.shipping_details.get_or_insert_with(Default::default);
            if shipping.shipped_at.is_some() {
                details.shipped_at = shipping.shipped_at;
            }
            if shipping.delivered_at.is_some() {
                details.delivered_at = shipping.delivered_at;
            }
            if shipping.delivery_confirmed_at.is_some() {
                details.delivery_confirmed_at = shipping.delivery_confirmed_at;
            }
            if let Some(photos) = shipping.photos {
                details.photos = photos;
            }
            if shipping.remarks.is_some() {
                details.remarks = shipping.remarks;
            }
        }
        if let Some(address) = patch.delivery_details {
            self.delivery_details = Some(address);
        }
        if let Some(has_rating) = patch.has_rating {
            self.has_rating = has_rating;
        }
    }
}
