use std::sync::Arc;

use chrono::FixedOffset;
use tokio::sync::broadcast;

use crate::engine::clock::{Clock, SystemClock};
use crate::models::order::Order;
use crate::models::role::Role;
use crate::notify::{Notification, Notifier};
use crate::observability::metrics::Metrics;
use crate::store::OrderStore;

pub struct AppState {
    pub store: OrderStore,
    pub notifier: Notifier,
    /// Fresh snapshots after every successful write. Subscribers re-run the
    /// full pipeline per snapshot; there is no diff-based update path.
    pub order_events_tx: broadcast::Sender<Order>,
    pub metrics: Metrics,
    pub clock: Arc<dyn Clock>,
    pub platform_offset: FixedOffset,
}

impl AppState {
    pub fn new(
        event_buffer_size: usize,
        notify_buffer_size: usize,
        platform_offset: FixedOffset,
    ) -> (Self, broadcast::Receiver<Notification>) {
        let (order_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        let notifier = Notifier::new(notify_buffer_size);
        let notification_rx = notifier.subscribe();

        (
            Self {
                store: OrderStore::new(),
                notifier,
                order_events_tx,
                metrics: Metrics::new(),
                clock: Arc::new(SystemClock),
                platform_offset,
            },
            notification_rx,
        )
    }

    /// Publishes the fresh snapshot to subscribers. Fire-and-forget; a
    /// write is never rolled back because nobody was listening.
    pub fn publish(&self, order: &Order) {
        let _ = self.order_events_tx.send(order.clone());
    }

    /// Fires one counterparty notification, counting it. Fire-and-forget.
    pub fn notify_counterparty(&self, order: &Order, recipient: Role, message: &str) {
        let label = match recipient {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        };
        self.metrics
            .notifications_total
            .with_label_values(&[label])
            .inc();
        self.notifier.notify(order.id, recipient, message);
    }
}
