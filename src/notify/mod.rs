//! Notification side-channel. One message per state-advancing action,
//! addressed to the counterparty role. Strictly fire-and-forget: a failed
//! send is logged and never rolls back or blocks the store write that
//! preceded it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::role::Role;

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub order_id: Uuid,
    pub recipient: Role,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(buffer: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(buffer);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn notify(&self, order_id: Uuid, recipient: Role, message: impl Into<String>) {
        let notification = Notification {
            order_id,
            recipient,
            message: message.into(),
            sent_at: Utc::now(),
        };

        if let Err(err) = self.tx.send(notification) {
            warn!(order_id = %order_id, error = %err, "notification dropped: no subscribers");
        }
    }
}

/// Drains the notification channel. Actual delivery (mail, push) is an
/// external concern; this pump is the seam it would plug into, and it keeps
/// at least one subscriber alive so sends do not report as dropped.
pub async fn run_notification_pump(mut rx: broadcast::Receiver<Notification>) {
    info!("notification pump started");

    loop {
        match rx.recv().await {
            Ok(notification) => {
                info!(
                    order_id = %notification.order_id,
                    recipient = ?notification.recipient,
                    message = %notification.message,
                    "notification delivered"
                );
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "notification pump lagged; messages skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    warn!("notification pump stopped: channel closed");
}
