use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use utoipa::ToSchema;
use uuid::Uuid;

/// Store-scoped notification fanned out to connected clients by the
/// external notification collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub store_id: Uuid,
    pub event: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PrintReason {
    NewOrder,
    ItemsAdded,
}

/// Request handed to the print-job dispatcher. Retry and hardware delivery
/// are the dispatcher's problem, not ours.
#[derive(Debug, Clone, Serialize)]
pub struct PrintJobRequest {
    pub order_id: Uuid,
    pub reason: PrintReason,
}

/// Post-commit event hand-off. Emission is fire-and-forget: a full or
/// closed channel never rolls back a committed state change.
#[derive(Clone)]
pub struct EventBus {
    notifications: broadcast::Sender<Notification>,
    print_jobs: mpsc::UnboundedSender<PrintJobRequest>,
}

impl EventBus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PrintJobRequest>) {
        let (notifications, _) = broadcast::channel(256);
        let (print_jobs, print_rx) = mpsc::unbounded_channel();
        (
            Self {
                notifications,
                print_jobs,
            },
            print_rx,
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn notify<T: Serialize>(&self, store_id: Uuid, event: &str, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, event, "failed to serialize notification payload");
                return;
            }
        };
        let notification = Notification {
            store_id,
            event: event.to_string(),
            payload,
        };
        // Err means no subscriber is currently connected, which is fine.
        if self.notifications.send(notification).is_err() {
            tracing::debug!(event, %store_id, "no notification subscribers");
        }
    }

    pub fn request_print(&self, order_id: Uuid, reason: PrintReason) {
        let job = PrintJobRequest { order_id, reason };
        if let Err(err) = self.print_jobs.send(job) {
            tracing::warn!(error = %err, %order_id, "print dispatcher unavailable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_reaches_subscriber() {
        let (bus, _print_rx) = EventBus::new();
        let mut rx = bus.subscribe();
        let store_id = Uuid::new_v4();

        bus.notify(store_id, "order.created", &serde_json::json!({"n": 1}));

        let received = rx.recv().await.expect("notification");
        assert_eq!(received.event, "order.created");
        assert_eq!(received.store_id, store_id);
    }

    #[tokio::test]
    async fn notify_without_subscribers_does_not_panic() {
        let (bus, _print_rx) = EventBus::new();
        bus.notify(Uuid::new_v4(), "check.paid", &serde_json::json!({}));
    }

    #[tokio::test]
    async fn print_request_is_queued() {
        let (bus, mut print_rx) = EventBus::new();
        let order_id = Uuid::new_v4();

        bus.request_print(order_id, PrintReason::ItemsAdded);

        let job = print_rx.recv().await.expect("print job");
        assert_eq!(job.order_id, order_id);
        assert!(matches!(job.reason, PrintReason::ItemsAdded));
    }
}
