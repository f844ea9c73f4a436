use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// An outbound notification. Delivery is fire-and-forget: a failed send is
/// logged and dropped, and must never affect booking or payout state.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient_id: Uuid,
    pub event: &'static str,
    pub message: String,
    pub context: Value,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: Notification);
}

/// Forwards notifications to the configured delivery webhook. With no URL
/// configured it degrades to a log line.
pub struct WebhookNotificationSender {
    http_client: Client,
    webhook_url: Option<String>,
}

impl WebhookNotificationSender {
    pub fn new(http_client: Client, webhook_url: Option<String>) -> Self {
        Self {
            http_client,
            webhook_url,
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookNotificationSender {
    async fn send(&self, notification: Notification) {
        let Some(url) = self.webhook_url.as_deref() else {
            tracing::debug!(
                event = notification.event,
                recipient = %notification.recipient_id,
                "Notification webhook not configured, dropping"
            );
            return;
        };

        match self.http_client.post(url).json(&notification).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(
                    event = notification.event,
                    status = %response.status(),
                    "Notification delivery rejected"
                );
            }
            Err(e) => {
                tracing::warn!(
                    event = notification.event,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
}
