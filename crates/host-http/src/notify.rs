//! Webhook-backed operator notifications.

use async_trait::async_trait;
use host_core::Notifier;
use serde_json::json;
use tracing::{error, warn};

/// Posts notices and emergencies as JSON to a configured webhook.
///
/// Configure with `MANTIS_WEBHOOK_URL`; without it, callers should fall
/// back to [`host_core::LogNotifier`]. Delivery failures are logged, never
/// propagated: a broken pager must not take a strategy down with it.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Builds the notifier from `MANTIS_WEBHOOK_URL`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("MANTIS_WEBHOOK_URL").ok().map(Self::new)
    }

    async fn post(&self, level: &str, message: &str) {
        let body = json!({ "level": level, "message": message });
        match self.client.post(&self.url).json(&body).send().await {
            Ok(response) if !response.status().is_success() => {
                error!(
                    status = response.status().as_u16(),
                    level, "webhook rejected notification"
                );
            }
            Ok(_) => {}
            Err(err) => error!(%err, level, "cannot deliver notification"),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notice(&self, message: &str) {
        warn!(target: "notice", "{message}");
        self.post("notice", message).await;
    }

    async fn emergency(&self, message: &str) {
        error!(target: "emergency", "{message}");
        self.post("emergency", message).await;
    }
}
