//! Out-of-band operator notifications.

use async_trait::async_trait;
use tracing::{error, warn};

/// Sink for the two out-of-band severity levels.
///
/// `notice` is informational ("strategy restarted"), `emergency` should wake
/// someone up. The default implementation logs; `host-http` provides a
/// webhook-backed one.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notice(&self, message: &str);
    async fn emergency(&self, message: &str);
}

/// Log-only notifier used when no delivery channel is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notice(&self, message: &str) {
        warn!(target: "notice", "{message}");
    }

    async fn emergency(&self, message: &str) {
        error!(target: "emergency", "{message}");
    }
}
