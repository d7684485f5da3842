//! A demo strategy: watch one endpoint and log every change.
//!
//! Useful as a smoke test against a real venue and as a template for
//! writing strategies: register subscriptions, install cleanup, hand the
//! main loop to the router.

use std::time::Duration;

use engine::{EngineError, StrategyCtx};
use host_core::RequestPayload;
use model::Snapshot;
use tracing::info;

pub async fn run(ctx: StrategyCtx, url: String, period: Duration) -> Result<(), EngineError> {
    let feed = ctx.register(RequestPayload::get(url), period, |payload| {
        Ok(Snapshot::Raw(serde_json::from_str(&payload.content)?))
    });

    ctx.atexit(|ctx| async move {
        info!(strategy = %ctx.name(), "watcher shutting down");
        Ok(())
    });

    ctx.on(move |tick| {
        let feed = feed.clone();
        async move {
            if let Some(Snapshot::Raw(value)) = tick.results.get(&feed) {
                info!(
                    feed = %tick.changed.fingerprint(),
                    %value,
                    "feed changed"
                );
            }
            Ok(())
        }
    })
    .await
}
