//! Poller deduplication.

use std::collections::HashMap;
use std::time::Duration;

use host_core::{Event, RequestPayload};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::info;

use crate::fetcher::Fetcher;

/// Holds one [`Fetcher`] per distinct request identity.
///
/// Two strategies subscribing to the same endpoint under the same
/// credential environment share a single poller; each delivered payload is
/// broadcast by the executor anyway.
#[derive(Default)]
pub(crate) struct FetchAggregator {
    fetchers: Mutex<HashMap<RequestPayload, Fetcher>>,
}

impl FetchAggregator {
    pub fn subscribe(
        &self,
        request: RequestPayload,
        period: Duration,
        events: mpsc::Sender<Event>,
    ) {
        let mut fetchers = self.fetchers.lock();
        fetchers.entry(request.clone()).or_insert_with(|| {
            info!(url = %request.url, period_ms = period.as_millis() as u64, "new poller created");
            Fetcher::spawn(request.clone(), period, events)
        });
    }

    pub fn len(&self) -> usize {
        self.fetchers.lock().len()
    }
}
