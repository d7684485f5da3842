//! One periodic poller.

use std::env;
use std::time::Duration;

use common::ExponentialBackoff;
use host_core::{Event, RequestPayload, ResponsePayload};
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, error};

use crate::transport;

/// A background task polling one request on a fixed period.
///
/// Successful and non-2xx responses are delivered as fetcher events
/// (non-2xx with `error = true`); transport failures are logged and retried
/// under exponential backoff without producing an event. Dropping the
/// handle kills the task.
pub(crate) struct Fetcher {
    kill: Option<oneshot::Sender<()>>,
}

impl Fetcher {
    pub fn spawn(request: RequestPayload, period: Duration, events: mpsc::Sender<Event>) -> Self {
        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(poll_loop(request, period, events, kill_rx));
        Self {
            kill: Some(kill_tx),
        }
    }
}

impl Drop for Fetcher {
    fn drop(&mut self) {
        if let Some(kill) = self.kill.take() {
            let _ = kill.send(());
        }
    }
}

/// Outbound clients for this poller. With `MANTIS_LOCAL_ADDRS` set (and the
/// request not marked `primary_only`), polls rotate across one client per
/// local address to spread rate limits.
fn build_clients(request: &RequestPayload) -> Vec<reqwest::Client> {
    let local_addrs = env::var("MANTIS_LOCAL_ADDRS")
        .ok()
        .filter(|_| !request.primary_only)
        .map(|raw| raw.split(',').map(String::from).collect::<Vec<_>>());

    match local_addrs {
        Some(addrs) if !addrs.is_empty() => addrs
            .into_iter()
            .filter_map(|addr| match addr.parse() {
                Ok(ip) => reqwest::Client::builder()
                    .local_address(Some(ip))
                    .build()
                    .ok(),
                Err(err) => {
                    error!(%addr, %err, "invalid local address, skipping");
                    None
                }
            })
            .collect(),
        _ => vec![reqwest::Client::new()],
    }
}

async fn poll_loop(
    request: RequestPayload,
    period: Duration,
    events: mpsc::Sender<Event>,
    mut kill: oneshot::Receiver<()>,
) {
    let clients = build_clients(&request);
    let clients = if clients.is_empty() {
        vec![reqwest::Client::new()]
    } else {
        clients
    };
    let mut backoff = ExponentialBackoff::default();
    let mut client_index = 0usize;
    let mut ticker = interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut kill => break,
        }

        let prepared = match transport::prepare(request.clone()) {
            Ok(prepared) => prepared,
            Err(err) => {
                error!(url = %request.url, %err, "cannot prepare poll request");
                continue;
            }
        };

        client_index = client_index.wrapping_add(1);
        let client = &clients[client_index % clients.len()];
        let response = tokio::select! {
            response = client.execute(prepared) => response,
            _ = &mut kill => break,
        };

        match response {
            Ok(response) => {
                backoff.reset();
                let status = response.status();
                if !status.is_success() {
                    error!(url = %request.url, %status, "poll returned an error status");
                }
                let content = match response.text().await {
                    Ok(content) => content,
                    Err(err) => {
                        error!(url = %request.url, %err, "cannot read poll response body");
                        continue;
                    }
                };
                let payload = ResponsePayload::from_http(
                    request.url.clone(),
                    request.env_suffix.clone(),
                    status.as_u16(),
                    content,
                );
                if events.send(Event::from_payload(payload, None)).await.is_err() {
                    debug!(url = %request.url, "event channel closed, stopping poller");
                    break;
                }
            }
            Err(err) => {
                let delay = backoff.next_delay();
                error!(
                    url = %request.url,
                    %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "poll request failed"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = &mut kill => break,
                }
            }
        }
    }
}
