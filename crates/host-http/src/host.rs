//! The live [`Host`] implementation.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use host_core::{Event, Host, Interrupt, RequestPayload, ResponsePayload, Token};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::aggregator::FetchAggregator;
use crate::transport;

/// Tunables for the live host.
#[derive(Debug, Clone)]
pub struct HttpHostConfig {
    /// Timeout applied to on-demand sends. Polls use reqwest's default.
    pub send_timeout: Duration,
    /// Event channel capacity; pollers apply backpressure beyond it.
    pub channel_capacity: usize,
}

impl Default for HttpHostConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(2),
            channel_capacity: 256,
        }
    }
}

/// Live host over reqwest. Construct inside a tokio runtime.
pub struct HttpHost {
    events_tx: mpsc::Sender<Event>,
    events_rx: RefCell<mpsc::Receiver<Event>>,
    aggregator: FetchAggregator,
    send_client: reqwest::Client,
    next_token: AtomicU64,
    started: Instant,
}

impl HttpHost {
    pub fn new(config: HttpHostConfig) -> Rc<Self> {
        let (events_tx, events_rx) = mpsc::channel(config.channel_capacity);
        let send_client = reqwest::Client::builder()
            .connect_timeout(config.send_timeout)
            .timeout(config.send_timeout)
            .build()
            .expect("cannot build HTTP client");
        Rc::new(Self {
            events_tx,
            events_rx: RefCell::new(events_rx),
            aggregator: FetchAggregator::default(),
            send_client,
            next_token: AtomicU64::new(1),
            started: Instant::now(),
        })
    }

    /// Routes SIGINT/SIGTERM into the event stream as terminate signals.
    pub fn install_signals(&self) {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            info!("shutdown signal received");
            if events.send(Event::Signal(Interrupt::Terminate)).await.is_err() {
                error!("event channel closed before the terminate signal was delivered");
            }
        });
    }

    /// Injects a restart signal, tearing every strategy down and reloading
    /// it. The operator-facing equivalent of a config reload.
    pub async fn restart(&self) {
        let _ = self.events_tx.send(Event::Signal(Interrupt::Restart)).await;
    }

    /// Number of distinct pollers currently running.
    pub fn subscription_count(&self) -> usize {
        self.aggregator.len()
    }
}

#[async_trait(?Send)]
impl Host for HttpHost {
    fn subscribe(&self, request: RequestPayload, period: Duration) {
        self.aggregator
            .subscribe(request, period, self.events_tx.clone());
    }

    fn send(&self, request: RequestPayload) -> Token {
        let token = Token::from_u64(self.next_token.fetch_add(1, Ordering::Relaxed))
            .expect("token counter starts at 1");
        let events = self.events_tx.clone();
        let client = self.send_client.clone();
        let url = request.url.clone();
        let env_suffix = request.env_suffix.clone();

        tokio::spawn(async move {
            let payload = execute_send(&client, request).await.unwrap_or_else(|err| {
                ResponsePayload::from_failure(
                    url,
                    env_suffix,
                    host_core::TransportFailure::Other,
                    err.to_string(),
                )
            });
            if events
                .send(Event::SendResponse {
                    token,
                    payload: payload.into(),
                })
                .await
                .is_err()
            {
                error!("event channel closed, dropping send response");
            }
        });
        token
    }

    async fn next_event(&self) -> Event {
        match self.events_rx.borrow_mut().recv().await {
            Some(event) => event,
            // All senders gone; nothing will ever arrive again.
            None => Event::Signal(Interrupt::Terminate),
        }
    }

    fn millis(&self) -> Decimal {
        Decimal::try_from(self.started.elapsed().as_nanos()).unwrap_or(Decimal::MAX)
            / Decimal::new(1_000_000, 0)
    }
}

async fn execute_send(
    client: &reqwest::Client,
    request: RequestPayload,
) -> Result<ResponsePayload, crate::HostHttpError> {
    let url = request.url.clone();
    let env_suffix = request.env_suffix.clone();
    let prepared = transport::prepare(request)?;

    match client.execute(prepared).await {
        Ok(response) => {
            let status = response.status().as_u16();
            let content = response.text().await.unwrap_or_default();
            Ok(ResponsePayload::from_http(url, env_suffix, status, content))
        }
        Err(err) => Ok(ResponsePayload::from_failure(
            url,
            env_suffix,
            transport::classify(&err),
            err.to_string(),
        )),
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("cannot listen for SIGTERM");
    let mut sigint = signal(SignalKind::interrupt()).expect("cannot listen for SIGINT");
    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM"),
        _ = sigint.recv() => info!("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
