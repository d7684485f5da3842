//! The live host: HTTP polling, on-demand sends, OS signals, and webhook
//! notifications.
//!
//! [`HttpHost`] implements the engine's [`host_core::Host`] port over
//! `reqwest`. Periodic polls are deduplicated by request identity in the
//! [`aggregator`], each backed by its own poll task; on-demand sends are
//! correlated by token; SIGINT/SIGTERM arrive as terminate signals on the
//! same event stream.

mod aggregator;
mod fetcher;
mod host;
mod notify;
mod transport;

pub use host::{HttpHost, HttpHostConfig};
pub use notify::WebhookNotifier;
pub use transport::HostHttpError;
