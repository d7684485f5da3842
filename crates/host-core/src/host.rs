//! The host capability port.

use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{Event, RequestPayload};

/// Correlates an on-demand request with its eventual response event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(NonZeroU64);

impl Token {
    pub fn from_u64(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Token)
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform capabilities the engine consumes.
///
/// Implemented for real by `host-http` and by the engine's simulated host in
/// tests. The trait is `?Send`: the engine runs on one thread and host
/// handles are held behind `Rc`.
#[async_trait(?Send)]
pub trait Host {
    /// Ask the host to poll `request` every `period`. Idempotent per
    /// request identity.
    fn subscribe(&self, request: RequestPayload, period: Duration);

    /// Fire an on-demand request. The response arrives later as an
    /// [`Event::SendResponse`] carrying the returned token.
    fn send(&self, request: RequestPayload) -> Token;

    /// The next event from the merged stream. Blocks until one is
    /// available.
    async fn next_event(&self) -> Event;

    /// Monotonic milliseconds since host start.
    fn millis(&self) -> Decimal;
}
