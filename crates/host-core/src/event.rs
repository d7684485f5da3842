//! The merged event stream the executor drains.

use std::sync::Arc;

use crate::{ResponsePayload, Token};

/// A control interrupt injected by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Shut the runtime down.
    Terminate,
    /// Tear every strategy down and reload it.
    Restart,
}

/// One event from the host.
///
/// Payloads are shared: a fetcher response is broadcast to every strategy,
/// so the executor hands out clones of the same `Arc`.
#[derive(Debug, Clone)]
pub enum Event {
    /// Terminate/restart control signal.
    Signal(Interrupt),
    /// A periodic poll produced a response.
    Fetcher(Arc<ResponsePayload>),
    /// An on-demand request completed.
    SendResponse {
        token: Token,
        payload: Arc<ResponsePayload>,
    },
}

impl Event {
    /// Builds an event from a raw response payload, honoring in-band
    /// signal flags.
    pub fn from_payload(payload: ResponsePayload, token: Option<Token>) -> Self {
        if payload.terminate {
            return Event::Signal(Interrupt::Terminate);
        }
        if payload.restart {
            return Event::Signal(Interrupt::Restart);
        }
        let payload = Arc::new(payload);
        match token {
            Some(token) => Event::SendResponse { token, payload },
            None => Event::Fetcher(payload),
        }
    }

    pub fn as_signal(&self) -> Option<Interrupt> {
        match self {
            Event::Signal(interrupt) => Some(*interrupt),
            _ => None,
        }
    }
}
