//! Typed transport errors surfaced by the engine's send helper.

use thiserror::Error;

use crate::{ResponsePayload, TransportFailure};

/// Why a sent request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The transport timed out before a response arrived.
    Timeout,
    /// An HTTP response arrived with a non-2xx status.
    HttpStatus(u16),
    /// The connection could not be established.
    Network,
    /// Any other transport-level failure.
    Other,
}

/// A failed on-demand request, with enough context to log and decide.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("send to {url} failed ({kind:?}, status {status}): {content}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: String,
    pub status: u16,
    pub content: String,
}

impl TransportError {
    /// Classifies an errored response payload.
    pub fn from_payload(payload: &ResponsePayload) -> Self {
        let kind = match payload.failure {
            Some(TransportFailure::Timeout) => TransportErrorKind::Timeout,
            Some(TransportFailure::Network) => TransportErrorKind::Network,
            Some(TransportFailure::Other) => TransportErrorKind::Other,
            None => TransportErrorKind::HttpStatus(payload.status),
        };
        Self {
            kind,
            url: payload.url.clone(),
            status: payload.status,
            content: payload.content.clone(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}
