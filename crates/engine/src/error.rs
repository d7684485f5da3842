//! Engine error types and sentinels.

use host_core::{Interrupt, TransportError};
use thiserror::Error;

/// A failed parse callback.
///
/// Adapters construct these (usually via `From<serde_json::Error>`) when a
/// response payload does not decode into the expected canonical shape.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError(err.to_string())
    }
}

impl From<String> for ParseError {
    fn from(message: String) -> Self {
        ParseError(message)
    }
}

impl From<&str> for ParseError {
    fn from(message: &str) -> Self {
        ParseError(message.to_string())
    }
}

/// Errors flowing through the engine.
///
/// `Exit`, `Interrupt`, and `Network` are sentinels with dedicated handling
/// rather than failures: `Exit` unwinds a strategy's main loop normally,
/// interrupts break the executor's event loop, and `Network` is absorbed as
/// transient.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The strategy asked its main loop to stop. Not a failure.
    #[error("strategy requested exit")]
    Exit,

    /// A terminate/restart signal is propagating out of the event loop.
    #[error("interrupted: {0:?}")]
    Interrupt(Interrupt),

    /// The host reported a transient network condition; the executor logs
    /// and keeps running.
    #[error("host reported a network error")]
    Network,

    /// A task was resumed, or is suspended, without a registered want.
    #[error("strategy wants nothing")]
    WantsNothing,

    /// `Stopwatch::stop` was called on a stopped stopwatch.
    #[error("stopwatch is not running")]
    TimerStopped,

    /// An on-demand request failed; carries url, status, and content.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A subscription's parse callback failed.
    #[error("cannot parse payload for {fingerprint}: {source}")]
    Parse {
        fingerprint: String,
        source: ParseError,
    },

    /// A strategy failed on its very first resume. Fatal to startup.
    #[error("strategy '{strategy}' failed during startup: {source}")]
    Startup {
        strategy: String,
        #[source]
        source: Box<EngineError>,
    },

    /// A strategy-supplied callback failed for a domain-specific reason.
    #[error("{0}")]
    Callback(String),

    /// Unexpected failure (panicked task, broken invariant).
    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    /// True for the interrupt sentinels that must break the event loop.
    pub fn as_interrupt(&self) -> Option<Interrupt> {
        match self {
            EngineError::Interrupt(interrupt) => Some(*interrupt),
            _ => None,
        }
    }

    /// True if this is the clean-exit sentinel rather than a failure.
    pub fn is_exit(&self) -> bool {
        matches!(self, EngineError::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_accessors() {
        assert!(EngineError::Exit.is_exit());
        assert!(!EngineError::Network.is_exit());
        assert_eq!(
            EngineError::Interrupt(Interrupt::Restart).as_interrupt(),
            Some(Interrupt::Restart)
        );
        assert_eq!(EngineError::Exit.as_interrupt(), None);
    }

    #[test]
    fn test_parse_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let parse: ParseError = err.into();
        assert!(!parse.0.is_empty());
    }
}
