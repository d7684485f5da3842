//! Adapter error types.

use engine::EngineError;
use model::MarketParseError;
use thiserror::Error;

/// Errors surfaced by adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The market identifier did not parse.
    #[error(transparent)]
    Market(#[from] MarketParseError),

    /// The underlying engine operation failed (transport errors from the
    /// send helper arrive here).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The adapter does not implement this capability.
    #[error("adapter does not support {0}")]
    Unsupported(&'static str),

    /// The exchange acknowledged the request but reported a failure.
    #[error("exchange rejected request: {0}")]
    Exchange(String),

    /// The exchange's response did not have the expected shape.
    #[error("cannot decode exchange response: {0}")]
    Decode(String),
}

impl From<AdapterError> for EngineError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Engine(inner) => inner,
            other => EngineError::Callback(other.to_string()),
        }
    }
}
