//! The interface between exchange adapters and the engine.
//!
//! An adapter exports the capability set of [`ExchangeAdapter`]: the
//! `subscribe_*` operations register a polled endpoint with the strategy's
//! router and hand back a typed extractor; the order operations build a
//! request and go through the engine's send helper, so from the strategy's
//! point of view they are synchronous calls.
//!
//! Parsing exchange-specific JSON into the canonical shapes is the
//! adapter's whole job; everything on the engine side works on
//! [`model::Snapshot`] values and their structural equality.

mod adapter;
mod error;
mod extractor;

pub use adapter::{side_of, ExchangeAdapter};
pub use error::AdapterError;
pub use extractor::TypedExtractor;
