//! API credentials and request signing.
//!
//! Requests that carry a `sign` spec are signed host-side before dispatch,
//! using the credentials of the request's credential environment
//! (`env_suffix`). Strategies and adapters never see key material.

mod credentials;
mod error;
mod signer;

pub use credentials::ApiCredentials;
pub use error::AuthError;
pub use signer::{sign_request, RequestSigner};
