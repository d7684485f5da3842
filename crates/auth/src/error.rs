//! Auth error types.

use thiserror::Error;

/// Errors loading credentials or signing requests.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required environment variable is not set.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    /// The request names a signing scheme this build does not know.
    #[error("unknown signing scheme: {0}")]
    UnknownScheme(String),
}
