//! Cross-cutting utilities: retry backoff, credential environments, and
//! logging setup.

mod backoff;
mod credential_env;
mod logging;

pub use backoff::ExponentialBackoff;
pub use credential_env::{CredentialEnv, CredentialEnvError};
pub use logging::init_logging;
