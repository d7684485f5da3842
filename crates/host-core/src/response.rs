//! Response payloads delivered by the host.

use serde::{Deserialize, Serialize};

use crate::Fingerprint;

/// The transport-level cause of a failed request, reported by the host when
/// no HTTP response was obtained at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportFailure {
    /// The request or connection timed out.
    Timeout,
    /// DNS, connect, or TLS failure.
    Network,
    /// Anything else (request build failure, body read error).
    Other,
}

/// One response from the host, either from a periodic poll or an on-demand
/// send.
///
/// `error` covers both transport failures (`failure` is set, `status` is 0)
/// and non-2xx HTTP responses (`status` is set, `failure` is not). Signals
/// are carried in-band with `restart` or `terminate` set and empty content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub url: String,
    #[serde(default)]
    pub env_suffix: Option<String>,
    pub status: u16,
    pub content: String,
    pub error: bool,
    #[serde(default)]
    pub failure: Option<TransportFailure>,
    #[serde(default)]
    pub restart: bool,
    #[serde(default)]
    pub terminate: bool,
}

impl ResponsePayload {
    /// A response that produced an HTTP status. `error` reflects non-2xx.
    pub fn from_http(
        url: impl Into<String>,
        env_suffix: Option<String>,
        status: u16,
        content: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            env_suffix,
            status,
            content: content.into(),
            error: !(200..300).contains(&status),
            failure: None,
            restart: false,
            terminate: false,
        }
    }

    /// A request that failed before any HTTP response existed.
    pub fn from_failure(
        url: impl Into<String>,
        env_suffix: Option<String>,
        failure: TransportFailure,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            env_suffix,
            status: 0,
            content: detail.into(),
            error: true,
            failure: Some(failure),
            restart: false,
            terminate: false,
        }
    }

    pub fn terminator() -> Self {
        Self {
            url: String::new(),
            env_suffix: None,
            status: 0,
            content: String::new(),
            error: false,
            failure: None,
            restart: false,
            terminate: true,
        }
    }

    pub fn restarter() -> Self {
        Self {
            url: String::new(),
            env_suffix: None,
            status: 0,
            content: String::new(),
            error: true,
            failure: None,
            restart: true,
            terminate: false,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.url.clone(), self.env_suffix.clone())
    }
}
