//! Request payloads emitted by adapters and consumed by the host.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::Fingerprint;

/// HTTP method subset the host transport accepts. Serialized lowercase;
/// uppercase spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[serde(alias = "GET")]
    Get,
    #[serde(alias = "POST")]
    Post,
    #[serde(alias = "PUT")]
    Put,
    #[serde(alias = "DELETE")]
    Delete,
    #[serde(alias = "PATCH")]
    Patch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Patch => "patch",
        };
        write!(f, "{s}")
    }
}

/// Whether and how a request should be signed before dispatch.
///
/// Older adapters passed a bare boolean; newer ones name the signing scheme.
/// Both forms are accepted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignSpec {
    Enabled(bool),
    Adapter(String),
}

impl SignSpec {
    pub fn is_enabled(&self) -> bool {
        match self {
            SignSpec::Enabled(enabled) => *enabled,
            SignSpec::Adapter(_) => true,
        }
    }

    /// The named signing scheme, if any.
    pub fn adapter(&self) -> Option<&str> {
        match self {
            SignSpec::Adapter(name) => Some(name),
            SignSpec::Enabled(_) => None,
        }
    }
}

/// An HTTP request as adapters describe it.
///
/// Identity (`Hash`/`Eq`) is `(url, method, body, env_suffix)`: two
/// subscriptions to the same endpoint under the same credential environment
/// share one poller regardless of cosmetic differences in headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPayload {
    pub url: String,
    pub method: Method,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub sign: Option<SignSpec>,
    #[serde(default)]
    pub env_suffix: Option<String>,
    #[serde(default)]
    pub primary_only: bool,
}

impl RequestPayload {
    /// A plain unsigned GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
            headers: None,
            sign: None,
            env_suffix: None,
            primary_only: false,
        }
    }

    /// A POST request carrying `body`.
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            body: Some(body.into()),
            headers: None,
            sign: None,
            env_suffix: None,
            primary_only: false,
        }
    }

    pub fn with_sign(mut self, sign: SignSpec) -> Self {
        self.sign = Some(sign);
        self
    }

    pub fn with_env_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.env_suffix = Some(suffix.into());
        self
    }

    /// The subscription key this request polls under.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.url.clone(), self.env_suffix.clone())
    }
}

impl PartialEq for RequestPayload {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.method == other.method
            && self.body == other.body
            && self.env_suffix == other.env_suffix
    }
}

impl Eq for RequestPayload {}

impl Hash for RequestPayload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
        self.method.hash(state);
        self.body.hash(state);
        self.env_suffix.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_method_serde_accepts_both_cases() {
        let method: Method = serde_json::from_str("\"post\"").unwrap();
        assert_eq!(method, Method::Post);
        let method: Method = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(method, Method::Delete);
        assert!(serde_json::from_str::<Method>("\"fetch\"").is_err());
    }

    #[test]
    fn test_sign_spec_accepts_bool_and_name() {
        let enabled: SignSpec = serde_json::from_str("true").unwrap();
        assert!(enabled.is_enabled());
        assert_eq!(enabled.adapter(), None);

        let named: SignSpec = serde_json::from_str("\"upbit\"").unwrap();
        assert!(named.is_enabled());
        assert_eq!(named.adapter(), Some("upbit"));

        let off: SignSpec = serde_json::from_str("false").unwrap();
        assert!(!off.is_enabled());
    }

    #[test]
    fn test_identity_ignores_headers() {
        let mut a = RequestPayload::get("https://api.example.com/depth");
        a.headers = Some([("X-A".to_string(), "1".to_string())].into());
        let b = RequestPayload::get("https://api.example.com/depth");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_identity_distinguishes_env_suffix() {
        let a = RequestPayload::get("https://api.example.com/balance").with_env_suffix("ALT");
        let b = RequestPayload::get("https://api.example.com/balance");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_carries_env() {
        let req = RequestPayload::get("https://api.example.com/x").with_env_suffix("SUB");
        assert_eq!(req.fingerprint().to_string(), "https://api.example.com/x:SUB");
    }

    #[test]
    fn test_payload_deserializes_from_adapter_json() {
        let req: RequestPayload = serde_json::from_str(
            r#"{"url":"https://api.example.com/order","method":"post","body":"{}","sign":"hmac"}"#,
        )
        .unwrap();
        assert_eq!(req.method, Method::Post);
        assert!(req.sign.unwrap().is_enabled());
        assert!(!req.primary_only);
    }
}
