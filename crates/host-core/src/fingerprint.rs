//! Subscription keys.

use std::fmt;

/// Identifies one polled endpoint within a strategy.
///
/// The optional credential environment disambiguates otherwise identical
/// URLs polled under different API keys. A composite type rather than a
/// joined string so the boundary between the two parts cannot be forged by
/// a URL that happens to contain a colon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    url: String,
    env: Option<String>,
}

impl Fingerprint {
    pub fn new(url: String, env: Option<String>) -> Self {
        Self { url, env }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn env(&self) -> Option<&str> {
        self.env.as_deref()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.env {
            Some(env) => write!(f, "{}:{}", self.url, env),
            None => write!(f, "{}", self.url),
        }
    }
}
