//! Credential environment suffixes.
//!
//! A strategy may poll the same endpoint under several API-key environments
//! (a main account and sub-accounts, say). The `env_suffix` on a request
//! selects which set of credentials applies; environment variables for a
//! suffixed environment are the base name with `_<SUFFIX>` appended.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// An optional, validated credential environment suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CredentialEnv(Option<String>);

impl CredentialEnv {
    /// The default (unsuffixed) environment.
    pub fn primary() -> Self {
        Self(None)
    }

    pub fn suffix(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// The environment-variable name for `base` in this environment:
    /// `base` as-is for the primary environment, `base_SUFFIX` otherwise.
    pub fn var_name(&self, base: &str) -> String {
        match &self.0 {
            Some(suffix) => format!("{base}_{suffix}"),
            None => base.to_string(),
        }
    }
}

impl From<Option<&str>> for CredentialEnv {
    fn from(suffix: Option<&str>) -> Self {
        match suffix {
            Some(s) => s.parse().unwrap_or_else(|_| {
                // Invalid suffixes come from adapter bugs; resolving them to
                // a nonexistent variable later fails with a clear message.
                CredentialEnv(Some(s.to_string()))
            }),
            None => CredentialEnv(None),
        }
    }
}

impl FromStr for CredentialEnv {
    type Err = CredentialEnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(CredentialEnv(None));
        }
        let valid = s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(CredentialEnvError::InvalidSuffix(s.to_string()));
        }
        Ok(CredentialEnv(Some(s.to_ascii_uppercase())))
    }
}

impl fmt::Display for CredentialEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(suffix) => write!(f, "{suffix}"),
            None => write!(f, "primary"),
        }
    }
}

/// Error validating a credential environment suffix.
#[derive(Debug, Clone, Error)]
pub enum CredentialEnvError {
    #[error("invalid credential environment suffix '{0}', expected [A-Za-z0-9_]+")]
    InvalidSuffix(String),
}
