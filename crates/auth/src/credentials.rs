//! Secure API credential management.
//!
//! The secret key is wrapped in `SecretString` so it cannot be printed by
//! accident and is zeroed on drop.

use common::CredentialEnv;
use secrecy::{ExposeSecret, SecretString};

use crate::error::AuthError;

/// API key pair for one credential environment.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    secret_key: SecretString,
}

impl ApiCredentials {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key: secret_key.into(),
        }
    }

    /// Load credentials for `env` from the environment.
    ///
    /// Looks for `MANTIS_API_KEY` / `MANTIS_API_SECRET`, with the
    /// environment's suffix appended for non-primary environments
    /// (`MANTIS_API_KEY_ALT`, ...).
    pub fn from_env(env: &CredentialEnv) -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let key_var = env.var_name("MANTIS_API_KEY");
        let secret_var = env.var_name("MANTIS_API_SECRET");

        let api_key = std::env::var(&key_var).map_err(|_| AuthError::MissingEnvVar(key_var))?;
        let secret_key =
            std::env::var(&secret_var).map_err(|_| AuthError::MissingEnvVar(secret_var))?;

        Ok(Self::new(api_key, secret_key))
    }

    /// The public API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The secret key. Callers must not log the returned value.
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let creds = ApiCredentials::new("public".into(), "very-secret".into());
        let debug = format!("{creds:?}");
        assert!(debug.contains("public"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_missing_env_var_reports_name() {
        let env: CredentialEnv = "DOES_NOT_EXIST_XYZ".parse().unwrap();
        let err = ApiCredentials::from_env(&env).unwrap_err();
        assert!(matches!(err, AuthError::MissingEnvVar(name)
            if name == "MANTIS_API_KEY_DOES_NOT_EXIST_XYZ"));
    }
}
