//! HMAC-SHA256 request signing.

use hmac::{Hmac, Mac};
use host_core::RequestPayload;
use sha2::Sha256;

use crate::{ApiCredentials, AuthError};

type HmacSha256 = Hmac<Sha256>;

/// Signs outgoing requests with one credential pair.
pub struct RequestSigner<'a> {
    credentials: &'a ApiCredentials,
}

impl<'a> RequestSigner<'a> {
    pub fn new(credentials: &'a ApiCredentials) -> Self {
        Self { credentials }
    }

    /// HMAC-SHA256 of `message` under the secret key, lowercase hex.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.credentials.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// The canonical string covered by the signature:
    /// `timestamp + method + url + body`.
    fn canonical_message(request: &RequestPayload, timestamp_ms: i64) -> String {
        format!(
            "{}{}{}{}",
            timestamp_ms,
            request.method,
            request.url,
            request.body.as_deref().unwrap_or("")
        )
    }
}

/// Signs `request` in place for dispatch at `timestamp_ms`.
///
/// Attaches the API key, timestamp, and signature headers and clears the
/// `sign` marker so the transport will not re-sign. Requests naming a
/// signing scheme other than `hmac` are rejected.
pub fn sign_request(
    mut request: RequestPayload,
    credentials: &ApiCredentials,
    timestamp_ms: i64,
) -> Result<RequestPayload, AuthError> {
    if let Some(scheme) = request.sign.as_ref().and_then(|s| s.adapter()) {
        if scheme != "hmac" {
            return Err(AuthError::UnknownScheme(scheme.to_string()));
        }
    }

    let signer = RequestSigner::new(credentials);
    let message = RequestSigner::canonical_message(&request, timestamp_ms);
    let signature = signer.sign(&message);

    let headers = request.headers.get_or_insert_with(Default::default);
    headers.insert("X-MANTIS-APIKEY".to_string(), credentials.api_key().to_string());
    headers.insert("X-MANTIS-TIMESTAMP".to_string(), timestamp_ms.to_string());
    headers.insert("X-MANTIS-SIGNATURE".to_string(), signature);
    request.sign = None;

    Ok(request)
}
