//! Building and classifying reqwest requests.

use std::time::{SystemTime, UNIX_EPOCH};

use auth::{sign_request, ApiCredentials, AuthError};
use common::CredentialEnv;
use host_core::{Method, RequestPayload, TransportFailure};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use reqwest::Url;
use thiserror::Error;

/// Errors preparing a request for dispatch.
#[derive(Debug, Error)]
pub enum HostHttpError {
    #[error("cannot parse URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Signs the payload if it asks for signing, then builds the reqwest
/// request.
pub(crate) fn prepare(payload: RequestPayload) -> Result<reqwest::Request, HostHttpError> {
    let payload = if payload.sign.as_ref().is_some_and(|sign| sign.is_enabled()) {
        let env = CredentialEnv::from(payload.env_suffix.as_deref());
        let credentials = ApiCredentials::from_env(&env)?;
        sign_request(payload, &credentials, unix_millis())?
    } else {
        payload
    };
    build(payload)
}

fn build(payload: RequestPayload) -> Result<reqwest::Request, HostHttpError> {
    let url = Url::parse(&payload.url).map_err(|err| HostHttpError::InvalidUrl {
        url: payload.url.clone(),
        message: err.to_string(),
    })?;
    let mut request = reqwest::Request::new(to_reqwest_method(payload.method), url);

    if let Some(body) = payload.body {
        *request.body_mut() = Some(reqwest::Body::from(body));
    } else if payload.method != Method::Get {
        // Some venues reject body-less non-GET requests without an explicit
        // zero length.
        request
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    }

    if let Some(headers) = payload.headers {
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HostHttpError::InvalidHeader(name.clone()))?;
            let header_value = value
                .parse::<HeaderValue>()
                .map_err(|_| HostHttpError::InvalidHeader(name.clone()))?;
            request.headers_mut().insert(header_name, header_value);
        }
    }
    Ok(request)
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
    }
}

/// Maps a reqwest error to the typed transport failure reported on the
/// response payload.
pub(crate) fn classify(err: &reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout
    } else if err.is_connect() {
        TransportFailure::Network
    } else {
        TransportFailure::Other
    }
}

pub(crate) fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_get_request() {
        let request = prepare(RequestPayload::get("https://x.test/depth?symbol=BTCUSDT")).unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().as_str(), "https://x.test/depth?symbol=BTCUSDT");
        assert!(request.body().is_none());
        assert!(request.headers().get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_bodyless_post_gets_zero_content_length() {
        let mut payload = RequestPayload::get("https://x.test/keepalive");
        payload.method = Method::Post;
        let request = prepare(payload).unwrap();
        assert_eq!(
            request.headers().get(CONTENT_LENGTH),
            Some(&HeaderValue::from_static("0"))
        );
    }

    #[test]
    fn test_headers_are_carried() {
        let mut payload = RequestPayload::post("https://x.test/order", "{}");
        payload.headers = Some([("X-Custom".to_string(), "1".to_string())].into());
        let request = prepare(payload).unwrap();
        assert_eq!(request.headers().get("X-Custom").unwrap(), "1");
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let err = prepare(RequestPayload::get("not a url")).unwrap_err();
        assert!(matches!(err, HostHttpError::InvalidUrl { .. }));
    }
}
