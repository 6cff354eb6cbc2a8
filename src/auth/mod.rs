//! Authentication against the AeroDB auth service, and the headers every other
//! surface derives from it.
//!
//! [`Client`] holds the current [`types::Session`] and implements [`TokenProvider`], so
//! the database, storage, functions and realtime clients pick up a fresh access token
//! on every request without caching it themselves.

pub mod client;
pub mod types;

use std::fmt;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret as _, SecretString};

pub use self::client::Client;
use crate::Result;

/// Header carrying the project API key on every request.
pub const API_KEY_HEADER: &str = "apikey";

/// Source of the bearer token attached to outgoing requests.
///
/// The token is read each time a request is built (or a realtime connection is
/// opened), never cached by the caller.
pub trait TokenProvider: Send + Sync + 'static {
    fn token(&self) -> Option<SecretString>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync + 'static,
{
    fn token(&self) -> Option<SecretString> {
        self().map(SecretString::from)
    }
}

impl TokenProvider for Option<String> {
    fn token(&self) -> Option<SecretString> {
        self.clone().map(SecretString::from)
    }
}

impl TokenProvider for Client {
    fn token(&self) -> Option<SecretString> {
        self.access_token()
    }
}

/// The API key plus token source shared by the HTTP sub-clients.
#[derive(Clone)]
pub(crate) struct RequestAuth {
    api_key: Option<SecretString>,
    tokens: Arc<dyn TokenProvider>,
}

impl RequestAuth {
    pub(crate) fn new(api_key: Option<SecretString>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { api_key, tokens }
    }

    pub(crate) fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    pub(crate) fn token(&self) -> Option<SecretString> {
        self.tokens.token()
    }

    /// `apikey` and `Authorization: Bearer` headers for a single request.
    pub(crate) fn headers(&self) -> Result<HeaderMap> {
        headers(self.api_key(), self.token())
    }
}

pub(crate) fn headers(
    api_key: Option<&SecretString>,
    token: Option<SecretString>,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Some(key) = api_key {
        let mut value = HeaderValue::from_str(key.expose_secret())?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);
    }

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

impl fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAuth")
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn headers_should_carry_api_key_and_bearer_token() {
        let auth = RequestAuth::new(
            Some(SecretString::from("anon-key".to_owned())),
            Arc::new(Some("jwt-123".to_owned())),
        );

        let headers = auth.headers().expect("headers should build");

        assert_eq!(headers[API_KEY_HEADER], "anon-key");
        assert_eq!(headers[AUTHORIZATION], "Bearer jwt-123");
    }

    #[test]
    fn headers_should_be_empty_without_credentials() {
        let auth = RequestAuth::new(None, Arc::new(None::<String>));

        let headers = auth.headers().expect("headers should build");

        assert!(headers.is_empty(), "unexpected headers: {headers:?}");
    }

    #[test]
    fn closure_token_should_be_read_per_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let auth = RequestAuth::new(
            None,
            Arc::new(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Some(format!("token-{n}"))
            }),
        );

        let first = auth.headers().expect("headers should build");
        let second = auth.headers().expect("headers should build");

        assert_eq!(first[AUTHORIZATION], "Bearer token-0");
        assert_eq!(second[AUTHORIZATION], "Bearer token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn debug_does_not_expose_secrets() {
        let auth = RequestAuth::new(
            Some(SecretString::from("super-secret-key".to_owned())),
            Arc::new(Some("super-secret-token".to_owned())),
        );

        let debug = format!("{auth:?}");

        assert!(debug.contains("REDACTED"), "api key should be redacted");
        assert!(!debug.contains("super-secret"), "secret leaked: {debug}");
    }
}
