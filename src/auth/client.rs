use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use secrecy::SecretString;
use url::Url;

use super::types::{
    AuthData, AuthResponse, RefreshTokenBody, Session, SignInRequest, SignUpRequest, User,
};
use crate::Result;
use crate::error::{Error, Kind};

/// Client for the AeroDB auth service (`{url}/auth`).
///
/// Successful sign-up, sign-in and refresh calls store the returned [`Session`]. Every
/// other surface of [`crate::Client`] reads the access token from here per request.
///
/// # Example
///
/// ```no_run
/// use aerodb_client_sdk::{Client, Config};
/// use aerodb_client_sdk::auth::types::SignInRequest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("https://project.aerodb.dev", Config::default())?;
///
/// let request = SignInRequest::builder()
///     .email("ada@example.com")
///     .password("hunter2")
///     .build();
/// let data = client.auth().sign_in(&request).await?;
/// println!("signed in as {}", data.user.email);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    host: Url,
    client: ReqwestClient,
    api_key: Option<SecretString>,
    session: RwLock<Option<Session>>,
}

impl Client {
    pub(crate) fn new(host: Url, client: ReqwestClient, api_key: Option<SecretString>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                host,
                client,
                api_key,
                session: RwLock::new(None),
            }),
        }
    }

    /// Returns the host URL for the client.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.inner.host
    }

    /// Registers a new account and stores the issued session.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthData> {
        let request = self
            .inner
            .client
            .request(Method::POST, format!("{}signup", self.host()))
            .headers(self.headers()?)
            .json(request)
            .build()?;

        let response: AuthResponse = crate::request(&self.inner.client, request).await?;
        Ok(self.store(response.into()))
    }

    /// Signs in with email and password and stores the issued session.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<AuthData> {
        let request = self
            .inner
            .client
            .request(Method::POST, format!("{}login", self.host()))
            .headers(self.headers()?)
            .json(request)
            .build()?;

        let response: AuthResponse = crate::request(&self.inner.client, request).await?;
        Ok(self.store(response.into()))
    }

    /// Revokes the refresh token server-side (best effort) and forgets the session.
    ///
    /// The logout response status is not inspected. Transport failures are returned and
    /// leave the session in place.
    pub async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.session() {
            let request = self
                .inner
                .client
                .request(Method::POST, format!("{}logout", self.host()))
                .headers(self.headers()?)
                .json(&RefreshTokenBody {
                    refresh_token: session.refresh_token,
                })
                .build()?;

            let response = self.inner.client.execute(request).await?;

            #[cfg(feature = "tracing")]
            tracing::debug!(status = %response.status(), "signed out");
            #[cfg(not(feature = "tracing"))]
            let _ = &response;
        }

        self.clear();
        Ok(())
    }

    /// Fetches the signed-in user.
    pub async fn user(&self) -> Result<User> {
        if self.session().is_none() {
            return Err(Error::authentication("not authenticated"));
        }

        let request = self
            .inner
            .client
            .request(Method::GET, format!("{}user", self.host()))
            .headers(self.headers()?)
            .build()?;

        crate::request(&self.inner.client, request).await
    }

    /// Exchanges the stored refresh token for a new session.
    ///
    /// A non-successful response clears the stored session, so the client reads as
    /// signed out afterwards.
    pub async fn refresh_session(&self) -> Result<Session> {
        let Some(session) = self.session() else {
            return Err(Error::authentication("no refresh token"));
        };

        let request = self
            .inner
            .client
            .request(Method::POST, format!("{}refresh", self.host()))
            .headers(self.headers()?)
            .json(&RefreshTokenBody {
                refresh_token: session.refresh_token,
            })
            .build()?;

        match crate::request::<Session>(&self.inner.client, request).await {
            Ok(session) => {
                let session = session.with_computed_expiry();
                *self
                    .inner
                    .session
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                if e.kind() == Kind::Status {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %e, "session refresh rejected, clearing session");
                    self.clear();
                }
                Err(e)
            }
        }
    }

    /// Returns the stored session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the current access token, if signed in.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.session().map(|session| session.access_token)
    }

    fn headers(&self) -> Result<HeaderMap> {
        super::headers(self.inner.api_key.as_ref(), self.access_token())
    }

    fn store(&self, data: AuthData) -> AuthData {
        *self
            .inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(data.session.clone());
        data
    }

    fn clear(&self) {
        *self
            .inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}
