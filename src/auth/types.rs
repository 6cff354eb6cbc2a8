use bon::Builder;
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use serde_with::skip_serializing_none;

/// Request body for [`super::Client::sign_up`].
///
/// # Example
///
/// ```
/// use aerodb_client_sdk::auth::types::SignUpRequest;
/// use serde_json::json;
///
/// let request = SignUpRequest::builder()
///     .email("ada@example.com")
///     .password("correct horse battery staple")
///     .metadata(json!({ "display_name": "Ada" }))
///     .build();
/// ```
#[non_exhaustive]
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Builder)]
#[builder(on(String, into))]
pub struct SignUpRequest {
    pub email: String,
    #[builder(with = |password: impl Into<String>| SecretString::from(password.into()))]
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    /// Arbitrary profile data stored alongside the user.
    pub metadata: Option<Value>,
}

/// Request body for [`super::Client::sign_in`].
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Builder)]
#[builder(on(String, into))]
pub struct SignInRequest {
    pub email: String,
    #[builder(with = |password: impl Into<String>| SecretString::from(password.into()))]
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

/// Body of the logout and refresh calls.
#[derive(Debug, Serialize)]
pub(crate) struct RefreshTokenBody {
    #[serde(serialize_with = "expose")]
    pub refresh_token: SecretString,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// An AeroDB user account.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Builder)]
#[builder(on(String, into))]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    #[builder(default)]
    pub email_verified: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub metadata: Option<Value>,
}

/// Access and refresh tokens issued by the auth service.
///
/// Token values are [`SecretString`]s, so they never show up in `Debug` output.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    /// Lifetime of the access token in seconds, as reported by the server.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry. Taken from the response, or computed from `expires_in` when the
    /// session is received.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl Session {
    pub(crate) fn with_computed_expiry(mut self) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self
                .expires_in
                .and_then(TimeDelta::try_seconds)
                .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        }
        self
    }

    /// Whether the access token has passed its expiry. Sessions without a known expiry
    /// never report as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Result of a successful sign-up or sign-in.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct AuthData {
    pub user: User,
    pub session: Session,
}

/// Wire shape of the signup and login responses: the user next to flat session fields.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub user: User,
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl From<AuthResponse> for AuthData {
    fn from(response: AuthResponse) -> Self {
        let session = Session {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            expires_at: response.expires_at,
            token_type: response.token_type,
        }
        .with_computed_expiry();

        Self {
            user: response.user,
            session,
        }
    }
}
