//! The top-level AeroDB client.
//!
//! [`Client`] validates the project URL, builds one shared HTTP client and hands every
//! sub-client the same API key and token source. The token source is the
//! [`auth::Client`], so signing in is immediately reflected in database, storage,
//! functions and realtime requests.

use std::collections::HashMap;
#[cfg(any(
    feature = "database",
    feature = "storage",
    feature = "functions",
    feature = "realtime"
))]
use std::sync::Arc;

use bon::Builder;
use reqwest::Client as ReqwestClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::auth;
#[cfg(any(feature = "database", feature = "storage", feature = "functions"))]
use crate::auth::RequestAuth;
#[cfg(feature = "database")]
use crate::database;
#[cfg(feature = "database")]
use crate::database::client::DEFAULT_SCHEMA;
use crate::error::Error;
#[cfg(feature = "functions")]
use crate::functions;
#[cfg(feature = "realtime")]
use crate::realtime;
#[cfg(feature = "storage")]
use crate::storage;
#[cfg(feature = "database")]
use crate::types::Row;

#[cfg(not(feature = "database"))]
const DEFAULT_SCHEMA: &str = "public";

const REALTIME_PATH: &str = "realtime/v1/websocket";

/// Configuration for [`Client`]
#[derive(Clone, Debug, Builder)]
#[builder(on(String, into))]
pub struct Config {
    /// Project API key, sent as the `apikey` header and realtime query parameter.
    api_key: Option<String>,
    /// Database schema targeted by [`Client::table`]. Defaults to `public`.
    #[builder(default = DEFAULT_SCHEMA.to_owned())]
    schema: String,
    /// Headers added to every HTTP request.
    #[builder(default)]
    headers: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Client for an AeroDB project.
///
/// # Example
///
/// ```rust,no_run
/// use aerodb_client_sdk::{API_KEY_VAR, Client, Config, URL_VAR};
/// use aerodb_client_sdk::auth::types::SignInRequest;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let url = std::env::var(URL_VAR)?;
///     let config = Config::builder().api_key(std::env::var(API_KEY_VAR)?).build();
///     let client = Client::new(&url, config)?;
///
///     let request = SignInRequest::builder()
///         .email("ada@example.com")
///         .password("correct horse battery staple")
///         .build();
///     client.auth().sign_in(&request).await?;
///
///     let posts = client.table("posts").select("id,title").limit(10).execute().await?;
///     println!("{posts:?}");
///
///     client.close().await;
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    url: Url,
    auth: auth::Client,
    #[cfg(feature = "database")]
    database: database::Client,
    #[cfg(feature = "storage")]
    storage: storage::Client,
    #[cfg(feature = "functions")]
    functions: functions::Client,
    #[cfg(feature = "realtime")]
    realtime: realtime::Client,
}

impl Client {
    /// Creates a client for the project at `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`Kind::Validation`](crate::error::Kind::Validation) error if `url` is
    /// empty, or a custom header is invalid, and an internal error if `url` does not
    /// parse or the HTTP client cannot be created.
    pub fn new(url: &str, config: Config) -> Result<Client> {
        let root = url.trim().trim_end_matches('/');
        if root.is_empty() {
            return Err(Error::validation("url is required"));
        }
        let base = Url::parse(root)?;

        let mut headers = HeaderMap::new();
        headers.insert("User-Agent", HeaderValue::from_static("aerodb_rs_client"));
        headers.insert("Accept", HeaderValue::from_static("*/*"));
        headers.insert("Connection", HeaderValue::from_static("keep-alive"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }
        let client = ReqwestClient::builder().default_headers(headers).build()?;

        let api_key = config.api_key.map(SecretString::from);
        let auth = auth::Client::new(
            Url::parse(&format!("{root}/auth/"))?,
            client.clone(),
            api_key.clone(),
        );
        #[cfg(any(feature = "database", feature = "storage", feature = "functions"))]
        let request_auth = RequestAuth::new(api_key.clone(), Arc::new(auth.clone()));
        #[cfg(not(feature = "database"))]
        let _: &String = &config.schema;

        Ok(Self {
            #[cfg(feature = "database")]
            database: database::Client::new(
                Url::parse(&format!("{root}/rest/v1/"))?,
                client.clone(),
                request_auth.clone(),
                config.schema,
            ),
            #[cfg(feature = "storage")]
            storage: storage::Client::new(
                Url::parse(&format!("{root}/storage/v1/"))?,
                client.clone(),
                request_auth.clone(),
            ),
            #[cfg(feature = "functions")]
            functions: functions::Client::new(
                Url::parse(&format!("{root}/functions/v1/"))?,
                client.clone(),
                request_auth,
            ),
            #[cfg(feature = "realtime")]
            realtime: realtime::Client::new(
                realtime_endpoint(&base)?,
                api_key,
                Arc::new(auth.clone()),
            ),
            url: base,
            auth,
        })
    }

    /// Returns the project URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn auth(&self) -> &auth::Client {
        &self.auth
    }

    #[cfg(feature = "database")]
    #[must_use]
    pub fn database(&self) -> &database::Client {
        &self.database
    }

    /// Starts a query against `table`. Shorthand for `database().table(table)`.
    #[cfg(feature = "database")]
    #[must_use]
    pub fn table<N: Into<String>>(&self, table: N) -> database::QueryBuilder<Row> {
        self.database.table(table)
    }

    #[cfg(feature = "storage")]
    #[must_use]
    pub fn storage(&self) -> &storage::Client {
        &self.storage
    }

    #[cfg(feature = "functions")]
    #[must_use]
    pub fn functions(&self) -> &functions::Client {
        &self.functions
    }

    #[cfg(feature = "realtime")]
    #[must_use]
    pub fn realtime(&self) -> &realtime::Client {
        &self.realtime
    }

    /// Shorthand for `realtime().channel(name)`.
    #[cfg(feature = "realtime")]
    #[must_use]
    pub fn channel<N: Into<String>>(&self, name: N) -> Arc<realtime::Channel> {
        self.realtime.channel(name)
    }

    /// Releases long-lived resources: the realtime connection and its channels.
    #[cfg_attr(
        not(feature = "realtime"),
        expect(clippy::unused_async, reason = "signature is stable across features")
    )]
    pub async fn close(&self) {
        #[cfg(feature = "realtime")]
        self.realtime.disconnect().await;
    }
}

/// `https` maps to `wss`, anything else to `ws`. Only the host and port of `base` are kept.
#[cfg(feature = "realtime")]
fn realtime_endpoint(base: &Url) -> Result<Url> {
    let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
    let host = base
        .host_str()
        .ok_or_else(|| Error::validation(format!("url has no host: {base}")))?;
    let authority = match base.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };

    Ok(Url::parse(&format!("{scheme}://{authority}/{REALTIME_PATH}"))?)
}
