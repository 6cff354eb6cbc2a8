#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod auth;
pub mod client;
#[cfg(feature = "database")]
pub mod database;
pub mod error;
#[cfg(feature = "functions")]
pub mod functions;
#[cfg(feature = "realtime")]
pub mod realtime;
pub(crate) mod serde_helpers;
#[cfg(feature = "storage")]
pub mod storage;
pub mod types;
#[cfg(feature = "realtime")]
pub mod ws;

use std::fmt::Write as _;

use reqwest::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use crate::client::{Client, Config};
use crate::error::{Error, Status};

pub type Result<T> = std::result::Result<T, Error>;

/// Environment variable conventionally holding the project URL.
pub const URL_VAR: &str = "AERODB_URL";

/// Environment variable conventionally holding the project API key.
pub const API_KEY_VAR: &str = "AERODB_API_KEY";

/// Trait for converting request types to URL query parameters.
///
/// This trait is automatically implemented for all types that implement [`Serialize`].
/// It uses [`serde_html_form`] to serialize the struct fields into a query string.
/// Arrays are serialized as repeated keys (`key=val1&key=val2`).
pub trait ToQueryParams: Serialize {
    /// Converts the request to a URL query string.
    ///
    /// Returns an empty string if no parameters are set, otherwise returns
    /// a string starting with `?` followed by URL-encoded key-value pairs.
    /// Extra, already-encoded `key=value` pairs may be appended via `extra`.
    fn query_params(&self, extra: Option<&str>) -> String {
        let mut params = serde_html_form::to_string(self)
            .inspect_err(|e| {
                #[cfg(feature = "tracing")]
                tracing::error!("Unable to convert to URL-encoded string {e:?}");
                #[cfg(not(feature = "tracing"))]
                let _: &serde_html_form::ser::Error = e;
            })
            .unwrap_or_default();

        if let Some(extra) = extra {
            if !params.is_empty() {
                params.push('&');
            }
            let _ = write!(params, "{extra}");
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{params}")
        }
    }
}

impl<T: Serialize> ToQueryParams for T {}

/// Shape of the JSON error bodies returned by the AeroDB REST endpoints.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    code: Option<String>,
}

/// Executes `request` and turns any non-successful status into an [`Error`] of kind
/// [`error::Kind::Status`].
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        level = "debug",
        skip(client, request),
        fields(
            method = %request.method(),
            path = request.url().path(),
            status_code
        )
    )
)]
pub(crate) async fn send(client: &reqwest::Client, request: Request) -> Result<Response> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let response = client.execute(request).await?;
    let status_code = response.status();

    #[cfg(feature = "tracing")]
    tracing::Span::current().record("status_code", status_code.as_u16());

    if status_code.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_default();
    let message = body
        .error
        .or(body.message)
        .or_else(|| (!text.is_empty()).then(|| text.clone()))
        .unwrap_or_else(|| {
            status_code
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        });

    #[cfg(feature = "tracing")]
    tracing::warn!(
        status = %status_code,
        method = %method,
        path = %path,
        message = %message,
        "API request failed"
    );

    Err(Status {
        status_code,
        method,
        path,
        message,
        code: body.code,
    }
    .into())
}

/// Executes `request` and deserializes the JSON body into `Response`.
pub(crate) async fn request<Response: DeserializeOwned>(
    client: &reqwest::Client,
    request: Request,
) -> Result<Response> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let response = send(client, request).await?;
    let json_value = response.json::<serde_json::Value>().await?;
    let response_data: Option<Response> = serde_helpers::deserialize_with_warnings(json_value)?;

    if let Some(response) = response_data {
        Ok(response)
    } else {
        #[cfg(feature = "tracing")]
        tracing::warn!(method = %method, path = %path, "API resource not found");
        Err(Error::status(
            StatusCode::NOT_FOUND,
            method,
            path,
            "Unable to find requested resource",
        ))
    }
}

/// Executes `request` and returns the raw response body.
#[cfg(feature = "storage")]
pub(crate) async fn request_bytes(client: &reqwest::Client, request: Request) -> Result<Vec<u8>> {
    let response = send(client, request).await?;
    Ok(response.bytes().await?.to_vec())
}

/// Executes `request`, discarding any response body.
#[cfg(feature = "storage")]
pub(crate) async fn request_empty(client: &reqwest::Client, request: Request) -> Result<()> {
    send(client, request).await.map(drop)
}

#[cfg(test)]
mod tests {
    use serde_with::skip_serializing_none;

    use super::*;

    #[skip_serializing_none]
    #[derive(Serialize)]
    struct Page {
        prefix: Option<String>,
        limit: Option<u32>,
    }

    #[test]
    fn query_params_empty_should_be_empty_string() {
        let page = Page {
            prefix: None,
            limit: None,
        };

        assert_eq!(page.query_params(None), "");
    }

    #[test]
    fn query_params_should_encode_and_append_extra() {
        let page = Page {
            prefix: Some("avatars/2024 q1".to_owned()),
            limit: Some(10),
        };

        assert_eq!(
            page.query_params(Some("offset=5")),
            "?prefix=avatars%2F2024+q1&limit=10&offset=5"
        );
    }

    #[test]
    fn query_params_extra_only() {
        let page = Page {
            prefix: None,
            limit: None,
        };

        assert_eq!(page.query_params(Some("offset=5")), "?offset=5");
    }
}
