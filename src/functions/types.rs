use std::collections::HashMap;

use bon::Builder;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

/// Options for [`super::Client::invoke`].
///
/// # Example
///
/// ```
/// use aerodb_client_sdk::functions::types::InvokeOptions;
/// use serde_json::json;
///
/// let options = InvokeOptions::builder()
///     .body(json!({ "to": "ada@example.com" }))
///     .headers([("x-region".to_owned(), "eu-west-1".to_owned())].into())
///     .build();
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct InvokeOptions {
    /// HTTP method. `GET` requests never carry a body.
    #[builder(default = Method::POST)]
    pub method: Method,
    /// JSON body sent with non-`GET` invocations.
    pub body: Option<Value>,
    /// Extra headers, applied after the authentication headers.
    #[builder(default)]
    pub headers: HashMap<String, String>,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Body returned by a function, decoded according to its content type.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionResponse {
    /// The response was `application/json`.
    Json(Value),
    /// Any other content type, read as text.
    Text(String),
}

impl FunctionResponse {
    /// Decodes the response into `T`. Text responses are parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Self::Json(value) => crate::serde_helpers::deserialize_with_warnings(value.clone()),
            Self::Text(text) => Ok(serde_json::from_str(text)?),
        }
    }

    /// The response body as text. JSON bodies are re-serialized.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}
