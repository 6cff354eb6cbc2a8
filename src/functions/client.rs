use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Response};
use url::Url;

use super::types::{FunctionResponse, InvokeOptions};
use crate::Result;
use crate::auth::RequestAuth;

/// Client for AeroDB edge functions (`{url}/functions/v1/`).
///
/// # Example
///
/// ```no_run
/// use aerodb_client_sdk::{Client, Config};
/// use aerodb_client_sdk::functions::types::InvokeOptions;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("https://project.aerodb.dev", Config::default())?;
///
/// let options = InvokeOptions::builder().body(json!({ "name": "Ada" })).build();
/// let response = client.functions().invoke("hello", &options).await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    host: Url,
    client: ReqwestClient,
    auth: RequestAuth,
}

impl Client {
    pub(crate) fn new(host: Url, client: ReqwestClient, auth: RequestAuth) -> Self {
        Self { host, client, auth }
    }

    /// Returns the host URL for the client.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// Invokes the function `name`.
    pub async fn invoke(&self, name: &str, options: &InvokeOptions) -> Result<FunctionResponse> {
        let mut headers = self.auth.headers()?;
        for (key, value) in &options.headers {
            headers.insert(
                HeaderName::from_bytes(key.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        let mut request = self
            .client
            .request(options.method.clone(), format!("{}{name}", self.host))
            .headers(headers);
        if options.method != Method::GET
            && let Some(body) = &options.body
        {
            request = request.json(body);
        }

        let response = crate::send(&self.client, request.build()?).await?;
        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<FunctionResponse> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));

    if is_json {
        Ok(FunctionResponse::Json(response.json().await?))
    } else {
        Ok(FunctionResponse::Text(response.text().await?))
    }
}
