use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
use url::Url;

use super::types::{FileObject, ListOptions, RemoveRequest, UploadOptions, UploadResponse};
use crate::auth::RequestAuth;
use crate::types::Row;
use crate::{Result, ToQueryParams as _};

const UPSERT_HEADER: &str = "x-upsert";

/// Client for AeroDB object storage (`{url}/storage/v1/`).
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

    /// Operations scoped to the bucket `name`.
    #[must_use]
    pub fn bucket<N: Into<String>>(&self, name: N) -> Bucket {
        Bucket {
            client: self.clone(),
            name: name.into(),
        }
    }
}

/// Object operations within a single bucket.
///
/// # Example
///
/// ```no_run
/// use aerodb_client_sdk::{Client, Config};
/// use aerodb_client_sdk::storage::types::UploadOptions;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("https://project.aerodb.dev", Config::default())?;
/// let avatars = client.storage().bucket("avatars");
///
/// let options = UploadOptions::builder().content_type("image/png").build();
/// let file = avatars.upload("ada.png", vec![0x89, 0x50], &options).await?;
/// println!("stored {} ({} bytes)", file.path, file.size);
///
/// let bytes = avatars.download("ada.png").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Bucket {
    client: Client,
    name: String,
}

impl Bucket {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}object/{}/{path}", self.client.host, self.name)
    }

    /// Uploads `data` to `path`.
    pub async fn upload(
        &self,
        path: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<FileObject> {
        let size = data.len();
        let mut headers = self.client.auth.headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(&options.content_type)?);
        if options.upsert {
            headers.insert(UPSERT_HEADER, HeaderValue::from_static("true"));
        }

        let request = self
            .client
            .client
            .request(Method::POST, self.object_url(path))
            .headers(headers)
            .body(data)
            .build()?;

        let response: UploadResponse = crate::request(&self.client.client, request).await?;

        Ok(FileObject {
            id: response.id,
            name: response.name.unwrap_or_else(|| path.to_owned()),
            bucket: self.name.clone(),
            path: path.to_owned(),
            size,
            content_type: options.content_type.clone(),
            created_at: response.created_at,
            updated_at: response.updated_at,
            metadata: response.metadata,
        })
    }

    /// Downloads the object at `path`.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let request = self
            .client
            .client
            .request(Method::GET, self.object_url(path))
            .headers(self.client.auth.headers()?)
            .build()?;

        crate::request_bytes(&self.client.client, request).await
    }

    /// Deletes every object in `paths`.
    pub async fn remove(&self, paths: &[String]) -> Result<()> {
        let request = self
            .client
            .client
            .request(
                Method::DELETE,
                format!("{}object/{}", self.client.host, self.name),
            )
            .headers(self.client.auth.headers()?)
            .json(&RemoveRequest { prefixes: paths })
            .build()?;

        crate::request_empty(&self.client.client, request).await
    }

    /// Lists objects in the bucket.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Row>> {
        let request = self
            .client
            .client
            .request(
                Method::GET,
                format!(
                    "{}object/list/{}{}",
                    self.client.host,
                    self.name,
                    options.query_params(None)
                ),
            )
            .headers(self.client.auth.headers()?)
            .build()?;

        crate::request(&self.client.client, request).await
    }

    /// Public URL of `path`. Only resolvable when the bucket is public.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!("{}object/public/{}/{path}", self.client.host, self.name)
    }
}
