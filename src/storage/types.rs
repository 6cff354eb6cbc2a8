use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

pub(crate) const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Options for [`super::Bucket::upload`].
///
/// # Example
///
/// ```
/// use aerodb_client_sdk::storage::types::UploadOptions;
///
/// let options = UploadOptions::builder()
///     .content_type("image/png")
///     .upsert(true)
///     .build();
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct UploadOptions {
    #[builder(default = DEFAULT_CONTENT_TYPE.to_owned())]
    pub content_type: String,
    /// Overwrite an existing object at the same path instead of failing.
    #[builder(default)]
    pub upsert: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Query for [`super::Bucket::list`].
#[non_exhaustive]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Builder)]
#[builder(on(String, into))]
pub struct ListOptions {
    /// Only list objects whose path starts with this prefix.
    pub prefix: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// A stored object, as returned by [`super::Bucket::upload`].
///
/// Combines what the server reported with what the client already knew about the
/// upload (bucket, path, size and content type).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Builder)]
#[builder(on(String, into))]
pub struct FileObject {
    pub id: String,
    pub name: String,
    pub bucket: String,
    pub path: String,
    pub size: usize,
    pub content_type: String,
    pub created_at: String,
    pub updated_at: String,
    pub metadata: Option<Value>,
}

/// Server response to an upload. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Body of the bulk delete call.
#[derive(Debug, Serialize)]
pub(crate) struct RemoveRequest<'paths> {
    pub prefixes: &'paths [String],
}
