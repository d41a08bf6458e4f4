use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::{check_bucket, check_key, ObjectStore, StorageError, StoredObject, UploadRequest};

/// Client for a storage REST endpoint exposing
/// `POST /storage/v1/object/{bucket}/{key}`.
#[derive(Debug, Clone)]
pub struct HttpBucketStore {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HttpBucketStore {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, StorageError> {
        let client = Client::builder()
            .build()
            .map_err(|err| StorageError::Transport(err.to_string()))?;
        Self::with_client(client, base_url, api_key)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| StorageError::Transport(format!("invalid base url '{base_url}': {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Transport(format!(
                "base url '{base_url}' cannot carry object paths"
            )));
        }

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Path segments are percent-encoded, so file names with spaces survive.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, StorageError> {
        check_bucket(bucket)?;
        check_key(key)?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::Transport("base url cannot carry paths".to_string()))?
            .pop_if_empty()
            .extend(["storage", "v1", "object", bucket, key]);
        Ok(url)
    }
}

impl ObjectStore for HttpBucketStore {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StorageError> {
        let url = self.object_url(&request.bucket, &request.key)?;
        debug!(%url, size = request.bytes.len(), "uploading avatar");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header(CONTENT_TYPE, &request.content_type)
            .body(request.bytes.clone())
            .send()
            .await
            .map_err(|err| StorageError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "storage endpoint rejected upload");
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(StoredObject::for_request(&request))
    }
}
