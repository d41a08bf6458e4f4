//! Object-storage collaborators used to persist uploaded avatars.
//!
//! The form only ever calls `upload(bucket, key, bytes)`; each backend decides
//! how a bucket maps onto its own namespace.

pub mod filesystem;
pub mod http;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use filesystem::FilesystemBucketStore;
pub use http::HttpBucketStore;

/// A single object to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Receipt for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredObject {
    pub fn for_request(request: &UploadRequest) -> Self {
        Self {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            size: request.bytes.len() as u64,
            uploaded_at: Utc::now(),
        }
    }
}

/// Upload boundary. Implementations are called once per submission and never retried.
pub trait ObjectStore: Send + Sync {
    fn upload(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = Result<StoredObject, StorageError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object key '{0}' is not a plain file name")]
    InvalidKey(String),
    #[error("bucket name '{0}' is not usable")]
    InvalidBucket(String),
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage endpoint unreachable: {0}")]
    Transport(String),
    #[error("storage rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Keys come straight from a user's file name and are used verbatim, so
/// anything that could escape the bucket is refused.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    let escapes = key.contains('/')
        || key.contains('\\')
        || key == "."
        || key == ".."
        || key.contains('\0');
    if key.trim().is_empty() || escapes {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub(crate) fn check_bucket(bucket: &str) -> Result<(), StorageError> {
    let valid = !bucket.is_empty()
        && bucket
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && bucket != "."
        && bucket != "..";
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidBucket(bucket.to_string()))
    }
}
