use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::domain::Submission;
use crate::storage::{ObjectStore, StorageError, StoredObject, UploadRequest};

/// Result of a successful submit: the payload, the optional upload receipt and
/// the formatted text shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub submission: Submission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<StoredObject>,
    pub output: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("avatar upload failed: {0}")]
    Upload(#[from] StorageError),
    #[error("could not render submission: {0}")]
    Render(#[from] serde_json::Error),
}

/// Reacts to a validated submission: uploads the avatar (if any) under its own
/// file name, then renders the payload. Uploads are attempted exactly once.
pub struct SubmissionHandler<S> {
    store: Arc<S>,
    bucket: String,
}

impl<S> SubmissionHandler<S>
where
    S: ObjectStore + 'static,
{
    pub fn new(store: Arc<S>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn handle(
        &self,
        submission: Submission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let upload = match &submission.avatar {
            Some(avatar) => {
                let request = UploadRequest {
                    bucket: self.bucket.clone(),
                    key: avatar.name.clone(),
                    content_type: avatar.content_type.clone(),
                    bytes: avatar.bytes.clone(),
                };
                let stored = self.store.upload(request).await?;
                info!(bucket = %stored.bucket, key = %stored.key, size = stored.size, "avatar uploaded");
                Some(stored)
            }
            None => None,
        };

        let output = render_output(&submission)?;

        Ok(SubmissionReceipt {
            submission,
            upload,
            output,
            submitted_at: Utc::now(),
        })
    }
}

/// Pretty-printed JSON of the validated payload.
pub fn render_output(submission: &Submission) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(submission)
}
