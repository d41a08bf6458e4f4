use std::path::{Path, PathBuf};

use tracing::debug;

use super::{check_bucket, check_key, ObjectStore, StorageError, StoredObject, UploadRequest};

/// Buckets are directories below `root`; existing objects are overwritten.
#[derive(Debug, Clone)]
pub struct FilesystemBucketStore {
    root: PathBuf,
}

impl FilesystemBucketStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        check_bucket(bucket)?;
        check_key(key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for FilesystemBucketStore {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StorageError> {
        let path = self.object_path(&request.bucket, &request.key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &request.bytes).await?;
        debug!(path = %path.display(), size = request.bytes.len(), "avatar written to bucket");
        Ok(StoredObject::for_request(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn scratch_root(label: &str) -> PathBuf {
        static SEQ: AtomicU32 = AtomicU32::new(0);
        let n = SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "signup-forms-fs-{label}-{}-{n}",
            std::process::id()
        ))
    }

    fn request(key: &str, bytes: &[u8]) -> UploadRequest {
        UploadRequest {
            bucket: "forms-react".to_string(),
            key: key.to_string(),
            content_type: "image/png".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn writes_object_under_bucket_directory() {
        let root = scratch_root("write");
        let store = FilesystemBucketStore::new(&root);

        let stored = store
            .upload(request("avatar.png", b"png-bytes"))
            .await
            .expect("upload succeeds");

        assert_eq!(stored.bucket, "forms-react");
        assert_eq!(stored.key, "avatar.png");
        assert_eq!(stored.size, 9);
        let on_disk = std::fs::read(root.join("forms-react").join("avatar.png"))
            .expect("object written");
        assert_eq!(on_disk, b"png-bytes");

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn same_key_overwrites() {
        let root = scratch_root("overwrite");
        let store = FilesystemBucketStore::new(&root);

        store
            .upload(request("me.jpg", b"first"))
            .await
            .expect("first upload");
        store
            .upload(request("me.jpg", b"second"))
            .await
            .expect("second upload");

        let on_disk = std::fs::read(root.join("forms-react").join("me.jpg")).expect("read back");
        assert_eq!(on_disk, b"second");

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn refuses_traversal_keys() {
        let root = scratch_root("traversal");
        let store = FilesystemBucketStore::new(&root);

        match store.upload(request("../escape.png", b"x")).await {
            Err(StorageError::InvalidKey(key)) => assert_eq!(key, "../escape.png"),
            other => panic!("expected invalid key, got {other:?}"),
        }
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn receipt_names_the_key_actually_written() {
        let root = scratch_root("verbatim");
        let store = FilesystemBucketStore::new(&root);

        let stored = store
            .upload(request(" padded.png ", b"x"))
            .await
            .expect("upload succeeds");

        assert_eq!(stored.key, " padded.png ");
        assert!(root.join("forms-react").join(" padded.png ").exists());
        assert!(!root.join("forms-react").join("padded.png").exists());

        let _ = std::fs::remove_dir_all(root);
    }
}
