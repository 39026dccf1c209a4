//! Filesystem asset store, served by the storefront at `/uploads`.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use super::{AssetStore, StoreError};

/// Writes uploaded images into a local directory.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    dir: PathBuf,
    public_base: String,
}

impl LocalAssetStore {
    /// `public_base` is the absolute URL the directory is served under,
    /// e.g. `https://threadandhanger.pk/uploads`.
    #[must_use]
    pub fn new(dir: PathBuf, public_base: impl Into<String>) -> Self {
        Self {
            dir,
            public_base: public_base.into().trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    /// Refuses to overwrite an existing object.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        name: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(StoreError::Conflict(format!("invalid object name: {name}")));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.dir.join(name))
            .await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        Ok(self.public_url(name))
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.public_base, urlencoding::encode(name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("thread-hanger-{label}-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = temp_dir("assets");
        let store = LocalAssetStore::new(dir.clone(), "http://localhost:3000/uploads/");

        let url = store
            .upload("1_kurta.jpg", "image/jpeg", b"jpeg-bytes".to_vec())
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:3000/uploads/1_kurta.jpg");
        assert_eq!(std::fs::read(dir.join("1_kurta.jpg")).unwrap(), b"jpeg-bytes");
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_upload_does_not_overwrite() {
        let dir = temp_dir("assets-dup");
        let store = LocalAssetStore::new(dir.clone(), "/uploads");

        store.upload("a.png", "image/png", vec![1]).await.unwrap();
        let second = store.upload("a.png", "image/png", vec![2]).await;

        assert!(matches!(second, Err(StoreError::Io(_))));
        assert_eq!(std::fs::read(dir.join("a.png")).unwrap(), vec![1]);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_upload_rejects_path_names() {
        let store = LocalAssetStore::new(temp_dir("assets-path"), "/uploads");
        let result = store.upload("../escape.png", "image/png", vec![1]).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }
}
