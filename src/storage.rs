use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    /// Public URL the stored object is reachable at.
    fn public_url(&self, key: &str) -> String;
}

/// Files on local disk, served back under `/uploads/`.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>, base_url: &str) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        anyhow::ensure!(
            !key.contains('/') && !key.contains("..") && !key.is_empty(),
            "invalid object key {:?}",
            key
        );
        let path = self.root.join(key);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {} ({})", path.display(), content_type))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/uploads/{}", self.base_url, key)
    }
}
