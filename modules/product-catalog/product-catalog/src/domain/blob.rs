use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    PublicRead,
}

/// Object storage for product images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path` and return the object's public URL.
    async fn put(
        &self,
        path: &str,
        bytes: Bytes,
        media_type: &str,
        visibility: Visibility,
    ) -> anyhow::Result<String>;

    async fn delete(&self, path: &str) -> anyhow::Result<()>;

    /// Signed URL allowing a single direct `PUT` of `media_type` to `path`.
    async fn presign_put(&self, path: &str, media_type: &str, ttl: Duration)
    -> anyhow::Result<String>;
}
