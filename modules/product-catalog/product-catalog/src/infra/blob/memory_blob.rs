//! In-process blob store for tests and the development server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::config::CatalogConfig;
use crate::domain::blob::{BlobStore, Visibility};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Bytes,
    pub media_type: String,
    pub visibility: Visibility,
}

/// Blob store backed by a `DashMap`.
///
/// Public URLs follow `<public_base_url>/<path>`. Presigned URLs carry an
/// HMAC-SHA256 over path, media type and expiry, keyed by the signing secret.
pub struct InMemoryBlobStore {
    objects: DashMap<String, StoredBlob>,
    public_base_url: String,
    signing_secret: String,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryBlobStore {
    #[must_use]
    pub fn new(cfg: &CatalogConfig) -> Self {
        Self {
            objects: DashMap::new(),
            public_base_url: cfg.public_base_url.trim_end_matches('/').to_owned(),
            signing_secret: cfg.blob_signing_secret.clone(),
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Make subsequent `put`/`presign_put` calls fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `delete` calls fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<StoredBlob> {
        self.objects.get(path).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn mac(&self, path: &str, media_type: &str, expires: i64) -> anyhow::Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("blob signing key rejected: {e}"))?;
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(media_type.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Check a signature produced by [`BlobStore::presign_put`].
    #[must_use]
    pub fn verify_signature(
        &self,
        path: &str,
        media_type: &str,
        expires: i64,
        signature: &str,
    ) -> bool {
        if expires < OffsetDateTime::now_utc().unix_timestamp() {
            return false;
        }
        let (Ok(mac), Ok(tag)) = (self.mac(path, media_type, expires), hex::decode(signature))
        else {
            return false;
        };
        mac.verify_slice(&tag).is_ok()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        path: &str,
        bytes: Bytes,
        media_type: &str,
        visibility: Visibility,
    ) -> anyhow::Result<String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("blob store rejected write to {path}");
        }
        self.objects.insert(
            path.to_owned(),
            StoredBlob {
                bytes,
                media_type: media_type.to_owned(),
                visibility,
            },
        );
        Ok(format!("{}/{}", self.public_base_url, path))
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            anyhow::bail!("blob store rejected delete of {path}");
        }
        self.objects.remove(path);
        Ok(())
    }

    async fn presign_put(
        &self,
        path: &str,
        media_type: &str,
        ttl: Duration,
    ) -> anyhow::Result<String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("blob store cannot sign uploads for {path}");
        }
        let ttl = i64::try_from(ttl.as_secs())?;
        let expires = OffsetDateTime::now_utc().unix_timestamp() + ttl;
        let signature = hex::encode(self.mac(path, media_type, expires)?.finalize().into_bytes());
        Ok(format!(
            "{}/{}?content-type={}&expires={}&signature={}",
            self.public_base_url,
            path,
            urlencoding::encode(media_type),
            expires,
            signature
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryBlobStore {
        InMemoryBlobStore::new(&CatalogConfig {
            public_base_url: "https://blobs.test/".to_owned(),
            ..CatalogConfig::default()
        })
    }

    #[tokio::test]
    async fn put_returns_public_url_and_keeps_metadata() {
        let s = store();
        let url = s
            .put("a/b.png", Bytes::from_static(b"x"), "image/png", Visibility::PublicRead)
            .await
            .unwrap();
        assert_eq!(url, "https://blobs.test/a/b.png");

        let blob = s.get("a/b.png").unwrap();
        assert_eq!(blob.media_type, "image/png");
        assert_eq!(blob.visibility, Visibility::PublicRead);

        s.delete("a/b.png").await.unwrap();
        assert!(s.is_empty());
    }

    #[tokio::test]
    async fn presigned_url_verifies() {
        let s = store();
        let url = s
            .presign_put("a/b.webp", "image/webp", Duration::from_secs(600))
            .await
            .unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let q: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(q["content-type"], "image/webp");
        let expires: i64 = q["expires"].parse().unwrap();
        assert!(s.verify_signature("a/b.webp", "image/webp", expires, &q["signature"]));
        assert!(!s.verify_signature("a/c.webp", "image/webp", expires, &q["signature"]));
        assert!(!s.verify_signature("a/b.webp", "image/png", expires, &q["signature"]));
        assert!(!s.verify_signature("a/b.webp", "image/webp", expires, "not-hex"));
        assert_eq!(q["signature"].len(), 64);
    }

    #[tokio::test]
    async fn injected_failures() {
        let s = store();
        s.fail_writes(true);
        assert!(
            s.put("p", Bytes::new(), "image/png", Visibility::Private)
                .await
                .is_err()
        );
        s.fail_deletes(true);
        assert!(s.delete("p").await.is_err());
    }
}
