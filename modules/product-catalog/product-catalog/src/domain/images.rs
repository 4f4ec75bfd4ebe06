//! Image ingestion: classify, decode, size-check, store, and reconcile old blobs.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;
use product_catalog_sdk::{ImagePayload, PresignedUpload};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::blob::{BlobStore, Visibility};
use super::content_type::{self, ImageFormat};
use crate::config::CatalogConfig;

/// Padding-tolerant standard alphabet; browsers and CLI tools disagree on `=`.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unsupported image format; expected jpeg, png, gif or webp")]
    UnsupportedFormat,

    #[error("image is not valid base64")]
    InvalidEncoding,

    #[error("image is {size} bytes, limit is {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("extension '{0}' is not allowed")]
    UnsupportedExtension(String),

    #[error("image storage failed")]
    StorageWriteFailed(#[source] anyhow::Error),
}

/// Result of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: String,
    pub public_url: String,
    pub media_type: &'static str,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub namespace: String,
    pub bucket: String,
    pub public_base_url: String,
    pub max_bytes: usize,
    pub presign_ttl: Duration,
    pub extensions: Vec<String>,
}

impl From<&CatalogConfig> for ImageSettings {
    fn from(cfg: &CatalogConfig) -> Self {
        Self {
            namespace: cfg.namespace.trim_matches('/').to_owned(),
            bucket: cfg.bucket.clone(),
            public_base_url: cfg.public_base_url.trim_end_matches('/').to_owned(),
            max_bytes: cfg.max_image_bytes,
            presign_ttl: Duration::from_secs(cfg.presign_ttl_secs),
            extensions: cfg
                .presign_extensions
                .iter()
                .map(|e| e.trim().to_ascii_lowercase())
                .collect(),
        }
    }
}

pub struct ImagePipeline {
    blobs: Arc<dyn BlobStore>,
    settings: ImageSettings,
}

impl ImagePipeline {
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>, settings: ImageSettings) -> Self {
        Self { blobs, settings }
    }

    /// Validate `payload` and store it under the product's prefix.
    ///
    /// # Errors
    /// Format, encoding and size problems are reported before anything is
    /// written; a failed blob write is `StorageWriteFailed`.
    pub async fn ingest(
        &self,
        payload: &ImagePayload,
        tenant_id: &str,
        codigo: &str,
    ) -> Result<StoredImage, ImageError> {
        let (format, bytes) = self.decode(payload)?;

        let path =
            self.derive_path(tenant_id, codigo, format.extension(), OffsetDateTime::now_utc());
        let size = bytes.len();
        let public_url = self
            .blobs
            .put(&path, bytes, format.media_type(), Visibility::PublicRead)
            .await
            .map_err(ImageError::StorageWriteFailed)?;

        info!(path = %path, size, media_type = format.media_type(), "image stored");
        Ok(StoredImage {
            path,
            public_url,
            media_type: format.media_type(),
            size,
        })
    }

    fn decode(&self, payload: &ImagePayload) -> Result<(ImageFormat, Bytes), ImageError> {
        let (format, bytes) = match payload {
            ImagePayload::Base64(text) => {
                let body = content_type::strip_data_uri(text);
                let format =
                    content_type::classify_base64(body).ok_or(ImageError::UnsupportedFormat)?;
                let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                let raw = LENIENT_BASE64
                    .decode(compact)
                    .map_err(|_| ImageError::InvalidEncoding)?;
                (format, Bytes::from(raw))
            }
            ImagePayload::Raw(bytes) => {
                let format = content_type::classify(bytes).ok_or(ImageError::UnsupportedFormat)?;
                (format, bytes.clone())
            }
        };

        if bytes.len() > self.settings.max_bytes {
            return Err(ImageError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.settings.max_bytes,
            });
        }
        Ok((format, bytes))
    }

    /// Best-effort removal of `old_url` once a product points elsewhere.
    pub async fn replace(
        &self,
        old_url: Option<&str>,
        new_url: Option<&str>,
        tenant_id: &str,
        codigo: &str,
    ) {
        match old_url {
            Some(old) if Some(old) != new_url => self.remove(old, tenant_id, codigo).await,
            _ => {}
        }
    }

    /// Best-effort delete of the blob behind `url`.
    ///
    /// Failures are logged and swallowed. Blobs outside the product's own
    /// prefix are never touched.
    pub async fn remove(&self, url: &str, tenant_id: &str, codigo: &str) {
        let Some(path) = self.path_from_url(url) else {
            debug!(url, "image URL does not belong to this store; nothing to delete");
            return;
        };
        if !path.starts_with(&self.product_prefix(tenant_id, codigo)) {
            warn!(path = %path, codigo, "refusing to delete image outside the product prefix");
            return;
        }
        match self.blobs.delete(&path).await {
            Ok(()) => debug!(path = %path, "old image deleted"),
            Err(e) => warn!(path = %path, error = %e, "failed to delete old image"),
        }
    }

    /// Issue a direct upload URL for the product's next image.
    ///
    /// # Errors
    /// `UnsupportedExtension` for extensions outside the allowlist;
    /// `StorageWriteFailed` if the store cannot sign.
    pub async fn presign(
        &self,
        tenant_id: &str,
        codigo: &str,
        extension: &str,
    ) -> Result<PresignedUpload, ImageError> {
        let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        let format = ImageFormat::from_extension(&ext)
            .filter(|_| self.settings.extensions.iter().any(|e| *e == ext))
            .ok_or_else(|| ImageError::UnsupportedExtension(extension.to_owned()))?;

        let path = self.derive_path(tenant_id, codigo, &ext, OffsetDateTime::now_utc());
        let upload_url = self
            .blobs
            .presign_put(&path, format.media_type(), self.settings.presign_ttl)
            .await
            .map_err(ImageError::StorageWriteFailed)?;

        Ok(PresignedUpload {
            upload_url,
            public_url: self.public_url(&path),
            path,
            expires_in: self.settings.presign_ttl.as_secs(),
        })
    }

    fn product_prefix(&self, tenant_id: &str, codigo: &str) -> String {
        format!("{}/{}/{}/", self.settings.namespace, tenant_id, codigo)
    }

    /// `<namespace>/<tenant>/<codigo>/<unix nanos>.<ext>`
    #[must_use]
    pub fn derive_path(
        &self,
        tenant_id: &str,
        codigo: &str,
        extension: &str,
        now: OffsetDateTime,
    ) -> String {
        format!(
            "{}{}.{}",
            self.product_prefix(tenant_id, codigo),
            now.unix_timestamp_nanos(),
            extension
        )
    }

    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.public_base_url, path)
    }

    /// Recover the storage path from a public URL.
    ///
    /// Understands `<public_base_url>/<path>`, `https://<bucket>[.host]/<path>`
    /// and path-style `https://host/<bucket>/<path>`.
    #[must_use]
    pub fn path_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.settings.public_base_url);
        if let Some(rest) = url.strip_prefix(&prefix) {
            return non_empty(decode_path(rest));
        }

        let parsed = url::Url::parse(url).ok()?;
        let raw_path = parsed.path().trim_start_matches('/');
        let bucket = self.settings.bucket.as_str();
        let host = parsed.host_str().unwrap_or_default();

        if host == bucket || host.starts_with(&format!("{bucket}.")) {
            return non_empty(decode_path(raw_path));
        }
        let (first, rest) = raw_path.split_once('/')?;
        if first == bucket {
            return non_empty(decode_path(rest));
        }
        None
    }
}

fn decode_path(raw: &str) -> String {
    let without_query = raw.split(['?', '#']).next().unwrap_or_default();
    urlencoding::decode(without_query).map_or_else(|_| without_query.to_owned(), |s| s.into_owned())
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}
