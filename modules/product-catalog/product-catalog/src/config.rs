use serde::{Deserialize, Serialize};

/// How delete removes a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Flip `active` to false; reads treat inactive products as absent
    #[default]
    Soft,
    /// Remove the record; `active` is an ordinary attribute
    Hard,
}

/// Configuration for the `product-catalog` module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// First path segment of every stored image
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Prefix of public image URLs; `<public_base_url>/<path>`
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    #[serde(default = "default_presign_ttl_secs")]
    pub presign_ttl_secs: u64,
    /// Lower-case extensions a presigned upload may use
    #[serde(default = "default_presign_extensions")]
    pub presign_extensions: Vec<String>,
    /// Secret the in-memory blob store signs upload URLs with
    #[serde(default = "default_blob_signing_secret")]
    pub blob_signing_secret: String,
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    #[serde(default)]
    pub delete_policy: DeletePolicy,
    /// Report inspected request fields when a path parameter is missing
    #[serde(default = "default_diagnostics")]
    pub diagnostics: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            bucket: default_bucket(),
            public_base_url: default_public_base_url(),
            max_image_bytes: default_max_image_bytes(),
            presign_ttl_secs: default_presign_ttl_secs(),
            presign_extensions: default_presign_extensions(),
            blob_signing_secret: default_blob_signing_secret(),
            code_prefix: default_code_prefix(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            delete_policy: DeletePolicy::default(),
            diagnostics: default_diagnostics(),
        }
    }
}

fn default_namespace() -> String {
    "products".to_owned()
}

fn default_bucket() -> String {
    "catalog-images".to_owned()
}

fn default_public_base_url() -> String {
    "https://catalog-images.s3.amazonaws.com".to_owned()
}

fn default_max_image_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_presign_ttl_secs() -> u64 {
    600
}

fn default_presign_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp"]
        .into_iter()
        .map(ToOwned::to_owned)
        .collect()
}

fn default_blob_signing_secret() -> String {
    "dev-blob-signing-secret".to_owned()
}

fn default_code_prefix() -> String {
    "MED".to_owned()
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

fn default_diagnostics() -> bool {
    cfg!(debug_assertions)
}
