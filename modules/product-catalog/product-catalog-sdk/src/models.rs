//! Public models for the product-catalog module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the catalog and its consumers.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// A catalog product, keyed by `(tenant_id, codigo)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub tenant_id: String,
    pub codigo: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub stock: u64,
    #[serde(default)]
    pub requires_prescription: bool,
    pub active: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Free-form regulatory metadata (`category`, `manufacturer`, ...)
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Field names shared by the update allowlist, DTOs and storage.
pub struct ProductFields;

impl ProductFields {
    pub const NAME: &'static str = "name";
    pub const DESCRIPTION: &'static str = "description";
    pub const PRICE: &'static str = "price";
    pub const STOCK: &'static str = "stock";
    pub const REQUIRES_PRESCRIPTION: &'static str = "requires_prescription";
    pub const ACTIVE: &'static str = "active";
    pub const IMAGE_URL: &'static str = "image_url";
    pub const UPDATED_AT: &'static str = "updated_at";

    pub const CATEGORY: &'static str = "category";
    pub const MANUFACTURER: &'static str = "manufacturer";
    pub const ACTIVE_INGREDIENT: &'static str = "active_ingredient";
    pub const CONCENTRATION: &'static str = "concentration";
    pub const DOSAGE_FORM: &'static str = "dosage_form";
    pub const PRESENTATION: &'static str = "presentation";
    pub const SANITARY_REGISTRATION: &'static str = "sanitary_registration";
    pub const EXPIRATION_DATE: &'static str = "expiration_date";
    pub const CONTRAINDICATIONS: &'static str = "contraindications";
    pub const INDICATIONS: &'static str = "indications";
}

/// Image bytes supplied by a client, either inline base64 or a raw upload part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Base64 text, optionally wrapped in a `data:` URI
    Base64(String),
    Raw(Bytes),
}

/// Sparse product input used by create and update.
///
/// `fields` is the untyped request body; only allowlisted names are honored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub fields: Map<String, Value>,
    pub image: Option<ImagePayload>,
}

impl ProductDraft {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            image: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }
}

/// Paging request for list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Page size; `None` means the configured default
    pub limit: Option<u32>,
    /// Opaque continuation token from a previous page
    pub cursor: Option<String>,
}

impl ListQuery {
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// One page of products, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub next_cursor: Option<String>,
}

impl ProductPage {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Credentials for a direct client-to-blob-store upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub public_url: String,
    pub path: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attributes_flatten_next_to_typed_fields() {
        let raw = json!({
            "tenant_id": "acme",
            "codigo": "MED-1",
            "name": "Aspirin",
            "description": "Pain relief",
            "price": 5.5,
            "active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "category": "analgesic",
            "manufacturer": "Bayer"
        });

        let product: Product = serde_json::from_value(raw).unwrap();
        assert_eq!(product.stock, 0);
        assert!(!product.requires_prescription);
        assert_eq!(product.image_url, None);
        assert_eq!(product.attributes.get("category"), Some(&json!("analgesic")));
        assert_eq!(product.attributes.len(), 2);

        let back = serde_json::to_value(&product).unwrap();
        assert_eq!(back["manufacturer"], "Bayer");
        assert_eq!(back["created_at"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn page_reports_more_only_with_cursor() {
        let page = ProductPage {
            items: vec![],
            next_cursor: None,
        };
        assert!(!page.has_more());

        let page = ProductPage {
            items: vec![],
            next_cursor: Some("abc".to_owned()),
        };
        assert!(page.has_more());
    }
}
