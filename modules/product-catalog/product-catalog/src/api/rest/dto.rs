use product_catalog_sdk::{PresignedUpload, Product, ProductPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};

/// REST representation of a product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub struct ProductDto {
    pub codigo: String,
    pub tenant_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: u64,
    pub requires_prescription: bool,
    pub active: bool,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
    /// Regulatory and clinical metadata (`category`, `manufacturer`, ...)
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub attributes: Map<String, Value>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        Self {
            codigo: p.codigo,
            tenant_id: p.tenant_id,
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            requires_prescription: p.requires_prescription,
            active: p.active,
            image_url: p.image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
            attributes: p.attributes,
        }
    }
}

/// One page of products
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductListDto {
    pub items: Vec<ProductDto>,
    pub count: usize,
    /// Pass back as `cursor` to fetch the next page
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl From<ProductPage> for ProductListDto {
    fn from(page: ProductPage) -> Self {
        let has_more = page.has_more();
        let items: Vec<ProductDto> = page.items.into_iter().map(Into::into).collect();
        Self {
            count: items.len(),
            items,
            next_cursor: page.next_cursor,
            has_more,
        }
    }
}

/// List query parameters. `limit` is taken as text so that a bad value
/// becomes a validation problem naming `limit`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page size, 1..=100 (default 20)
    pub limit: Option<String>,
    /// Opaque continuation token
    pub cursor: Option<String>,
    /// Alias of `cursor`
    #[serde(rename = "lastKey")]
    pub last_key: Option<String>,
}

/// Create or update body. Any allowlisted product field may be present;
/// `image` carries base64 image data, optionally as a `data:` URI.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductWriteRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<u64>,
    pub requires_prescription: Option<bool>,
    pub active: Option<bool>,
    pub image_url: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub active_ingredient: Option<String>,
    pub concentration: Option<String>,
    pub dosage_form: Option<String>,
    pub presentation: Option<String>,
    pub sanitary_registration: Option<String>,
    pub expiration_date: Option<String>,
    pub contraindications: Option<String>,
    pub indications: Option<String>,
}

/// Inline image upload body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageUploadRequest {
    /// Base64 image bytes, optionally wrapped in a `data:` URI
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PresignRequest {
    /// One of the allowed image extensions, e.g. `png`
    pub extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PresignedUploadDto {
    pub upload_url: String,
    pub public_url: String,
    pub path: String,
    /// Seconds until `upload_url` expires
    pub expires_in: u64,
}

impl From<PresignedUpload> for PresignedUploadDto {
    fn from(p: PresignedUpload) -> Self {
        Self {
            upload_url: p.upload_url,
            public_url: p.public_url,
            path: p.path,
            expires_in: p.expires_in,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthDto {
    pub status: String,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn product() -> Product {
        let mut attributes = Map::new();
        attributes.insert("category".to_owned(), json!("analgesic"));
        Product {
            tenant_id: "acme".to_owned(),
            codigo: "MED-1".to_owned(),
            name: "Aspirin".to_owned(),
            description: "Pain relief".to_owned(),
            price: 5.5,
            stock: 0,
            requires_prescription: false,
            active: true,
            image_url: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            attributes,
        }
    }

    #[test]
    fn product_dto_flattens_attributes() {
        let v = serde_json::to_value(ProductDto::from(product())).unwrap();
        assert_eq!(v["codigo"], "MED-1");
        assert_eq!(v["category"], "analgesic");
        assert_eq!(v["created_at"], "1970-01-01T00:00:00Z");
        assert!(v["image_url"].is_null());
    }

    #[test]
    fn list_dto_counts_items() {
        let dto = ProductListDto::from(ProductPage {
            items: vec![product(), product()],
            next_cursor: Some("abc".to_owned()),
        });
        assert_eq!(dto.count, 2);
        assert!(dto.has_more);
    }

    #[test]
    fn list_params_accept_last_key_alias() {
        let p: ListParams = serde_urlencoded::from_str("limit=5&lastKey=tok").unwrap();
        assert_eq!(p.limit.as_deref(), Some("5"));
        assert_eq!(p.last_key.as_deref(), Some("tok"));
        assert_eq!(p.cursor, None);
    }
}
