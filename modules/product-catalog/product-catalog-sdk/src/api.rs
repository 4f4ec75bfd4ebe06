//! `ProductCatalogClientV1` trait definition.

use async_trait::async_trait;
use catalog_auth::Claims;

use crate::errors::CatalogError;
use crate::models::{ImagePayload, ListQuery, PresignedUpload, Product, ProductDraft, ProductPage};

/// Public API of the product catalog.
///
/// Every method is scoped to `claims.tenant_id`; products of other tenants
/// are indistinguishable from missing ones.
#[async_trait]
pub trait ProductCatalogClientV1: Send + Sync {
    /// List active products, newest code first.
    ///
    /// # Errors
    ///
    /// * `Validation` - bad `limit` or undecodable `cursor`
    async fn list(&self, claims: &Claims, query: ListQuery) -> Result<ProductPage, CatalogError>;

    /// Create a product with a server-generated code.
    ///
    /// # Errors
    ///
    /// * `Validation` - missing or malformed required field, rejected image
    /// * `StorageWriteFailed` - the image could not be stored
    async fn create(&self, claims: &Claims, draft: ProductDraft)
    -> Result<Product, CatalogError>;

    async fn get(&self, claims: &Claims, codigo: &str) -> Result<Product, CatalogError>;

    /// Apply a sparse update; a new image replaces the previous one.
    async fn update(
        &self,
        claims: &Claims,
        codigo: &str,
        draft: ProductDraft,
    ) -> Result<Product, CatalogError>;

    /// Delete a product and return its last snapshot.
    async fn delete(&self, claims: &Claims, codigo: &str) -> Result<Product, CatalogError>;

    async fn upload_image(
        &self,
        claims: &Claims,
        codigo: &str,
        image: ImagePayload,
    ) -> Result<Product, CatalogError>;

    /// Issue a time-limited direct upload URL for the product image.
    async fn presign_image(
        &self,
        claims: &Claims,
        codigo: &str,
        extension: &str,
    ) -> Result<PresignedUpload, CatalogError>;
}
