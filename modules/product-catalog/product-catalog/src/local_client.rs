use std::sync::Arc;

use async_trait::async_trait;
use catalog_auth::Claims;
use product_catalog_sdk::{
    CatalogError, ImagePayload, ListQuery, PresignedUpload, Product, ProductCatalogClientV1,
    ProductDraft, ProductPage,
};

use crate::domain::service::Service;

/// In-process implementation of [`ProductCatalogClientV1`].
pub struct LocalClient {
    service: Arc<Service>,
}

impl LocalClient {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ProductCatalogClientV1 for LocalClient {
    async fn list(&self, claims: &Claims, query: ListQuery) -> Result<ProductPage, CatalogError> {
        self.service
            .list(&claims.tenant_id, &query)
            .await
            .map_err(Into::into)
    }

    async fn create(&self, claims: &Claims, draft: ProductDraft) -> Result<Product, CatalogError> {
        self.service
            .create(&claims.tenant_id, draft)
            .await
            .map_err(Into::into)
    }

    async fn get(&self, claims: &Claims, codigo: &str) -> Result<Product, CatalogError> {
        self.service
            .get(&claims.tenant_id, codigo)
            .await
            .map_err(Into::into)
    }

    async fn update(
        &self,
        claims: &Claims,
        codigo: &str,
        draft: ProductDraft,
    ) -> Result<Product, CatalogError> {
        self.service
            .update(&claims.tenant_id, codigo, draft)
            .await
            .map_err(Into::into)
    }

    async fn delete(&self, claims: &Claims, codigo: &str) -> Result<Product, CatalogError> {
        self.service
            .delete(&claims.tenant_id, codigo)
            .await
            .map_err(Into::into)
    }

    async fn upload_image(
        &self,
        claims: &Claims,
        codigo: &str,
        image: ImagePayload,
    ) -> Result<Product, CatalogError> {
        self.service
            .upload_image(&claims.tenant_id, codigo, &image)
            .await
            .map_err(Into::into)
    }

    async fn presign_image(
        &self,
        claims: &Claims,
        codigo: &str,
        extension: &str,
    ) -> Result<PresignedUpload, CatalogError> {
        self.service
            .presign_image(&claims.tenant_id, codigo, extension)
            .await
            .map_err(Into::into)
    }
}
