//! Catalog operations over the product store and the image pipeline.

use std::sync::Arc;

use product_catalog_sdk::{
    ImagePayload, ListQuery, PresignedUpload, Product, ProductDraft, ProductFields as F,
    ProductPage,
};
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info, instrument};

use super::blob::BlobStore;
use super::code::generate_code;
use super::cursor;
use super::error::{CURSOR_FIELD, DomainError, LIMIT_FIELD};
use super::fields::{PRODUCT_FIELD_RULES, REQUIRED_ON_CREATE};
use super::images::{ImagePipeline, ImageSettings};
use super::repo::{ProductKey, ProductQuery, ProductStore, SORT_KEY};
use super::update_plan::{UpdatePlan, assign_all, build_plan, coerce_fields};
use crate::config::{CatalogConfig, DeletePolicy};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub code_prefix: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub delete_policy: DeletePolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from(&CatalogConfig::default())
    }
}

impl From<&CatalogConfig> for ServiceConfig {
    fn from(cfg: &CatalogConfig) -> Self {
        Self {
            code_prefix: cfg.code_prefix.clone(),
            default_page_size: cfg.default_page_size,
            max_page_size: cfg.max_page_size,
            delete_policy: cfg.delete_policy,
        }
    }
}

pub struct Service {
    store: Arc<dyn ProductStore>,
    images: ImagePipeline,
    config: ServiceConfig,
}

impl Service {
    #[must_use]
    pub fn new(
        store: Arc<dyn ProductStore>,
        blobs: Arc<dyn BlobStore>,
        catalog: &CatalogConfig,
    ) -> Self {
        Self {
            store,
            images: ImagePipeline::new(blobs, ImageSettings::from(catalog)),
            config: ServiceConfig::from(catalog),
        }
    }

    fn hides_inactive(&self) -> bool {
        self.config.delete_policy == DeletePolicy::Soft
    }

    /// Fetch a product the caller may see; under soft delete inactive ones are absent.
    async fn load_visible(&self, key: &ProductKey) -> Result<Product, DomainError> {
        match self.store.get(key).await.map_err(upstream("get"))? {
            Some(p) if p.active || !self.hides_inactive() => Ok(p),
            _ => Err(DomainError::not_found(&key.codigo)),
        }
    }

    #[instrument(skip(self, query), fields(tenant_id = %tenant_id))]
    pub async fn list(
        &self,
        tenant_id: &str,
        query: &ListQuery,
    ) -> Result<ProductPage, DomainError> {
        let limit = match query.limit {
            None => self.config.default_page_size,
            Some(0) => {
                return Err(DomainError::validation(LIMIT_FIELD, "must be a positive integer"));
            }
            Some(n) => n.min(self.config.max_page_size),
        };

        // Only the sort key is trusted; the partition always comes from the caller
        let resume_after = match query.cursor.as_deref().filter(|c| !c.trim().is_empty()) {
            None => None,
            Some(token) => {
                let key = cursor::decode(token)?;
                let codigo = key.get(SORT_KEY).cloned().ok_or_else(|| {
                    DomainError::validation(CURSOR_FIELD, "cursor carries no product code")
                })?;
                Some(codigo)
            }
        };

        let page = self
            .store
            .query(&ProductQuery {
                tenant_id: tenant_id.to_owned(),
                descending: true,
                limit: usize::try_from(limit).unwrap_or(usize::MAX),
                resume_after,
                active_only: self.hides_inactive(),
            })
            .await
            .map_err(upstream("query"))?;

        debug!(count = page.items.len(), more = page.next_key.is_some(), "listed products");
        Ok(ProductPage {
            items: page.items,
            next_cursor: page.next_key.map(|k| cursor::encode(&k.to_store_key())),
        })
    }

    #[instrument(skip(self, draft), fields(tenant_id = %tenant_id))]
    pub async fn create(
        &self,
        tenant_id: &str,
        draft: ProductDraft,
    ) -> Result<Product, DomainError> {
        for field in REQUIRED_ON_CREATE {
            if draft.fields.get(*field).is_none_or(Value::is_null) {
                return Err(DomainError::validation(*field, format!("{field} is required")));
            }
        }
        let assignments = coerce_fields(PRODUCT_FIELD_RULES, &draft.fields)?;

        let now = OffsetDateTime::now_utc();
        let stamp = now
            .format(&Rfc3339)
            .map_err(|e| DomainError::Upstream(e.into()))?;
        let codigo = generate_code(&self.config.code_prefix, now);

        let stored = match &draft.image {
            Some(payload) => Some(self.images.ingest(payload, tenant_id, &codigo).await?),
            None => None,
        };

        let mut object = match json!({
            "tenant_id": tenant_id,
            "codigo": codigo,
            "stock": 0,
            "requires_prescription": false,
            "image_url": null,
            "created_at": stamp,
            "updated_at": stamp,
        }) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        assign_all(&mut object, &assignments);
        object.insert(F::ACTIVE.to_owned(), Value::Bool(true));
        if let Some(img) = &stored {
            object.insert(F::IMAGE_URL.to_owned(), Value::String(img.public_url.clone()));
        }

        let product: Product = serde_json::from_value(Value::Object(object))
            .map_err(|e| DomainError::Upstream(e.into()))?;

        if let Err(e) = self.store.put(&product).await {
            if let Some(img) = &stored {
                self.images.remove(&img.public_url, tenant_id, &codigo).await;
            }
            return Err(upstream("put")(e));
        }

        info!(codigo = %product.codigo, "product created");
        Ok(product)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn get(&self, tenant_id: &str, codigo: &str) -> Result<Product, DomainError> {
        self.load_visible(&ProductKey::new(tenant_id, codigo)).await
    }

    /// Sparse update. Presence is enough to update, so a soft-deleted product
    /// can be reactivated with `active: true`.
    #[instrument(skip(self, draft), fields(tenant_id = %tenant_id))]
    pub async fn update(
        &self,
        tenant_id: &str,
        codigo: &str,
        draft: ProductDraft,
    ) -> Result<Product, DomainError> {
        let key = ProductKey::new(tenant_id, codigo);
        let existing = self
            .store
            .get(&key)
            .await
            .map_err(upstream("get"))?
            .ok_or_else(|| DomainError::not_found(codigo))?;

        let mut plan = build_plan(PRODUCT_FIELD_RULES, &draft.fields, OffsetDateTime::now_utc())?;
        let stored = match &draft.image {
            Some(payload) => Some(self.images.ingest(payload, tenant_id, codigo).await?),
            None => None,
        };
        if let Some(img) = &stored {
            plan.set(F::IMAGE_URL, Value::String(img.public_url.clone()));
        }

        let updated = self
            .apply_or_discard(&key, &plan, stored.as_ref().map(|i| i.public_url.as_str()))
            .await?;
        self.images
            .replace(
                existing.image_url.as_deref(),
                updated.image_url.as_deref(),
                tenant_id,
                codigo,
            )
            .await;

        info!(codigo, fields = plan.assignments().len(), "product updated");
        Ok(updated)
    }

    /// Delete according to the configured policy and return the former snapshot.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn delete(&self, tenant_id: &str, codigo: &str) -> Result<Product, DomainError> {
        let key = ProductKey::new(tenant_id, codigo);
        let existing = self.load_visible(&key).await?;

        if let Some(url) = existing.image_url.as_deref() {
            self.images.remove(url, tenant_id, codigo).await;
        }

        match self.config.delete_policy {
            DeletePolicy::Soft => {
                let mut input = Map::new();
                input.insert(F::ACTIVE.to_owned(), Value::Bool(false));
                input.insert(F::IMAGE_URL.to_owned(), Value::Null);
                let plan = build_plan(PRODUCT_FIELD_RULES, &input, OffsetDateTime::now_utc())?;
                self.apply(&key, &plan).await?;
            }
            DeletePolicy::Hard => {
                self.store
                    .delete(&key)
                    .await
                    .map_err(upstream("delete"))?
                    .ok_or_else(|| DomainError::not_found(codigo))?;
            }
        }

        info!(codigo, policy = ?self.config.delete_policy, "product deleted");
        Ok(existing)
    }

    /// Replace the product image with `payload`.
    #[instrument(skip(self, payload), fields(tenant_id = %tenant_id))]
    pub async fn upload_image(
        &self,
        tenant_id: &str,
        codigo: &str,
        payload: &ImagePayload,
    ) -> Result<Product, DomainError> {
        let key = ProductKey::new(tenant_id, codigo);
        let existing = self.load_visible(&key).await?;

        let stored = self.images.ingest(payload, tenant_id, codigo).await?;
        let mut plan = build_plan(PRODUCT_FIELD_RULES, &Map::new(), OffsetDateTime::now_utc())?;
        plan.set(F::IMAGE_URL, Value::String(stored.public_url.clone()));

        let updated = self
            .apply_or_discard(&key, &plan, Some(&stored.public_url))
            .await?;
        self.images
            .replace(
                existing.image_url.as_deref(),
                updated.image_url.as_deref(),
                tenant_id,
                codigo,
            )
            .await;
        Ok(updated)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn presign_image(
        &self,
        tenant_id: &str,
        codigo: &str,
        extension: &str,
    ) -> Result<PresignedUpload, DomainError> {
        self.load_visible(&ProductKey::new(tenant_id, codigo)).await?;
        Ok(self.images.presign(tenant_id, codigo, extension).await?)
    }

    async fn apply(&self, key: &ProductKey, plan: &UpdatePlan) -> Result<Product, DomainError> {
        self.store
            .update(key, plan)
            .await
            .map_err(upstream("update"))?
            .ok_or_else(|| DomainError::not_found(&key.codigo))
    }

    /// Like `apply`, but a freshly stored image is removed again when the write fails.
    async fn apply_or_discard(
        &self,
        key: &ProductKey,
        plan: &UpdatePlan,
        new_image: Option<&str>,
    ) -> Result<Product, DomainError> {
        match self.apply(key, plan).await {
            Ok(product) => Ok(product),
            Err(e) => {
                if let Some(url) = new_image {
                    self.images.remove(url, &key.tenant_id, &key.codigo).await;
                }
                Err(e)
            }
        }
    }
}

fn upstream(op: &'static str) -> impl Fn(anyhow::Error) -> DomainError {
    move |e| {
        error!(operation = op, error = %e, "product store call failed");
        DomainError::Upstream(e)
    }
}
