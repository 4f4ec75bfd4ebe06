use async_trait::async_trait;
use product_catalog_sdk::Product;

use super::cursor::StoreKey;
use super::update_plan::UpdatePlan;

pub const PARTITION_KEY: &str = "tenant_id";
pub const SORT_KEY: &str = "codigo";

/// Primary key of a stored product.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductKey {
    pub tenant_id: String,
    pub codigo: String,
}

impl ProductKey {
    #[must_use]
    pub fn new(tenant_id: impl Into<String>, codigo: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            codigo: codigo.into(),
        }
    }

    #[must_use]
    pub fn of(product: &Product) -> Self {
        Self::new(product.tenant_id.clone(), product.codigo.clone())
    }

    #[must_use]
    pub fn to_store_key(&self) -> StoreKey {
        StoreKey::from([
            (PARTITION_KEY.to_owned(), self.tenant_id.clone()),
            (SORT_KEY.to_owned(), self.codigo.clone()),
        ])
    }
}

/// Single-partition scan ordered by sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub tenant_id: String,
    pub descending: bool,
    pub limit: usize,
    /// Exclusive resume point (sort key of the last item already returned)
    pub resume_after: Option<String>,
    /// Skip products with `active == false` before the limit is applied
    pub active_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Product>,
    /// Present when more items may follow
    pub next_key: Option<ProductKey>,
}

/// Tenant-partitioned product table.
///
/// Every call is atomic per key; nothing spans records.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self, key: &ProductKey) -> anyhow::Result<Option<Product>>;

    /// Unconditional write.
    async fn put(&self, product: &Product) -> anyhow::Result<()>;

    /// Apply `plan` and return the new item, or `None` if the key is absent.
    async fn update(&self, key: &ProductKey, plan: &UpdatePlan) -> anyhow::Result<Option<Product>>;

    /// Remove and return the old item.
    async fn delete(&self, key: &ProductKey) -> anyhow::Result<Option<Product>>;

    async fn query(&self, query: &ProductQuery) -> anyhow::Result<QueryPage>;
}
