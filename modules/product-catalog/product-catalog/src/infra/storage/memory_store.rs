//! In-process product table.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::RwLock;
use product_catalog_sdk::Product;

use crate::domain::repo::{ProductKey, ProductQuery, ProductStore, QueryPage};
use crate::domain::update_plan::UpdatePlan;

/// Product table ordered by `(tenant_id, codigo)`.
///
/// Each operation holds the lock for its whole read-modify-write, which gives
/// the per-key atomicity the store contract asks for.
#[derive(Default)]
pub struct InMemoryProductStore {
    table: RwLock<BTreeMap<ProductKey, Product>>,
    unavailable: AtomicBool,
}

impl InMemoryProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, simulating an outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    fn check_available(&self) -> anyhow::Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            anyhow::bail!("product table unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get(&self, key: &ProductKey) -> anyhow::Result<Option<Product>> {
        self.check_available()?;
        Ok(self.table.read().get(key).cloned())
    }

    async fn put(&self, product: &Product) -> anyhow::Result<()> {
        self.check_available()?;
        self.table
            .write()
            .insert(ProductKey::of(product), product.clone());
        Ok(())
    }

    async fn update(&self, key: &ProductKey, plan: &UpdatePlan) -> anyhow::Result<Option<Product>> {
        self.check_available()?;
        let mut table = self.table.write();
        let Some(current) = table.get_mut(key) else {
            return Ok(None);
        };
        let updated = plan
            .apply_to(current)
            .with_context(|| format!("applying update to {}", key.codigo))?;
        *current = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, key: &ProductKey) -> anyhow::Result<Option<Product>> {
        self.check_available()?;
        Ok(self.table.write().remove(key))
    }

    async fn query(&self, query: &ProductQuery) -> anyhow::Result<QueryPage> {
        self.check_available()?;
        let table = self.table.read();

        let tenant = query.tenant_id.as_str();
        let lower = ProductKey::new(tenant, "");
        let partition = table
            .range((Bound::Included(lower), Bound::Unbounded))
            .take_while(|(k, _)| k.tenant_id == tenant);

        let after = query.resume_after.as_deref();
        let matches = |(k, p): &(&ProductKey, &Product)| {
            let past_cursor = match after {
                None => true,
                Some(c) if query.descending => k.codigo.as_str() < c,
                Some(c) => k.codigo.as_str() > c,
            };
            past_cursor && (!query.active_only || p.active)
        };

        // One extra item tells whether another page exists
        let mut items: Vec<Product> = if query.descending {
            partition
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .filter(matches)
                .take(query.limit + 1)
                .map(|(_, p)| p.clone())
                .collect()
        } else {
            partition
                .filter(matches)
                .take(query.limit + 1)
                .map(|(_, p)| p.clone())
                .collect()
        };

        let next_key = if items.len() > query.limit {
            items.truncate(query.limit);
            items.last().map(ProductKey::of)
        } else {
            None
        };

        Ok(QueryPage { items, next_key })
    }
}
