use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DbErr;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tokio::sync::RwLock;

use crate::models::{CreateProduct, Product, UpdateProduct};

/// Store results keep the store's own error so the service can classify it.
pub type StoreResult<T> = Result<T, DbErr>;

/// Repository trait for Product persistence
///
/// Implementations report a missing row as `DbErr::RecordNotFound`
/// (reads, deletes) or `DbErr::RecordNotUpdated` (updates).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product and return it with its assigned id
    async fn create(&self, input: CreateProduct) -> StoreResult<Product>;

    /// Total number of products
    async fn count(&self) -> StoreResult<u64>;

    /// One page of products ordered by id
    async fn find_many(&self, offset: u64, limit: u64) -> StoreResult<Vec<Product>>;

    /// The product with `id`, or `RecordNotFound`
    async fn find_unique_or_throw(&self, id: i32) -> StoreResult<Product>;

    /// Overwrite the supplied fields of `id`
    async fn update(&self, id: i32, input: UpdateProduct) -> StoreResult<Product>;

    /// Hard delete, returning the removed row
    async fn delete(&self, id: i32) -> StoreResult<Product>;

    /// Cheap round-trip used by readiness probes
    async fn ping(&self) -> StoreResult<()>;
}

/// The error every implementation uses for a missing row
pub(crate) fn not_found(id: i32) -> DbErr {
    DbErr::RecordNotFound(format!("Product {} not found", id))
}

/// In-memory implementation of ProductRepository (for development/testing)
///
/// Ids come from a counter and are never reused after a delete.
#[derive(Debug, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<BTreeMap<i32, Product>>>,
    next_id: Arc<AtomicI32>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            products: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI32::new(1)),
        }
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, input: CreateProduct) -> StoreResult<Product> {
        let mut products = self.products.write().await;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let product = Product {
            id,
            name: input.name,
            price: input.price,
            created_at: now,
            updated_at: now,
        };
        products.insert(id, product.clone());

        tracing::info!(product_id = id, "Created product");
        Ok(product)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.products.read().await.len() as u64)
    }

    async fn find_many(&self, offset: u64, limit: u64) -> StoreResult<Vec<Product>> {
        let products = self.products.read().await;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(products.values().skip(offset).take(limit).cloned().collect())
    }

    async fn find_unique_or_throw(&self, id: i32) -> StoreResult<Product> {
        self.products
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn update(&self, id: i32, input: UpdateProduct) -> StoreResult<Product> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or(DbErr::RecordNotUpdated)?;

        product.apply_update(input);

        tracing::info!(product_id = id, "Updated product");
        Ok(product.clone())
    }

    async fn delete(&self, id: i32) -> StoreResult<Product> {
        let removed = self
            .products
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| not_found(id))?;

        tracing::info!(product_id = id, "Deleted product");
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
