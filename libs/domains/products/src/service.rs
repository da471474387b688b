use sea_orm::DbErr;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CreateProduct, PageMeta, PaginatedProducts, Pagination, Product, UpdateProduct,
};
use crate::repository::ProductRepository;

/// Service layer for Product business logic
#[derive(Clone)]
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new product
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        Ok(self.repository.create(input).await?)
    }

    /// One page of products plus totals.
    ///
    /// Count and page are fetched concurrently and are not isolated from each
    /// other, so `meta.total` may disagree with `data` under concurrent writes.
    #[instrument(skip(self))]
    pub async fn find_all(&self, pagination: Pagination) -> ProductResult<PaginatedProducts> {
        pagination
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;
        let offset = pagination
            .offset()
            .ok_or_else(|| ProductError::Validation("page is out of range".to_string()))?;

        let (total, data) = tokio::try_join!(
            self.repository.count(),
            self.repository.find_many(offset, pagination.limit)
        )?;

        Ok(PaginatedProducts {
            data,
            meta: PageMeta::new(pagination, total),
        })
    }

    /// Get a product by ID. Every lookup failure is reported as `NotFound`.
    #[instrument(skip(self))]
    pub async fn find_one(&self, id: i32) -> ProductResult<Product> {
        self.repository
            .find_unique_or_throw(id)
            .await
            .map_err(|e| {
                if !matches!(e, DbErr::RecordNotFound(_)) {
                    tracing::warn!(product_id = id, error = %e, "Product lookup failed");
                }
                ProductError::NotFound
            })
    }

    /// Overwrite the supplied fields of a product
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: UpdateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        Ok(self.repository.update(id, input).await?)
    }

    /// Permanently delete a product, returning its last state
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i32) -> ProductResult<Product> {
        Ok(self.repository.delete(id).await?)
    }

    /// Store round-trip for readiness checks
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.repository.ping().await
    }
}
