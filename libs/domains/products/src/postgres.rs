use async_trait::async_trait;
use chrono::Utc;
use database::postgres::{PostgresConfig, check_health, connect_from_config_with_retry};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryOrder,
    QuerySelect,
};
use tracing::instrument;

use crate::{
    entity,
    models::{CreateProduct, Product, UpdateProduct},
    repository::{ProductRepository, StoreResult, not_found},
};

/// SeaORM-backed repository over the `products` table
#[derive(Clone)]
pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open a pool (with startup retries) and wrap it.
    pub async fn connect(config: PostgresConfig) -> Result<Self, DbErr> {
        connect_from_config_with_retry(config).await.map(Self::new)
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    async fn create(&self, input: CreateProduct) -> StoreResult<Product> {
        let now = Utc::now().fixed_offset();
        let active_model = entity::ActiveModel {
            id: NotSet,
            name: Set(input.name),
            price: Set(input.price),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;

        tracing::info!(product_id = model.id, "Created product");
        Ok(model.into())
    }

    async fn count(&self) -> StoreResult<u64> {
        entity::Entity::find().count(&self.db).await
    }

    #[instrument(skip(self))]
    async fn find_many(&self, offset: u64, limit: u64) -> StoreResult<Vec<Product>> {
        let models = entity::Entity::find()
            .order_by_asc(entity::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_unique_or_throw(&self, id: i32) -> StoreResult<Product> {
        entity::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| not_found(id))
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: i32, input: UpdateProduct) -> StoreResult<Product> {
        let mut active_model = entity::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        if let Some(name) = input.name {
            active_model.name = Set(name);
        }
        if let Some(price) = input.price {
            active_model.price = Set(price);
        }

        // UPDATE .. RETURNING; no row back is DbErr::RecordNotUpdated
        let model = active_model.update(&self.db).await?;

        tracing::info!(product_id = id, "Updated product");
        Ok(model.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> StoreResult<Product> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| not_found(id))?;

        let result = entity::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            // Removed concurrently between the read and the delete
            return Err(not_found(id));
        }

        tracing::info!(product_id = id, "Deleted product");
        Ok(model.into())
    }

    async fn ping(&self) -> StoreResult<()> {
        check_health(&self.db)
            .await
            .map_err(|e| DbErr::Custom(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn model(id: i32, name: &str, price: f64) -> entity::Model {
        let now = Utc::now().fixed_offset();
        entity::Model {
            id,
            name: name.to_string(),
            price,
            created_at: now,
            updated_at: now,
        }
    }

    fn repo(db: MockDatabase) -> PgProductRepository {
        PgProductRepository::new(db.into_connection())
    }

    #[tokio::test]
    async fn test_create_returns_inserted_row() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model(1, "Keyboard", 49.5)]]),
        );

        let product = repo
            .create(CreateProduct {
                name: "Keyboard".to_string(),
                price: 49.5,
            })
            .await
            .unwrap();

        assert_eq!(product.id, 1);
        assert_eq!(product.name, "Keyboard");
        assert_eq!(product.price, 49.5);
    }

    #[tokio::test]
    async fn test_count() {
        let repo = repo(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            BTreeMap::from([("num_items", Value::BigInt(Some(25)))]),
        ]]));

        assert_eq!(repo.count().await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_find_many_maps_rows() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model(21, "a", 1.0), model(22, "b", 2.0)]]),
        );

        let products = repo.find_many(20, 10).await.unwrap();
        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![21, 22]);
    }

    #[tokio::test]
    async fn test_find_unique_or_throw_missing_row() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<entity::Model>::new()]),
        );

        assert!(matches!(
            repo.find_unique_or_throw(42).await,
            Err(DbErr::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_returns_updated_row() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model(3, "Desk lamp", 20.0)]]),
        );

        let product = repo
            .update(
                3,
                UpdateProduct {
                    name: Some("Desk lamp".to_string()),
                    price: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(product.id, 3);
        assert_eq!(product.name, "Desk lamp");
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_updated() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<entity::Model>::new()]),
        );

        assert!(matches!(
            repo.update(3, UpdateProduct::default()).await,
            Err(DbErr::RecordNotUpdated)
        ));
    }

    #[tokio::test]
    async fn test_delete_returns_removed_row() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model(5, "Chair", 75.0)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        let product = repo.delete(5).await.unwrap();
        assert_eq!(product.id, 5);
        assert_eq!(product.name, "Chair");
    }

    #[tokio::test]
    async fn test_delete_missing_row() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<entity::Model>::new()]),
        );

        assert!(matches!(repo.delete(5).await, Err(DbErr::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_zero_rows_affected_is_not_found() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model(5, "Chair", 75.0)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }]),
        );

        assert!(matches!(repo.delete(5).await, Err(DbErr::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn test_connection_errors_pass_through() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("connection reset".to_string())]),
        );

        assert!(matches!(
            repo.find_unique_or_throw(1).await,
            Err(DbErr::Custom(_))
        ));
    }

    #[tokio::test]
    async fn test_ping_failure_is_reported() {
        let repo = repo(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("connection reset".to_string())]),
        );

        assert!(repo.ping().await.is_err());
    }
}
