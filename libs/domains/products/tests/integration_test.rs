//! Integration tests for Products domain
//!
//! These run against a real PostgreSQL started by testcontainers. They need a
//! Docker daemon, so they are ignored by default:
//!
//! ```text
//! cargo test -p domain_products --test integration_test -- --ignored
//! ```

use domain_products::*;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

async fn setup() -> (TestDatabase, ProductService<PgProductRepository>) {
    let db = TestDatabase::with_entity(domain_products::entity::Entity).await;
    let service = ProductService::new(PgProductRepository::new(db.connection()));
    (db, service)
}

fn input(builder: &TestDataBuilder, suffix: &str, index: u64) -> CreateProduct {
    CreateProduct {
        name: builder.name("product", suffix),
        price: builder.price(index),
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_create_and_find_one() {
    let (_db, service) = setup().await;
    let builder = TestDataBuilder::from_test_name("create_and_find_one");

    let created = service.create(input(&builder, "main", 0)).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.name, builder.name("product", "main"));
    assert_close(created.price, builder.price(0), "price");

    let found = service.find_one(created.id).await.unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.name, created.name);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_find_one_missing_is_not_found() {
    let (_db, service) = setup().await;

    assert!(matches!(
        service.find_one(12345).await,
        Err(ProductError::NotFound)
    ));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_pagination_over_25_rows() {
    let (_db, service) = setup().await;
    let builder = TestDataBuilder::from_test_name("pagination");

    for i in 0..25 {
        service
            .create(input(&builder, &i.to_string(), i))
            .await
            .unwrap();
    }

    let page = service.find_all(Pagination::new(3, 10)).await.unwrap();
    let ids: Vec<i32> = page.data.iter().map(|p| p.id).collect();

    assert_eq!(ids, vec![21, 22, 23, 24, 25]);
    assert_ascending(&ids, "third page");
    assert_eq!(
        page.meta,
        PageMeta {
            page: 3,
            limit: 10,
            total: 25,
            last_page: 3
        }
    );
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_update_changes_only_supplied_field() {
    let (_db, service) = setup().await;
    let builder = TestDataBuilder::from_test_name("update_partial");

    let created = service.create(input(&builder, "main", 0)).await.unwrap();
    let updated = service
        .update(
            created.id,
            UpdateProduct {
                price: Some(99.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, created.name);
    assert_close(updated.price, 99.0, "price");
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_update_missing_is_not_found() {
    let (_db, service) = setup().await;

    let result = service
        .update(
            777,
            UpdateProduct {
                name: Some("ghost".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(ProductError::NotFound)));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_remove_twice() {
    let (_db, service) = setup().await;
    let builder = TestDataBuilder::from_test_name("remove_twice");

    let created = service.create(input(&builder, "main", 0)).await.unwrap();

    let removed = service.remove(created.id).await.unwrap();
    assert_eq!(removed.id, created.id);

    assert!(matches!(
        service.remove(created.id).await,
        Err(ProductError::NotFound)
    ));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_ping() {
    let (_db, service) = setup().await;
    service.ping().await.unwrap();
}
