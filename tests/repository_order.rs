//! PostgreSQL order repository tests. Run with `cargo test -- --ignored`
//! and `DATABASE_URL` pointing at a server where test databases may be created.

use delivery::domain::kernel::Location;
use delivery::domain::order::{Order, OrderStatus};
use delivery::domain::repositories::{UnitOfWork, UnitOfWorkFactory};
use delivery::infrastructure::persistence::PgUnitOfWorkFactory;
use delivery::infrastructure::persistence::postgres::PgUnitOfWork;
use sqlx::PgPool;
use uuid::Uuid;

fn new_order(volume: i32) -> Order {
    Order::new(Uuid::new_v4(), Location::new(3, 4).unwrap(), volume).unwrap()
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_add_and_get(pool: PgPool) {
    let mut uow = PgUnitOfWork::new(pool);
    let order = new_order(5);

    uow.orders().add(&order).await.unwrap();
    let stored = uow.orders().get(order.id()).await.unwrap();

    assert_eq!(stored.id(), order.id());
    assert_eq!(stored.location(), order.location());
    assert_eq!(stored.volume(), 5);
    assert_eq!(stored.status(), OrderStatus::Created);
    assert_eq!(stored.courier_id(), None);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_get_missing_is_not_found(pool: PgPool) {
    let mut uow = PgUnitOfWork::new(pool);

    let err = uow.orders().get(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_add_conflicts(pool: PgPool) {
    let mut uow = PgUnitOfWork::new(pool);
    let order = new_order(1);

    uow.orders().add(&order).await.unwrap();
    let err = uow.orders().add(&order).await.unwrap_err();
    assert!(matches!(err, delivery::AppError::Conflict { .. }));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_persists_assignment(pool: PgPool) {
    let mut uow = PgUnitOfWork::new(pool);
    let mut order = new_order(2);
    uow.orders().add(&order).await.unwrap();

    let courier_id = Uuid::new_v4();
    order.assign(courier_id).unwrap();
    uow.orders().update(&order).await.unwrap();

    let stored = uow.orders().get(order.id()).await.unwrap();
    assert_eq!(stored.status(), OrderStatus::Assigned);
    assert_eq!(stored.courier_id(), Some(courier_id));

    let assigned = uow.orders().get_all_in_assigned_status().await.unwrap();
    assert_eq!(assigned.len(), 1);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_missing_is_not_found(pool: PgPool) {
    let mut uow = PgUnitOfWork::new(pool);

    let err = uow.orders().update(&new_order(1)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_first_created_is_oldest(pool: PgPool) {
    let mut uow = PgUnitOfWork::new(pool);
    let first = new_order(1);
    let second = new_order(1);
    uow.orders().add(&first).await.unwrap();
    uow.orders().add(&second).await.unwrap();

    let found = uow.orders().get_first_in_created_status().await.unwrap();
    assert_eq!(found.id(), first.id());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_empty_queries_are_not_found(pool: PgPool) {
    let mut uow = PgUnitOfWork::new(pool);

    assert!(
        uow.orders()
            .get_first_in_created_status()
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        uow.orders()
            .get_all_in_assigned_status()
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_rollback_discards_writes(pool: PgPool) {
    let factory = PgUnitOfWorkFactory::new(pool);
    let order = new_order(1);

    let mut uow = factory.create();
    uow.begin().await.unwrap();
    uow.orders().add(&order).await.unwrap();
    assert_eq!(uow.tracked().len(), 1);
    uow.rollback().await.unwrap();
    assert!(uow.tracked().is_empty());

    let err = factory.create().orders().get(order.id()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_commit_applies_writes(pool: PgPool) {
    let factory = PgUnitOfWorkFactory::new(pool);
    let order = new_order(1);

    let mut uow = factory.create();
    uow.begin().await.unwrap();
    assert!(uow.in_transaction());
    uow.orders().add(&order).await.unwrap();
    uow.commit().await.unwrap();
    assert!(!uow.in_transaction());

    assert!(factory.create().orders().get(order.id()).await.is_ok());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_created_order_locked_by_open_transaction_is_skipped(pool: PgPool) {
    let factory = PgUnitOfWorkFactory::new(pool);
    let older = new_order(1);
    let newer = new_order(1);
    factory.create().orders().add(&older).await.unwrap();
    factory.create().orders().add(&newer).await.unwrap();

    let mut first = factory.create();
    first.begin().await.unwrap();
    let taken = first.orders().get_first_in_created_status().await.unwrap();
    assert_eq!(taken.id(), older.id());

    let mut second = factory.create();
    second.begin().await.unwrap();
    let next = second.orders().get_first_in_created_status().await.unwrap();
    assert_eq!(next.id(), newer.id());

    second.rollback().await.unwrap();
    first.rollback().await.unwrap();
}
