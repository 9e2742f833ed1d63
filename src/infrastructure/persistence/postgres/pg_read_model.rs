//! Listing queries straight off the pool.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::location_from_row;
use crate::domain::order::OrderStatus;
use crate::domain::repositories::{CourierView, OrderView, ReadModel};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct CourierViewRow {
    id: Uuid,
    name: String,
    location_x: i16,
    location_y: i16,
}

#[derive(sqlx::FromRow)]
struct OrderViewRow {
    id: Uuid,
    location_x: i16,
    location_y: i16,
}

pub struct PgReadModel {
    pool: PgPool,
}

impl PgReadModel {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadModel for PgReadModel {
    async fn list_couriers(&self) -> Result<Vec<CourierView>, AppError> {
        let rows = sqlx::query_as::<_, CourierViewRow>(
            "SELECT id, name, location_x, location_y FROM couriers ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CourierView {
                    id: row.id,
                    name: row.name,
                    location: location_from_row(row.location_x, row.location_y)?,
                })
            })
            .collect()
    }

    async fn list_active_orders(&self) -> Result<Vec<OrderView>, AppError> {
        let rows = sqlx::query_as::<_, OrderViewRow>(
            r#"
            SELECT id, location_x, location_y
            FROM orders
            WHERE status <> $1
            ORDER BY created_at, id
            "#,
        )
        .bind(OrderStatus::Completed.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderView {
                    id: row.id,
                    location: location_from_row(row.location_x, row.location_y)?,
                })
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
