//! PostgreSQL implementation of the order repository.

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use super::{SharedSession, Tracked, location_from_row, track};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::repositories::{AggregateRef, OrderRepository};
use crate::error::AppError;

const SELECT_ORDER: &str = r#"
    SELECT id, courier_id, location_x, location_y, volume, status
    FROM orders
"#;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    courier_id: Option<Uuid>,
    location_x: i16,
    location_y: i16,
    volume: i32,
    status: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let location = location_from_row(row.location_x, row.location_y)?;
        let status: OrderStatus = row.status.parse().map_err(|_| {
            AppError::internal(
                "Corrupt order status in storage",
                json!({ "order_id": row.id, "status": row.status }),
            )
        })?;
        Ok(Order::restore(
            row.id,
            row.courier_id,
            location,
            row.volume,
            status,
        ))
    }
}

/// Order storage in the `orders` table.
pub struct PgOrderRepository {
    session: SharedSession,
    tracked: Tracked,
}

impl PgOrderRepository {
    pub(crate) fn new(session: SharedSession, tracked: Tracked) -> Self {
        Self { session, tracked }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn add(&mut self, order: &Order) -> Result<(), AppError> {
        let mut session = self.session.lock().await;
        let mut scope = session.writer().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, courier_id, location_x, location_y, volume, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id())
        .bind(order.courier_id())
        .bind(i16::from(order.location().x()))
        .bind(i16::from(order.location().y()))
        .bind(order.volume())
        .bind(order.status().as_str())
        .execute(scope.conn())
        .await?;

        scope.finish().await?;
        track(&self.tracked, AggregateRef::Order(order.id()));
        Ok(())
    }

    async fn update(&mut self, order: &Order) -> Result<(), AppError> {
        let mut session = self.session.lock().await;
        let mut scope = session.writer().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET courier_id = $2, location_x = $3, location_y = $4, volume = $5, status = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id())
        .bind(order.courier_id())
        .bind(i16::from(order.location().x()))
        .bind(i16::from(order.location().y()))
        .bind(order.volume())
        .bind(order.status().as_str())
        .execute(scope.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Order not found",
                json!({ "order_id": order.id() }),
            ));
        }

        scope.finish().await?;
        track(&self.tracked, AggregateRef::Order(order.id()));
        Ok(())
    }

    async fn get(&mut self, id: Uuid) -> Result<Order, AppError> {
        let mut session = self.session.lock().await;
        let mut scope = session.reader().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(scope.conn())
            .await?;

        row.ok_or_else(|| AppError::not_found("Order not found", json!({ "order_id": id })))?
            .try_into()
    }

    /// Locks the returned row until the surrounding transaction ends; rows
    /// locked by another transaction are skipped.
    async fn get_first_in_created_status(&mut self) -> Result<Order, AppError> {
        let mut session = self.session.lock().await;
        let mut scope = session.reader().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} WHERE status = $1 ORDER BY created_at, id LIMIT 1 FOR UPDATE SKIP LOCKED"
        ))
        .bind(OrderStatus::Created.as_str())
        .fetch_optional(scope.conn())
        .await?;

        row.ok_or_else(|| {
            AppError::not_found(
                "No order in created status",
                json!({ "status": OrderStatus::Created.as_str() }),
            )
        })?
        .try_into()
    }

    async fn get_all_in_assigned_status(&mut self) -> Result<Vec<Order>, AppError> {
        let mut session = self.session.lock().await;
        let mut scope = session.reader().await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} WHERE status = $1 ORDER BY created_at, id"
        ))
        .bind(OrderStatus::Assigned.as_str())
        .fetch_all(scope.conn())
        .await?;

        if rows.is_empty() {
            return Err(AppError::not_found(
                "No order in assigned status",
                json!({ "status": OrderStatus::Assigned.as_str() }),
            ));
        }

        rows.into_iter().map(Order::try_from).collect()
    }
}
