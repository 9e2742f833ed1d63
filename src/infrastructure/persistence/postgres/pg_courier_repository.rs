//! PostgreSQL implementation of the courier repository.
//!
//! A courier spans two tables: `couriers` and `storage_places`, the latter
//! ordered by `position` so first-fit allocation sees places in the order they
//! were added.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{SharedSession, Tracked, location_from_row, track};
use crate::domain::courier::{Courier, StoragePlace};
use crate::domain::repositories::{AggregateRef, CourierRepository};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct CourierRow {
    id: Uuid,
    name: String,
    speed: i32,
    location_x: i16,
    location_y: i16,
}

#[derive(sqlx::FromRow)]
struct StoragePlaceRow {
    id: Uuid,
    courier_id: Uuid,
    name: String,
    total_volume: i32,
    order_id: Option<Uuid>,
}

impl From<StoragePlaceRow> for StoragePlace {
    fn from(row: StoragePlaceRow) -> Self {
        StoragePlace::restore(row.id, row.name, row.total_volume, row.order_id)
    }
}

/// Courier storage in the `couriers` and `storage_places` tables.
pub struct PgCourierRepository {
    session: SharedSession,
    tracked: Tracked,
}

impl PgCourierRepository {
    pub(crate) fn new(session: SharedSession, tracked: Tracked) -> Self {
        Self { session, tracked }
    }
}

#[async_trait]
impl CourierRepository for PgCourierRepository {
    async fn add(&mut self, courier: &Courier) -> Result<(), AppError> {
        let mut session = self.session.lock().await;
        let mut scope = session.writer().await?;

        sqlx::query(
            r#"
            INSERT INTO couriers (id, name, speed, location_x, location_y)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(courier.id())
        .bind(courier.name())
        .bind(courier.speed())
        .bind(i16::from(courier.location().x()))
        .bind(i16::from(courier.location().y()))
        .execute(scope.conn())
        .await?;

        save_storage_places(scope.conn(), courier).await?;

        scope.finish().await?;
        track(&self.tracked, AggregateRef::Courier(courier.id()));
        Ok(())
    }

    async fn update(&mut self, courier: &Courier) -> Result<(), AppError> {
        let mut session = self.session.lock().await;
        let mut scope = session.writer().await?;

        let result = sqlx::query(
            r#"
            UPDATE couriers
            SET name = $2, speed = $3, location_x = $4, location_y = $5
            WHERE id = $1
            "#,
        )
        .bind(courier.id())
        .bind(courier.name())
        .bind(courier.speed())
        .bind(i16::from(courier.location().x()))
        .bind(i16::from(courier.location().y()))
        .execute(scope.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Courier not found",
                json!({ "courier_id": courier.id() }),
            ));
        }

        save_storage_places(scope.conn(), courier).await?;

        scope.finish().await?;
        track(&self.tracked, AggregateRef::Courier(courier.id()));
        Ok(())
    }

    async fn get(&mut self, id: Uuid) -> Result<Courier, AppError> {
        let mut session = self.session.lock().await;
        let mut scope = session.reader().await?;

        let row = sqlx::query_as::<_, CourierRow>(
            "SELECT id, name, speed, location_x, location_y FROM couriers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(scope.conn())
        .await?
        .ok_or_else(|| AppError::not_found("Courier not found", json!({ "courier_id": id })))?;

        let mut couriers = assemble(scope.conn(), vec![row]).await?;
        couriers
            .pop()
            .ok_or_else(|| AppError::not_found("Courier not found", json!({ "courier_id": id })))
    }

    /// Locks the returned couriers until the surrounding transaction ends;
    /// couriers locked by another transaction are skipped.
    async fn get_all_free(&mut self) -> Result<Vec<Courier>, AppError> {
        let mut session = self.session.lock().await;
        let mut scope = session.reader().await?;

        let rows = sqlx::query_as::<_, CourierRow>(
            r#"
            SELECT c.id, c.name, c.speed, c.location_x, c.location_y
            FROM couriers c
            WHERE NOT EXISTS (
                SELECT 1 FROM storage_places s
                WHERE s.courier_id = c.id AND s.order_id IS NOT NULL
            )
            ORDER BY c.name, c.id
            FOR UPDATE OF c SKIP LOCKED
            "#,
        )
        .fetch_all(scope.conn())
        .await?;

        if rows.is_empty() {
            return Err(AppError::not_found("No free courier", json!({})));
        }

        assemble(scope.conn(), rows).await
    }
}

/// Upserts every storage place of `courier`, keeping their order in `position`.
///
/// A place that holds an order can only be cleared or keep that order; storing
/// a different one over it is a [`AppError::Conflict`].
async fn save_storage_places(conn: &mut PgConnection, courier: &Courier) -> Result<(), AppError> {
    for (position, place) in courier.storage_places().iter().enumerate() {
        let position = i32::try_from(position).map_err(|_| {
            AppError::internal(
                "Too many storage places",
                json!({ "courier_id": courier.id() }),
            )
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO storage_places (id, courier_id, name, total_volume, order_id, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                total_volume = EXCLUDED.total_volume,
                order_id = EXCLUDED.order_id,
                position = EXCLUDED.position
            WHERE storage_places.order_id IS NULL
               OR EXCLUDED.order_id IS NULL
               OR storage_places.order_id = EXCLUDED.order_id
            "#,
        )
        .bind(place.id())
        .bind(courier.id())
        .bind(place.name())
        .bind(place.total_volume())
        .bind(place.order_id())
        .bind(position)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(storage_place_taken(courier.id(), place.id()));
        }
    }
    Ok(())
}

fn storage_place_taken(courier_id: Uuid, storage_place_id: Uuid) -> AppError {
    AppError::conflict(
        "Storage place already holds another order",
        json!({
            "reason": "storage_place_taken",
            "courier_id": courier_id,
            "storage_place_id": storage_place_id,
        }),
    )
}

/// Loads storage places for `rows` and rebuilds the aggregates, keeping the
/// order of `rows`.
async fn assemble(conn: &mut PgConnection, rows: Vec<CourierRow>) -> Result<Vec<Courier>, AppError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

    let places = sqlx::query_as::<_, StoragePlaceRow>(
        r#"
        SELECT id, courier_id, name, total_volume, order_id
        FROM storage_places
        WHERE courier_id = ANY($1)
        ORDER BY courier_id, position
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_courier: HashMap<Uuid, Vec<StoragePlace>> = HashMap::new();
    for place in places {
        by_courier
            .entry(place.courier_id)
            .or_default()
            .push(place.into());
    }

    rows.into_iter()
        .map(|row| {
            let location = location_from_row(row.location_x, row.location_y)?;
            let places = by_courier.remove(&row.id).unwrap_or_default();
            Ok(Courier::restore(row.id, row.name, row.speed, location, places))
        })
        .collect()
}
