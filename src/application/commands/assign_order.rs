//! Assignment tick: hand the oldest waiting order to the best free courier.

use std::sync::Arc;

use serde_json::json;

use super::commit_or_rollback;
use crate::domain::courier::OrderPlacement;
use crate::domain::repositories::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::services::OrderDispatcher;
use crate::error::AppError;

pub struct AssignOrderHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    dispatcher: OrderDispatcher,
}

impl AssignOrderHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            uow_factory,
            dispatcher: OrderDispatcher::new(),
        }
    }

    /// Runs one assignment.
    ///
    /// The order and the candidate couriers are read inside the transaction,
    /// so a storage backend can lock them until commit and concurrent runs
    /// never pick the same rows.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] with reason `no_available_orders`
    /// when nothing waits in `Created` status, `no_available_couriers` when no
    /// courier is free and `suitable_courier_not_found` when no free courier
    /// has room. Storage errors are propagated; nothing is persisted then.
    #[tracing::instrument(skip(self))]
    pub async fn handle(&self) -> Result<OrderPlacement, AppError> {
        let mut uow = self.uow_factory.create();

        uow.begin().await?;
        let assigned = self.assign(uow.as_mut()).await;
        let placement = commit_or_rollback(uow.as_mut(), assigned).await?;

        tracing::info!(
            order_id = %placement.order_id,
            courier_id = %placement.courier_id,
            storage_place_id = %placement.storage_place_id,
            "order assigned"
        );
        Ok(placement)
    }

    async fn assign(&self, uow: &mut dyn UnitOfWork) -> Result<OrderPlacement, AppError> {
        let mut order = match uow.orders().get_first_in_created_status().await {
            Ok(order) => order,
            Err(err) if err.is_not_found() => {
                return Err(AppError::unavailable(
                    "no available orders",
                    json!({ "reason": "no_available_orders" }),
                ));
            }
            Err(err) => return Err(err),
        };

        let mut couriers = match uow.couriers().get_all_free().await {
            Ok(couriers) => couriers,
            Err(err) if err.is_not_found() => {
                return Err(AppError::unavailable(
                    "no available couriers",
                    json!({ "reason": "no_available_couriers", "order_id": order.id() }),
                ));
            }
            Err(err) => return Err(err),
        };

        let (courier, placement) = self.dispatcher.dispatch(&mut order, &mut couriers)?;

        uow.orders().update(&order).await?;
        uow.couriers().update(courier).await?;
        Ok(placement)
    }
}
