//! Movement tick: advance every courier with an assigned order by one step.

use std::sync::Arc;

use super::commit_or_rollback;
use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::repositories::{UnitOfWork, UnitOfWorkFactory};
use crate::error::AppError;

/// What one movement tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveReport {
    pub moved: usize,
    pub completed: usize,
}

pub struct MoveCouriersHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl MoveCouriersHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    /// Moves the courier of each assigned order one step towards it and
    /// completes the orders whose courier arrived.
    ///
    /// The whole batch is committed once. With no assigned orders this is a
    /// no-op returning an empty report.
    ///
    /// # Errors
    ///
    /// Any storage or domain error aborts the batch; nothing is persisted then.
    #[tracing::instrument(skip(self))]
    pub async fn handle(&self) -> Result<MoveReport, AppError> {
        let mut uow = self.uow_factory.create();

        let orders = match uow.orders().get_all_in_assigned_status().await {
            Ok(orders) => orders,
            Err(err) if err.is_not_found() => {
                tracing::debug!("no assigned orders");
                return Ok(MoveReport::default());
            }
            Err(err) => return Err(err),
        };

        uow.begin().await?;
        let mut report = MoveReport::default();
        let written = advance(uow.as_mut(), orders, &mut report).await;
        commit_or_rollback(uow.as_mut(), written).await?;

        tracing::debug!(moved = report.moved, completed = report.completed, "couriers moved");
        Ok(report)
    }
}

async fn advance(
    uow: &mut dyn UnitOfWork,
    orders: Vec<Order>,
    report: &mut MoveReport,
) -> Result<(), AppError> {
    for mut order in orders {
        let Some(courier_id) = order.courier_id() else {
            tracing::error!(order_id = %order.id(), "assigned order without courier");
            return Err(DomainError::NotAssigned.into());
        };

        let mut courier = uow.couriers().get(courier_id).await?;
        courier.move_towards(order.location())?;
        report.moved += 1;

        if courier.location() == order.location() {
            courier.complete_order(&mut order)?;
            report.completed += 1;
            tracing::info!(
                order_id = %order.id(),
                courier_id = %courier.id(),
                "order delivered"
            );
        }

        uow.orders().update(&order).await?;
        uow.couriers().update(&courier).await?;
    }
    Ok(())
}
