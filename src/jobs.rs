//! Periodic triggers for the assignment and movement ticks.
//!
//! Each job runs its handler once per interval until the shutdown signal
//! fires. A tick that fails is logged and the next tick simply tries again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::application::commands::{AssignOrderHandler, MoveCouriersHandler};
use crate::error::AppError;

/// Logs the outcome of one tick.
///
/// `Unavailable` means there was nothing to do and is not a failure.
fn report_failure(job: &'static str, err: &AppError) {
    match err {
        AppError::Unavailable { .. } => {
            tracing::debug!(job, reason = err.reason().unwrap_or_default(), "nothing to do");
        }
        AppError::Internal { .. } => tracing::error!(job, error = %err, "tick failed"),
        _ => tracing::warn!(job, error = %err, details = %err.details(), "tick failed"),
    }
}

/// Runs one assignment tick.
pub async fn assign_tick(handler: &AssignOrderHandler) {
    if let Err(err) = handler.handle().await {
        report_failure("assign_orders", &err);
    }
}

/// Runs one movement tick.
pub async fn move_tick(handler: &MoveCouriersHandler) {
    match handler.handle().await {
        Ok(report) if report.completed > 0 => {
            tracing::info!(completed = report.completed, "deliveries completed");
        }
        Ok(_) => {}
        Err(err) => report_failure("move_couriers", &err),
    }
}

pub fn spawn_assign_job(
    handler: Arc<AssignOrderHandler>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_every("assign_orders", period, shutdown, || assign_tick(&handler)).await;
    })
}

pub fn spawn_move_job(
    handler: Arc<MoveCouriersHandler>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_every("move_couriers", period, shutdown, || move_tick(&handler)).await;
    })
}

async fn run_every<F, Fut>(
    job: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = time::interval(period);
    // A slow tick must not be followed by a burst of catch-up ticks.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(job, ?period, "job started");

    loop {
        tokio::select! {
            _ = interval.tick() => tick().await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!(job, "job stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::{
        CreateCourierCommand, CreateCourierHandler, CreateOrderCommand, CreateOrderHandler,
        DefaultStorage,
    };
    use crate::domain::order::OrderStatus;
    use crate::domain::repositories::UnitOfWorkFactory;
    use crate::infrastructure::geo::RandomGeoLocator;
    use crate::infrastructure::persistence::InMemoryStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_ticks_on_empty_store_do_not_fail() {
        let store = Arc::new(InMemoryStore::new());

        assign_tick(&AssignOrderHandler::new(store.clone())).await;
        move_tick(&MoveCouriersHandler::new(store)).await;
    }

    #[tokio::test]
    async fn test_jobs_assign_and_stop_on_shutdown() {
        let store = Arc::new(InMemoryStore::new());
        let order_id = Uuid::new_v4();
        CreateOrderHandler::new(store.clone(), Arc::new(RandomGeoLocator))
            .handle(CreateOrderCommand::new(order_id, "Main st 1", 2).unwrap())
            .await
            .unwrap();
        CreateCourierHandler::new(store.clone(), DefaultStorage::default())
            .handle(CreateCourierCommand::new("Ann", 1).unwrap())
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        let job = spawn_assign_job(
            Arc::new(AssignOrderHandler::new(store.clone())),
            Duration::from_millis(10),
            rx,
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        job.await.unwrap();

        let order = store.create().orders().get(order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Assigned);
    }

    #[tokio::test]
    async fn test_job_with_long_period_stops_on_shutdown() {
        let store = Arc::new(InMemoryStore::new());
        let (tx, rx) = watch::channel(false);
        let job = spawn_move_job(
            Arc::new(MoveCouriersHandler::new(store)),
            Duration::from_secs(24 * 60 * 60),
            rx,
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), job)
            .await
            .expect("job did not stop")
            .unwrap();
    }
}
