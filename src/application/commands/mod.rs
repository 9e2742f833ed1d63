//! Write-side use cases.
//!
//! Each handler creates its own [`UnitOfWork`] per call, loads the aggregates
//! it needs, runs domain logic and persists the result. Writes that must land
//! together go between `begin` and `commit`; any failure in between rolls the
//! whole batch back.

pub mod assign_order;
pub mod create_courier;
pub mod create_order;
pub mod move_couriers;

pub use assign_order::AssignOrderHandler;
pub use create_courier::{CreateCourierCommand, CreateCourierHandler, DefaultStorage};
pub use create_order::{CreateOrderCommand, CreateOrderHandler};
pub use move_couriers::{MoveCouriersHandler, MoveReport};

use crate::domain::repositories::UnitOfWork;
use crate::error::AppError;

/// Commits `uow` if every step succeeded, otherwise rolls it back and
/// returns the original error.
pub(crate) async fn commit_or_rollback<T>(
    uow: &mut dyn UnitOfWork,
    outcome: Result<T, AppError>,
) -> Result<T, AppError> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Hand-rolled unit of work around `mockall` repositories.

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::domain::repositories::{
        AggregateRef, CourierRepository, MockCourierRepository, MockOrderRepository,
        OrderRepository, UnitOfWork, UnitOfWorkFactory,
    };
    use crate::error::AppError;

    /// Transaction calls recorded by a [`StubUnitOfWork`].
    pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

    pub struct StubUnitOfWork {
        orders: MockOrderRepository,
        couriers: MockCourierRepository,
        open: bool,
        tracked: Vec<AggregateRef>,
        calls: CallLog,
        fail_commit: bool,
    }

    impl StubUnitOfWork {
        pub fn new(orders: MockOrderRepository, couriers: MockCourierRepository) -> Self {
            Self {
                orders,
                couriers,
                open: false,
                tracked: Vec::new(),
                calls: Arc::default(),
                fail_commit: false,
            }
        }

        pub fn failing_commit(mut self) -> Self {
            self.fail_commit = true;
            self
        }

        pub fn calls(&self) -> CallLog {
            Arc::clone(&self.calls)
        }

        fn record(&self, call: &'static str) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }
    }

    #[async_trait]
    impl UnitOfWork for StubUnitOfWork {
        async fn begin(&mut self) -> Result<(), AppError> {
            self.record("begin");
            self.open = true;
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), AppError> {
            self.record("commit");
            self.open = false;
            self.tracked.clear();
            if self.fail_commit {
                return Err(AppError::internal("commit failed", json!({})));
            }
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), AppError> {
            self.record("rollback");
            self.open = false;
            self.tracked.clear();
            Ok(())
        }

        fn in_transaction(&self) -> bool {
            self.open
        }

        fn track(&mut self, aggregate: AggregateRef) {
            self.tracked.push(aggregate);
        }

        fn tracked(&self) -> Vec<AggregateRef> {
            self.tracked.clone()
        }

        fn orders(&mut self) -> &mut dyn OrderRepository {
            &mut self.orders
        }

        fn couriers(&mut self) -> &mut dyn CourierRepository {
            &mut self.couriers
        }
    }

    /// Hands out one prepared [`StubUnitOfWork`].
    pub struct StubFactory {
        unit: Mutex<Option<StubUnitOfWork>>,
    }

    impl StubFactory {
        pub fn new(unit: StubUnitOfWork) -> Arc<Self> {
            Arc::new(Self {
                unit: Mutex::new(Some(unit)),
            })
        }
    }

    impl UnitOfWorkFactory for StubFactory {
        fn create(&self) -> Box<dyn UnitOfWork> {
            let unit = self
                .unit
                .lock()
                .expect("stub factory lock poisoned")
                .take()
                .expect("stub unit of work already handed out");
            Box::new(unit)
        }
    }

    pub fn calls(log: &CallLog) -> Vec<&'static str> {
        log.lock().expect("call log lock poisoned").clone()
    }
}
