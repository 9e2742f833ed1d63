//! In-process storage with the same unit-of-work contract as PostgreSQL.
//!
//! Committed state lives in one [`InMemoryStore`] shared by every unit of
//! work. Inside a transaction writes are staged per unit and applied to the
//! store in one step on commit; reads inside the transaction see the staged
//! writes on top of committed state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::domain::courier::Courier;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::repositories::{
    AggregateRef, CourierRepository, CourierView, OrderRepository, OrderView, ReadModel,
    UnitOfWork, UnitOfWorkFactory,
};
use crate::error::AppError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default)]
struct Tables {
    // Insertion order doubles as creation order.
    orders: Vec<Order>,
    couriers: Vec<Courier>,
}

#[derive(Debug, Clone)]
enum Write {
    AddOrder(Order),
    UpdateOrder(Order),
    AddCourier(Courier),
    UpdateCourier(Courier),
}

impl Tables {
    fn apply(&mut self, write: Write) -> Result<(), AppError> {
        match write {
            Write::AddOrder(order) => {
                if self.orders.iter().any(|o| o.id() == order.id()) {
                    return Err(duplicate("order_id", order.id()));
                }
                self.orders.push(order);
            }
            Write::UpdateOrder(order) => {
                let slot = self
                    .orders
                    .iter_mut()
                    .find(|o| o.id() == order.id())
                    .ok_or_else(|| order_not_found(order.id()))?;
                *slot = order;
            }
            Write::AddCourier(courier) => {
                if self.couriers.iter().any(|c| c.id() == courier.id()) {
                    return Err(duplicate("courier_id", courier.id()));
                }
                self.couriers.push(courier);
            }
            Write::UpdateCourier(courier) => {
                let slot = self
                    .couriers
                    .iter_mut()
                    .find(|c| c.id() == courier.id())
                    .ok_or_else(|| courier_not_found(courier.id()))?;
                ensure_places_free(slot, &courier)?;
                *slot = courier;
            }
        }
        Ok(())
    }
}

/// A stored place that holds an order may only be cleared or keep it.
fn ensure_places_free(stored: &Courier, next: &Courier) -> Result<(), AppError> {
    for place in next.storage_places() {
        let Some(held) = stored
            .storage_places()
            .iter()
            .find(|p| p.id() == place.id())
            .and_then(|p| p.order_id())
        else {
            continue;
        };
        if place.order_id().is_some_and(|order_id| order_id != held) {
            return Err(AppError::conflict(
                "Storage place already holds another order",
                json!({
                    "reason": "storage_place_taken",
                    "courier_id": next.id(),
                    "storage_place_id": place.id(),
                }),
            ));
        }
    }
    Ok(())
}

fn duplicate(field: &str, id: Uuid) -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "field": field, "id": id }),
    )
}

fn order_not_found(id: Uuid) -> AppError {
    AppError::not_found("Order not found", json!({ "order_id": id }))
}

fn courier_not_found(id: Uuid) -> AppError {
    AppError::not_found("Courier not found", json!({ "courier_id": id }))
}

/// Committed state, cheap to clone and share.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnitOfWorkFactory for InMemoryStore {
    fn create(&self) -> Box<dyn UnitOfWork> {
        Box::new(MemoryUnitOfWork::new(self.clone()))
    }
}

#[async_trait]
impl ReadModel for InMemoryStore {
    async fn list_couriers(&self) -> Result<Vec<CourierView>, AppError> {
        let tables = lock(&self.tables);
        let mut couriers: Vec<CourierView> = tables
            .couriers
            .iter()
            .map(|c| CourierView {
                id: c.id(),
                name: c.name().to_string(),
                location: c.location(),
            })
            .collect();
        couriers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(couriers)
    }

    async fn list_active_orders(&self) -> Result<Vec<OrderView>, AppError> {
        let tables = lock(&self.tables);
        Ok(tables
            .orders
            .iter()
            .filter(|o| o.status() != OrderStatus::Completed)
            .map(|o| OrderView {
                id: o.id(),
                location: o.location(),
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Default)]
struct Session {
    staged: Option<Vec<Write>>,
    tracked: Vec<AggregateRef>,
}

/// What repositories of one unit of work share.
#[derive(Clone)]
struct Handle {
    store: InMemoryStore,
    session: Arc<Mutex<Session>>,
}

impl Handle {
    fn write(&self, write: Write, aggregate: AggregateRef) -> Result<(), AppError> {
        let mut session = lock(&self.session);
        let mut tables = lock(&self.store.tables);

        match session.staged.as_mut() {
            Some(staged) => {
                // Fail now, like the database would, rather than at commit.
                let mut view = tables.clone();
                for earlier in staged.iter() {
                    view.apply(earlier.clone())?;
                }
                view.apply(write.clone())?;
                staged.push(write);
            }
            None => tables.apply(write)?,
        }

        session.tracked.push(aggregate);
        Ok(())
    }

    fn read<T>(&self, query: impl FnOnce(&Tables) -> T) -> Result<T, AppError> {
        let session = lock(&self.session);
        let tables = lock(&self.store.tables);

        match session.staged.as_ref() {
            Some(staged) if !staged.is_empty() => {
                let mut view = tables.clone();
                for write in staged {
                    view.apply(write.clone())?;
                }
                Ok(query(&view))
            }
            _ => Ok(query(&tables)),
        }
    }
}

pub struct MemoryOrderRepository {
    handle: Handle,
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn add(&mut self, order: &Order) -> Result<(), AppError> {
        self.handle
            .write(Write::AddOrder(order.clone()), AggregateRef::Order(order.id()))
    }

    async fn update(&mut self, order: &Order) -> Result<(), AppError> {
        self.handle
            .write(Write::UpdateOrder(order.clone()), AggregateRef::Order(order.id()))
    }

    async fn get(&mut self, id: Uuid) -> Result<Order, AppError> {
        self.handle
            .read(|t| t.orders.iter().find(|o| o.id() == id).cloned())?
            .ok_or_else(|| order_not_found(id))
    }

    async fn get_first_in_created_status(&mut self) -> Result<Order, AppError> {
        self.handle
            .read(|t| {
                t.orders
                    .iter()
                    .find(|o| o.status() == OrderStatus::Created)
                    .cloned()
            })?
            .ok_or_else(|| {
                AppError::not_found(
                    "No order in created status",
                    json!({ "status": OrderStatus::Created.as_str() }),
                )
            })
    }

    async fn get_all_in_assigned_status(&mut self) -> Result<Vec<Order>, AppError> {
        let orders: Vec<Order> = self.handle.read(|t| {
            t.orders
                .iter()
                .filter(|o| o.status() == OrderStatus::Assigned)
                .cloned()
                .collect()
        })?;
        if orders.is_empty() {
            return Err(AppError::not_found(
                "No order in assigned status",
                json!({ "status": OrderStatus::Assigned.as_str() }),
            ));
        }
        Ok(orders)
    }
}

pub struct MemoryCourierRepository {
    handle: Handle,
}

#[async_trait]
impl CourierRepository for MemoryCourierRepository {
    async fn add(&mut self, courier: &Courier) -> Result<(), AppError> {
        self.handle.write(
            Write::AddCourier(courier.clone()),
            AggregateRef::Courier(courier.id()),
        )
    }

    async fn update(&mut self, courier: &Courier) -> Result<(), AppError> {
        self.handle.write(
            Write::UpdateCourier(courier.clone()),
            AggregateRef::Courier(courier.id()),
        )
    }

    async fn get(&mut self, id: Uuid) -> Result<Courier, AppError> {
        self.handle
            .read(|t| t.couriers.iter().find(|c| c.id() == id).cloned())?
            .ok_or_else(|| courier_not_found(id))
    }

    async fn get_all_free(&mut self) -> Result<Vec<Courier>, AppError> {
        let mut couriers: Vec<Courier> = self.handle.read(|t| {
            t.couriers
                .iter()
                .filter(|c| c.is_free())
                .cloned()
                .collect()
        })?;
        if couriers.is_empty() {
            return Err(AppError::not_found("No free courier", json!({})));
        }
        couriers.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        Ok(couriers)
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct MemoryUnitOfWork {
    handle: Handle,
    orders: MemoryOrderRepository,
    couriers: MemoryCourierRepository,
}

impl MemoryUnitOfWork {
    pub fn new(store: InMemoryStore) -> Self {
        let handle = Handle {
            store,
            session: Arc::default(),
        };
        Self {
            orders: MemoryOrderRepository {
                handle: handle.clone(),
            },
            couriers: MemoryCourierRepository {
                handle: handle.clone(),
            },
            handle,
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn begin(&mut self) -> Result<(), AppError> {
        let mut session = lock(&self.handle.session);
        if session.staged.is_some() {
            return Err(AppError::conflict(
                "Transaction already started",
                json!({ "reason": "transaction_open" }),
            ));
        }
        session.staged = Some(Vec::new());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        let mut session = lock(&self.handle.session);
        let staged = session.staged.take().ok_or_else(|| {
            AppError::bad_request(
                "No transaction to commit",
                json!({ "reason": "transaction_not_started" }),
            )
        })?;
        session.tracked.clear();

        let mut tables = lock(&self.handle.store.tables);
        let mut next = tables.clone();
        for write in staged {
            next.apply(write)?;
        }
        *tables = next;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        let mut session = lock(&self.handle.session);
        session.staged = None;
        session.tracked.clear();
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        lock(&self.handle.session).staged.is_some()
    }

    fn track(&mut self, aggregate: AggregateRef) {
        lock(&self.handle.session).tracked.push(aggregate);
    }

    fn tracked(&self) -> Vec<AggregateRef> {
        lock(&self.handle.session).tracked.clone()
    }

    fn orders(&mut self) -> &mut dyn OrderRepository {
        &mut self.orders
    }

    fn couriers(&mut self) -> &mut dyn CourierRepository {
        &mut self.couriers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kernel::Location;

    fn order() -> Order {
        Order::new(Uuid::new_v4(), Location::new(2, 2).unwrap(), 3).unwrap()
    }

    fn courier(name: &str) -> Courier {
        let mut courier = Courier::new(name, 1, Location::new(1, 1).unwrap()).unwrap();
        courier.add_storage_place("bag", 10).unwrap();
        courier
    }

    #[tokio::test]
    async fn test_write_without_transaction_is_visible() {
        let store = InMemoryStore::new();
        let o = order();

        store.create().orders().add(&o).await.unwrap();

        let loaded = store.create().orders().get(o.id()).await.unwrap();
        assert_eq!(loaded, o);
    }

    #[tokio::test]
    async fn test_commit_applies_staged_writes() {
        let store = InMemoryStore::new();
        let o = order();
        let c = courier("Ann");

        let mut uow = store.create();
        uow.begin().await.unwrap();
        uow.orders().add(&o).await.unwrap();
        uow.couriers().add(&c).await.unwrap();

        assert!(uow.in_transaction());
        assert_eq!(
            uow.tracked(),
            vec![AggregateRef::Order(o.id()), AggregateRef::Courier(c.id())]
        );
        // Own writes are visible inside the transaction, not outside.
        assert!(uow.orders().get(o.id()).await.is_ok());
        assert!(store.create().orders().get(o.id()).await.unwrap_err().is_not_found());

        uow.commit().await.unwrap();

        assert!(!uow.in_transaction());
        assert!(uow.tracked().is_empty());
        assert!(store.create().orders().get(o.id()).await.is_ok());
        assert!(store.create().couriers().get(c.id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let store = InMemoryStore::new();
        let o = order();

        let mut uow = store.create();
        uow.begin().await.unwrap();
        uow.orders().add(&o).await.unwrap();
        uow.rollback().await.unwrap();

        assert!(store.create().orders().get(o.id()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_drop_discards_staged_writes() {
        let store = InMemoryStore::new();
        let o = order();

        {
            let mut uow = store.create();
            uow.begin().await.unwrap();
            uow.orders().add(&o).await.unwrap();
        }

        assert!(store.list_active_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_errors() {
        let store = InMemoryStore::new();
        let o = order();
        let mut uow = store.create();

        assert!(uow.orders().update(&o).await.unwrap_err().is_not_found());
        uow.orders().add(&o).await.unwrap();
        assert!(matches!(
            uow.orders().add(&o).await.unwrap_err(),
            AppError::Conflict { .. }
        ));
    }

    #[tokio::test]
    async fn test_commit_and_begin_misuse() {
        let store = InMemoryStore::new();
        let mut uow = store.create();

        assert!(matches!(
            uow.commit().await.unwrap_err(),
            AppError::Validation { .. }
        ));
        uow.begin().await.unwrap();
        assert!(matches!(
            uow.begin().await.unwrap_err(),
            AppError::Conflict { .. }
        ));
    }

    #[tokio::test]
    async fn test_status_queries() {
        let store = InMemoryStore::new();
        let mut uow = store.create();
        let first = order();
        let second = order();
        uow.orders().add(&first).await.unwrap();
        uow.orders().add(&second).await.unwrap();

        assert!(
            uow.orders()
                .get_all_in_assigned_status()
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert_eq!(
            uow.orders().get_first_in_created_status().await.unwrap().id(),
            first.id()
        );

        let mut c = courier("Ann");
        let mut assigned = first.clone();
        c.take_order(&mut assigned).unwrap();
        uow.orders().update(&assigned).await.unwrap();
        uow.couriers().add(&c).await.unwrap();

        assert_eq!(
            uow.orders().get_first_in_created_status().await.unwrap().id(),
            second.id()
        );
        assert_eq!(uow.orders().get_all_in_assigned_status().await.unwrap().len(), 1);
        assert!(uow.couriers().get_all_free().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_free_couriers_sorted_by_name() {
        let store = InMemoryStore::new();
        let mut uow = store.create();
        uow.couriers().add(&courier("Zoe")).await.unwrap();
        uow.couriers().add(&courier("Ann")).await.unwrap();

        let free = uow.couriers().get_all_free().await.unwrap();

        let names: Vec<&str> = free.iter().map(Courier::name).collect();
        assert_eq!(names, vec!["Ann", "Zoe"]);
    }

    #[tokio::test]
    async fn test_read_model_hides_completed_orders() {
        let store = InMemoryStore::new();
        let mut uow = store.create();
        let mut c = courier("Ann");
        let mut done = order();
        let open = order();
        c.take_order(&mut done).unwrap();
        c.complete_order(&mut done).unwrap();
        uow.orders().add(&done).await.unwrap();
        uow.orders().add(&open).await.unwrap();
        uow.couriers().add(&c).await.unwrap();

        let orders = store.list_active_orders().await.unwrap();
        let couriers = store.list_couriers().await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, open.id());
        assert_eq!(couriers.len(), 1);
        assert_eq!(couriers[0].name, "Ann");
    }

    #[tokio::test]
    async fn test_stale_courier_cannot_overwrite_stored_order() {
        let store = InMemoryStore::new();
        let c = courier("Ann");
        store.create().couriers().add(&c).await.unwrap();

        let mut first = store.create().couriers().get(c.id()).await.unwrap();
        let mut stale = store.create().couriers().get(c.id()).await.unwrap();
        let mut a = order();
        let mut b = order();
        first.take_order(&mut a).unwrap();
        stale.take_order(&mut b).unwrap();

        store.create().couriers().update(&first).await.unwrap();

        let mut uow = store.create();
        uow.begin().await.unwrap();
        let err = uow.couriers().update(&stale).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.reason(), Some("storage_place_taken"));
        uow.rollback().await.unwrap();

        let stored = store.create().couriers().get(c.id()).await.unwrap();
        assert_eq!(stored.storage_places()[0].order_id(), Some(a.id()));
    }
}
