//! Stateless domain services.

use crate::domain::courier::{Courier, OrderPlacement};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};

/// Matches a pending order with the courier that can reach it soonest.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderDispatcher;

impl OrderDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Picks the best courier for `order` and hands the order to it.
    ///
    /// Couriers that cannot hold the order are skipped. Among the rest the one
    /// with the smallest [`Courier::calculate_time_to_location`] wins; on a tie
    /// the courier that comes first in `couriers` is kept.
    ///
    /// On success the order is `Assigned` to the returned courier and sits in
    /// the storage place named by the returned [`OrderPlacement`]. Persisting
    /// both aggregates is up to the caller.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Required`] if `couriers` is empty
    /// - [`DomainError::SuitableCourierNotFound`] if no courier can take the order
    /// - [`DomainError::AlreadyAssigned`] if the order is no longer `Created`
    ///
    /// Nothing is modified on error.
    pub fn dispatch<'a>(
        &self,
        order: &mut Order,
        couriers: &'a mut [Courier],
    ) -> Result<(&'a Courier, OrderPlacement), DomainError> {
        if couriers.is_empty() {
            return Err(DomainError::Required("couriers"));
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, courier) in couriers.iter().enumerate() {
            if !courier.can_take_order(order)? {
                continue;
            }
            let time = courier.calculate_time_to_location(order.location())?;
            if best.is_none_or(|(_, best_time)| time < best_time) {
                best = Some((index, time));
            }
        }

        let (index, time) = best.ok_or(DomainError::SuitableCourierNotFound)?;

        // The order may have been picked up since it was loaded.
        if order.status() != OrderStatus::Created {
            return Err(DomainError::AlreadyAssigned);
        }

        let courier = &mut couriers[index];
        let placement = courier.take_order(order)?;
        tracing::debug!(
            order_id = %order.id(),
            courier_id = %courier.id(),
            storage_place_id = %placement.storage_place_id,
            time,
            "order dispatched"
        );

        Ok((&couriers[index], placement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kernel::Location;
    use uuid::Uuid;

    fn loc(x: u8, y: u8) -> Location {
        Location::new(x, y).unwrap()
    }

    fn courier_at(name: &str, location: Location, speed: i32, volume: i32) -> Courier {
        let mut courier = Courier::new(name, speed, location).unwrap();
        courier.add_storage_place("Bag", volume).unwrap();
        courier
    }

    fn order_at(location: Location, volume: i32) -> Order {
        Order::new(Uuid::new_v4(), location, volume).unwrap()
    }

    #[test]
    fn test_dispatch_picks_fastest_courier() {
        let mut order = order_at(loc(5, 5), 3);
        let mut couriers = vec![
            courier_at("far", loc(10, 10), 1, 10),
            courier_at("near", loc(5, 6), 1, 10),
            courier_at("fast", loc(1, 1), 10, 10),
        ];

        let (chosen, _) = OrderDispatcher::new()
            .dispatch(&mut order, &mut couriers)
            .unwrap();

        assert_eq!(chosen.name(), "fast");
        assert_eq!(order.status(), OrderStatus::Assigned);
        assert_eq!(order.courier_id(), Some(couriers[2].id()));
        assert!(!couriers[2].is_free());
        assert!(couriers[0].is_free());
        assert!(couriers[1].is_free());
    }

    // C1 needs 5 ticks, C2 and C3 need 3 each: C2 wins, never C3.
    #[test]
    fn test_dispatch_tie_goes_to_first_candidate() {
        let target = loc(1, 1);
        let mut order = order_at(target, 1);
        let mut couriers = vec![
            courier_at("c1", loc(6, 1), 1, 5),
            courier_at("c2", loc(4, 1), 1, 5),
            courier_at("c3", loc(1, 4), 1, 5),
        ];

        let (chosen, _) = OrderDispatcher::new()
            .dispatch(&mut order, &mut couriers)
            .unwrap();

        assert_eq!(chosen.name(), "c2");
        assert!(couriers[2].is_free());
    }

    #[test]
    fn test_dispatch_skips_couriers_without_room() {
        let mut order = order_at(loc(5, 5), 6);
        let mut couriers = vec![
            courier_at("small", loc(5, 5), 5, 3),
            courier_at("big", loc(1, 1), 1, 8),
        ];

        let (chosen, _) = OrderDispatcher::new()
            .dispatch(&mut order, &mut couriers)
            .unwrap();

        assert_eq!(chosen.name(), "big");
    }

    #[test]
    fn test_dispatch_without_couriers() {
        let mut order = order_at(loc(5, 5), 1);
        let mut couriers: Vec<Courier> = Vec::new();

        assert_eq!(
            OrderDispatcher::new()
                .dispatch(&mut order, &mut couriers)
                .unwrap_err(),
            DomainError::Required("couriers")
        );
        assert_eq!(order.status(), OrderStatus::Created);
    }

    #[test]
    fn test_dispatch_when_nobody_fits() {
        let mut order = order_at(loc(5, 5), 9);
        let mut couriers = vec![
            courier_at("a", loc(1, 1), 2, 3),
            Courier::new("no bag", 2, loc(2, 2)).unwrap(),
        ];

        let err = OrderDispatcher::new()
            .dispatch(&mut order, &mut couriers)
            .unwrap_err();

        assert_eq!(err, DomainError::SuitableCourierNotFound);
        assert_eq!(order.status(), OrderStatus::Created);
        assert!(order.courier_id().is_none());
        assert!(couriers.iter().all(Courier::is_free));
    }

    #[test]
    fn test_dispatch_stale_order() {
        let mut order = order_at(loc(5, 5), 1);
        order.assign(Uuid::new_v4()).unwrap();
        let mut couriers = vec![courier_at("a", loc(1, 1), 2, 3)];

        let err = OrderDispatcher::new()
            .dispatch(&mut order, &mut couriers)
            .unwrap_err();

        assert_eq!(err, DomainError::AlreadyAssigned);
        assert!(couriers[0].is_free());
    }
}
