use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::domain::order::{monitor_ordering, Order, OrderId, OrderStatus, Page};
use crate::ports::{OrderRepository, PortError};

const SERVICE: &str = "order_repository";

#[derive(Debug, Default)]
struct RepositoryState {
    last_id: i64,
    orders: BTreeMap<OrderId, Order>,
}

impl RepositoryState {
    fn insert_new(&mut self, mut order: Order) -> Order {
        self.last_id += 1;
        order.assign_id(OrderId(self.last_id));
        self.orders.insert(OrderId(self.last_id), order.clone());
        order
    }
}

/// Orders kept in a map keyed by id, with optimistic version checks.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    state: RwLock<RepositoryState>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an order exactly as given (status, timestamps, version), skipping
    /// the order number check. Used to load fixtures.
    pub async fn seed(&self, order: Order) -> Order {
        self.state.write().await.insert_new(order)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), PortError> {
    if cancel.is_cancelled() {
        return Err(PortError::Cancelled);
    }
    Ok(())
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn list_by_status(
        &self,
        status: OrderStatus,
        page: Page,
        cancel: &CancellationToken,
    ) -> Result<Vec<Order>, PortError> {
        ensure_active(cancel)?;
        let state = self.state.read().await;

        Ok(page.slice(
            state
                .orders
                .values()
                .filter(|order| order.status() == status)
                .cloned(),
        ))
    }

    async fn list_monitored(
        &self,
        page: Page,
        cancel: &CancellationToken,
    ) -> Result<Vec<Order>, PortError> {
        ensure_active(cancel)?;
        let state = self.state.read().await;

        let mut monitored: Vec<&Order> = state
            .orders
            .values()
            .filter(|order| order.status().is_monitored())
            .collect();
        // Ids break ties so pages stay stable between calls.
        monitored.sort_by(|a, b| {
            monitor_ordering((a.status(), a.created_at()), (b.status(), b.created_at()))
                .then_with(|| a.id().cmp(&b.id()))
        });

        Ok(page.slice(monitored.into_iter().cloned()))
    }

    async fn create(&self, order: Order, cancel: &CancellationToken) -> Result<Order, PortError> {
        ensure_active(cancel)?;
        let mut state = self.state.write().await;

        let number_in_use = state.orders.values().any(|stored| {
            stored.status().is_monitored() && stored.order_number() == order.order_number()
        });
        if number_in_use {
            return Err(PortError::DuplicateOrderNumber(order.order_number()));
        }

        let created = state.insert_new(order);
        tracing::debug!(
            order_id = ?created.id(),
            order_number = %created.order_number(),
            "Stored new order"
        );
        Ok(created)
    }

    async fn get_by_id(
        &self,
        id: OrderId,
        cancel: &CancellationToken,
    ) -> Result<Option<Order>, PortError> {
        ensure_active(cancel)?;
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn update(&self, mut order: Order, cancel: &CancellationToken) -> Result<Order, PortError> {
        ensure_active(cancel)?;
        let id = order
            .id()
            .ok_or_else(|| PortError::rejected(SERVICE, "cannot update an order that was never stored"))?;

        let mut state = self.state.write().await;
        let stored = state
            .orders
            .get(&id)
            .ok_or_else(|| PortError::rejected(SERVICE, format!("order {id} does not exist")))?;

        if stored.version() != order.version() {
            return Err(PortError::VersionConflict {
                id,
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.set_version(order.version() + 1);
        state.orders.insert(id, order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderItemRequest, OrderNumber, OrderRequest};
    use chrono::{Duration, Utc};
    use testresult::TestResult;

    fn new_order(number: u32) -> Order {
        Order::create(
            &OrderRequest::new(vec![OrderItemRequest::new("A", 1)]),
            &[],
            OrderNumber::new(number).unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() -> TestResult {
        let repository = InMemoryOrderRepository::new();
        let cancel = CancellationToken::new();

        let first = repository.create(new_order(100_001), &cancel).await?;
        let second = repository.create(new_order(100_002), &cancel).await?;

        assert_eq!(first.id(), Some(OrderId(1)));
        assert_eq!(second.id(), Some(OrderId(2)));
        assert!(first.items().iter().all(|item| item.order_id == Some(OrderId(1))));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected_while_monitored() -> TestResult {
        let repository = InMemoryOrderRepository::new();
        let cancel = CancellationToken::new();
        repository.create(new_order(200_000), &cancel).await?;

        let clash = repository.create(new_order(200_000), &cancel).await;
        assert!(matches!(clash, Err(PortError::DuplicateOrderNumber(n)) if n.value() == 200_000));
        Ok(())
    }

    #[tokio::test]
    async fn test_number_reusable_after_completion() -> TestResult {
        let repository = InMemoryOrderRepository::new();
        let cancel = CancellationToken::new();
        let mut order = repository.create(new_order(300_000), &cancel).await?;
        for _ in 0..3 {
            order.advance_status(Utc::now())?;
        }
        repository.update(order, &cancel).await?;

        let reused = repository.create(new_order(300_000), &cancel).await?;
        assert_eq!(reused.id(), Some(OrderId(2)));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_detects_stale_version() -> TestResult {
        let repository = InMemoryOrderRepository::new();
        let cancel = CancellationToken::new();
        let stored = repository.create(new_order(400_000), &cancel).await?;

        let mut first = stored.clone();
        let mut second = stored;
        first.advance_status(Utc::now())?;
        second.advance_status(Utc::now())?;

        let saved = repository.update(first, &cancel).await?;
        assert_eq!(saved.version(), 1);

        let lost = repository.update(second, &cancel).await;
        assert!(matches!(
            lost,
            Err(PortError::VersionConflict { expected: 0, actual: 1, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_monitored_sorted_and_paged() -> TestResult {
        let repository = InMemoryOrderRepository::new();
        let cancel = CancellationToken::new();
        let base = Utc::now();

        let at = |minutes: i64, status: OrderStatus, number: u32| {
            let order = Order::create(
                &OrderRequest::new(vec![OrderItemRequest::new("A", 1)]),
                &[],
                OrderNumber::new(number).unwrap(),
                base + Duration::minutes(minutes),
            )
            .unwrap();
            Order::restore(
                OrderId(0),
                0,
                order.order_number(),
                None,
                order.total(),
                status,
                order.items().to_vec(),
                order.created_at(),
                order.updated_at(),
            )
        };

        repository.seed(at(0, OrderStatus::Received, 100_000)).await;
        repository.seed(at(1, OrderStatus::Completed, 100_001)).await;
        repository.seed(at(2, OrderStatus::Ready, 100_002)).await;
        repository.seed(at(3, OrderStatus::InPreparation, 100_003)).await;
        repository.seed(at(4, OrderStatus::Canceled, 100_004)).await;
        repository.seed(at(5, OrderStatus::Ready, 100_005)).await;

        let all = repository.list_monitored(Page::new(0, 10), &cancel).await?;
        let numbers: Vec<u32> = all.iter().map(|o| o.order_number().value()).collect();
        assert_eq!(numbers, vec![100_002, 100_005, 100_003, 100_000]);

        let second_page = repository.list_monitored(Page::new(2, 2), &cancel).await?;
        let numbers: Vec<u32> = second_page.iter().map(|o| o.order_number().value()).collect();
        assert_eq!(numbers, vec![100_003, 100_000]);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let repository = InMemoryOrderRepository::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = repository.get_by_id(OrderId(1), &cancel).await;
        assert!(matches!(result, Err(PortError::Cancelled)));
    }
}
