use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::order::{Order, OrderId, OrderStatus, Page};
use super::PortError;

/// Persistence for order aggregates (the order with all of its items).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Orders whose status equals `status`, windowed by `page`.
    async fn list_by_status(
        &self,
        status: OrderStatus,
        page: Page,
        cancel: &CancellationToken,
    ) -> Result<Vec<Order>, PortError>;

    /// Orders still in the kitchen pipeline (neither Completed nor Canceled).
    ///
    /// The window must be cut from the sequence sorted with
    /// [`monitor_ordering`](crate::domain::order::monitor_ordering) over
    /// `(status, created_at)`.
    async fn list_monitored(
        &self,
        page: Page,
        cancel: &CancellationToken,
    ) -> Result<Vec<Order>, PortError>;

    /// Store a new order, assigning its id. Fails with
    /// [`PortError::DuplicateOrderNumber`] if a monitored order already uses
    /// the same number.
    async fn create(&self, order: Order, cancel: &CancellationToken) -> Result<Order, PortError>;

    async fn get_by_id(
        &self,
        id: OrderId,
        cancel: &CancellationToken,
    ) -> Result<Option<Order>, PortError>;

    /// Overwrite a stored order. Fails with [`PortError::VersionConflict`]
    /// when `order.version()` no longer matches the stored version; on
    /// success the returned order carries the new version.
    async fn update(&self, order: Order, cancel: &CancellationToken) -> Result<Order, PortError>;
}
