use super::value_objects::{OrderId, OrderStatus, ProductId};

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Cannot create an order with no items")]
    EmptyOrderItems,

    #[error("CPF was invalid")]
    InvalidCpf,

    #[error("Invalid quantity 0 for product {0}")]
    InvalidQuantity(ProductId),

    #[error("No active price found for products: {0:?}")]
    UnpricedItems(Vec<ProductId>),

    #[error("It is not possible to change the status when it is {0}")]
    StatusChangeNotAllowed(OrderStatus),

    #[error("Order {0} is not awaiting payment confirmation (status {1})")]
    NotAwaitingConfirmation(OrderId, OrderStatus),

    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
}

impl OrderError {
    /// Errors caused by a malformed request rather than by the order's state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::EmptyOrderItems
                | OrderError::InvalidCpf
                | OrderError::InvalidQuantity(_)
                | OrderError::UnpricedItems(_)
        )
    }
}
