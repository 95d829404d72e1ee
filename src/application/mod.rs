// ============================================================================
// Application Layer - Order orchestration over the ports
// ============================================================================

pub mod dto;
pub mod errors;
pub mod order_manager;

pub use dto::{OrderItemResponse, OrderResponse};
pub use errors::{FailureKind, ManagerError};
pub use order_manager::{ManagerConfig, OrderManager};
