// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// - Value objects (OrderId, OrderNumber, OrderStatus, OrderItem, Page)
// - Commands (OrderRequest and its validated form PlaceOrder)
// - Errors (OrderError)
// - Aggregate (Order with pricing and the status state machine)
// - Order number generation
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod order_number;

pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use order_number::*;
