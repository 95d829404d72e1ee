// ============================================================================
// In-Memory Adapters
// ============================================================================
//
// Process-local implementations of the ports, used by the demo binary and by
// tests. They honour the same contracts a database or HTTP adapter must.
//
// ============================================================================

pub mod order_repository;
pub mod product_catalog;
pub mod payment_gateway;

pub use order_repository::InMemoryOrderRepository;
pub use product_catalog::InMemoryProductCatalog;
pub use payment_gateway::RecordingPaymentGateway;
