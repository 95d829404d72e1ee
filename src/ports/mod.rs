// ============================================================================
// Ports - Contracts the order core depends on
// ============================================================================
//
// Implemented outside the core (databases, HTTP clients, payment providers).
// Every call takes the caller's cancellation token so adapters can abandon
// in-flight work; the order manager also races each call against it.
//
// ============================================================================

pub mod order_repository;
pub mod product_catalog;
pub mod payment_gateway;

pub use order_repository::*;
pub use product_catalog::*;
pub use payment_gateway::*;

use crate::domain::order::{OrderId, OrderNumber};
use crate::utils::IsTransient;

/// Failure reported by a port implementation.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },

    #[error("request rejected by {service}: {reason}")]
    Rejected { service: &'static str, reason: String },

    #[error("order {id} was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict { id: OrderId, expected: u64, actual: u64 },

    #[error("order number {0} is already in use")]
    DuplicateOrderNumber(OrderNumber),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PortError {
    pub fn unavailable(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            service,
            reason: reason.into(),
        }
    }

    pub fn rejected(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            service,
            reason: reason.into(),
        }
    }
}

impl IsTransient for PortError {
    fn is_transient(&self) -> bool {
        matches!(self, PortError::Unavailable { .. })
    }
}
