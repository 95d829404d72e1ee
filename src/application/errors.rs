use crate::domain::order::{OrderError, OrderId};
use crate::ports::PortError;
use super::dto::OrderResponse;

/// How a failure should be presented to whoever called the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request itself is malformed
    Validation,
    /// The referenced order does not exist
    NotFound,
    /// The request conflicts with the order's current state
    Conflict,
    /// An external collaborator failed or was unreachable
    Dependency,
    /// The caller gave up before the operation finished
    Cancelled,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::NotFound => "not_found",
            FailureKind::Conflict => "conflict",
            FailureKind::Dependency => "dependency",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// Business rule violation, passed through unchanged.
    #[error(transparent)]
    Domain(#[from] OrderError),

    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },

    #[error("order {order_id} was modified concurrently")]
    ConcurrentModification {
        order_id: OrderId,
        #[source]
        source: PortError,
    },

    /// The order was persisted but payment could not be initiated.
    ///
    /// `source` is [`PortError::Cancelled`] when the caller gave up while
    /// payment was in flight; [`ManagerError::kind`] then reports
    /// [`FailureKind::Cancelled`] instead of a dependency fault.
    #[error("order was created but payment initiation failed")]
    PaymentNotInitiated {
        order: Box<OrderResponse>,
        #[source]
        source: PortError,
    },

    #[error("{operation} failed: {context}")]
    Dependency {
        operation: &'static str,
        context: String,
        #[source]
        source: PortError,
    },
}

impl ManagerError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ManagerError::Domain(OrderError::OrderNotFound(_)) => FailureKind::NotFound,
            ManagerError::Domain(error) if error.is_validation() => FailureKind::Validation,
            ManagerError::Domain(_) | ManagerError::ConcurrentModification { .. } => FailureKind::Conflict,
            ManagerError::Cancelled { .. }
            | ManagerError::PaymentNotInitiated {
                source: PortError::Cancelled,
                ..
            } => FailureKind::Cancelled,
            ManagerError::PaymentNotInitiated { .. } | ManagerError::Dependency { .. } => {
                FailureKind::Dependency
            }
        }
    }

    /// The domain fault behind this error, if any.
    pub fn as_domain(&self) -> Option<&OrderError> {
        match self {
            ManagerError::Domain(error) => Some(error),
            _ => None,
        }
    }
}
