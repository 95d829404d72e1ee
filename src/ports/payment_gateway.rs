use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::order::OrderId;
use super::PortError;

/// Request to start capturing payment for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Decimal,
    /// Same key on every retry of one order's payment so the provider can deduplicate.
    pub idempotency_key: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub order_id: OrderId,
}

/// Payment initiation against an external provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn request_payment(
        &self,
        request: PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentReceipt, PortError>;
}
