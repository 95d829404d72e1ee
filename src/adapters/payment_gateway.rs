use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ports::{PaymentGateway, PaymentReceipt, PaymentRequest, PortError};

/// Payment gateway that accepts every request and remembers it.
///
/// Requests are deduplicated by idempotency key: a retried request returns
/// the receipt issued the first time. Failures can be scripted with
/// [`fail_next`](Self::fail_next).
#[derive(Debug, Default)]
pub struct RecordingPaymentGateway {
    requests: Mutex<Vec<PaymentRequest>>,
    receipts: Mutex<HashMap<Uuid, PaymentReceipt>>,
    scripted_failures: Mutex<VecDeque<PortError>>,
}

impl RecordingPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error to be returned by the next call.
    pub async fn fail_next(&self, error: PortError) {
        self.scripted_failures.lock().await.push_back(error);
    }

    /// Every request received, including failed and repeated ones.
    pub async fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of distinct payments started.
    pub async fn payments_started(&self) -> usize {
        self.receipts.lock().await.len()
    }
}

#[async_trait]
impl PaymentGateway for RecordingPaymentGateway {
    async fn request_payment(
        &self,
        request: PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentReceipt, PortError> {
        if cancel.is_cancelled() {
            return Err(PortError::Cancelled);
        }

        self.requests.lock().await.push(request.clone());

        if let Some(error) = self.scripted_failures.lock().await.pop_front() {
            return Err(error);
        }

        let mut receipts = self.receipts.lock().await;
        let receipt = receipts
            .entry(request.idempotency_key)
            .or_insert_with(|| PaymentReceipt {
                payment_id: format!("pay_{}", request.idempotency_key.simple()),
                order_id: request.order_id,
            })
            .clone();

        tracing::debug!(
            order_id = %request.order_id,
            amount = %request.amount,
            payment_id = %receipt.payment_id,
            "Payment requested"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderId;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    fn request(key: Uuid) -> PaymentRequest {
        PaymentRequest {
            order_id: OrderId(1),
            amount: Decimal::TEN,
            idempotency_key: key,
        }
    }

    #[tokio::test]
    async fn test_same_key_returns_same_receipt() -> TestResult {
        let gateway = RecordingPaymentGateway::new();
        let cancel = CancellationToken::new();
        let key = Uuid::new_v4();

        let first = gateway.request_payment(request(key), &cancel).await?;
        let second = gateway.request_payment(request(key), &cancel).await?;

        assert_eq!(first, second);
        assert_eq!(gateway.payments_started().await, 1);
        assert_eq!(gateway.requests().await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_scripted_failure_is_returned_once() -> TestResult {
        let gateway = RecordingPaymentGateway::new();
        let cancel = CancellationToken::new();
        gateway.fail_next(PortError::unavailable("payments", "timeout")).await;

        let failed = gateway.request_payment(request(Uuid::new_v4()), &cancel).await;
        assert!(matches!(failed, Err(PortError::Unavailable { .. })));

        gateway.request_payment(request(Uuid::new_v4()), &cancel).await?;
        assert_eq!(gateway.payments_started().await, 1);
        Ok(())
    }
}
