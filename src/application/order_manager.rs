use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::order::{
    Order, OrderError, OrderId, OrderNumberGenerator, OrderPolicy, OrderRequest, OrderStatus,
    OsRngOrderNumbers, Page,
};
use crate::metrics::OrderMetrics;
use crate::ports::{OrderRepository, PaymentGateway, PaymentRequest, PortError, ProductCatalog};
use crate::utils::{retry_on_transient, Clock, RetryConfig, RetryResult, SystemClock};

use super::dto::OrderResponse;
use super::errors::{FailureKind, ManagerError};

// ============================================================================
// Order Manager
// ============================================================================
//
// Orchestrates: Request → Product Catalog → Order → Repository → Payments
//
// Stateless between calls: every piece of state lives in the persisted order.
// Each port call is raced against the caller's cancellation token. Port
// failures are wrapped with the operation and order they belong to; domain
// errors pass through untouched.
//
// ============================================================================

const ORDER_REPOSITORY: &str = "order_repository";
const PRODUCT_CATALOG: &str = "product_catalog";
const PAYMENT_GATEWAY: &str = "payment_gateway";

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    /// Upper bound applied to every requested page size
    pub max_page_size: usize,
    /// Draws allowed when the repository reports an order number clash
    pub order_number_attempts: u32,
    /// Backoff used for payment initiation
    pub payment_retry: RetryConfig,
    pub policy: OrderPolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_page_size: 100,
            order_number_attempts: 3,
            payment_retry: RetryConfig::default(),
            policy: OrderPolicy::default(),
        }
    }
}

pub struct OrderManager {
    repository: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductCatalog>,
    payments: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    order_numbers: Arc<dyn OrderNumberGenerator>,
    metrics: Option<Arc<OrderMetrics>>,
    config: ManagerConfig,
}

impl OrderManager {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductCatalog>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            repository,
            products,
            payments,
            clock: Arc::new(SystemClock),
            order_numbers: Arc::new(OsRngOrderNumbers),
            metrics: None,
            config: ManagerConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_order_numbers(mut self, order_numbers: Arc<dyn OrderNumberGenerator>) -> Self {
        self.order_numbers = order_numbers;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<OrderMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Price, persist and start payment for a new order.
    ///
    /// If payment cannot be initiated the order stays persisted in `Received`
    /// and [`ManagerError::PaymentNotInitiated`] carries it for reconciliation.
    pub async fn create(
        &self,
        request: OrderRequest,
        cancel: &CancellationToken,
    ) -> Result<OrderResponse, ManagerError> {
        let result = self.create_order(request, cancel).await;
        self.finish("create", result)
    }

    /// `Ok(None)` when no order has this id.
    pub async fn get_by_id(
        &self,
        id: OrderId,
        cancel: &CancellationToken,
    ) -> Result<Option<OrderResponse>, ManagerError> {
        let result = self
            .guarded(ORDER_REPOSITORY, "get_by_id", cancel, self.repository.get_by_id(id, cancel))
            .await
            .map(|order| order.as_ref().map(OrderResponse::from))
            .map_err(|e| dependency("get_by_id", format!("retrieving order {id}"), e));
        self.finish("get_by_id", result)
    }

    /// Orders in exactly `status`, windowed by `page`.
    pub async fn get_all(
        &self,
        status: OrderStatus,
        page: Page,
        cancel: &CancellationToken,
    ) -> Result<Vec<OrderResponse>, ManagerError> {
        let page = page.clamped(self.config.max_page_size);
        let result = self
            .guarded(
                ORDER_REPOSITORY,
                "list_by_status",
                cancel,
                self.repository.list_by_status(status, page, cancel),
            )
            .await
            .map(|orders| orders.iter().map(OrderResponse::from).collect())
            .map_err(|e| dependency("get_all", format!("listing {status} orders"), e));
        self.finish("get_all", result)
    }

    /// Move an order one step along the kitchen pipeline.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        cancel: &CancellationToken,
    ) -> Result<OrderResponse, ManagerError> {
        let result = self
            .transition("update_status", order_id, cancel, |order, now| order.advance_status(now))
            .await;
        self.finish("update_status", result)
    }

    /// Payment confirmed: a `Received` order goes to `InPreparation`.
    pub async fn confirm_payment(
        &self,
        order_id: OrderId,
        cancel: &CancellationToken,
    ) -> Result<OrderResponse, ManagerError> {
        let result = self
            .transition("confirm_payment", order_id, cancel, |order, now| order.confirm_payment(now))
            .await;
        self.finish("confirm_payment", result)
    }

    /// Orders still in the pipeline for the kitchen display: Ready first,
    /// then InPreparation, then Received, oldest first within each status.
    pub async fn get_orders_to_monitor(
        &self,
        page: Page,
        cancel: &CancellationToken,
    ) -> Result<Vec<OrderResponse>, ManagerError> {
        let page = page.clamped(self.config.max_page_size);
        let result = self
            .guarded(
                ORDER_REPOSITORY,
                "list_monitored",
                cancel,
                self.repository.list_monitored(page, cancel),
            )
            .await
            .map(|orders| orders.iter().map(OrderResponse::from).collect())
            .map_err(|e| dependency("get_orders_to_monitor", "listing monitored orders".to_string(), e));
        self.finish("get_orders_to_monitor", result)
    }

    // ------------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------------

    async fn create_order(
        &self,
        request: OrderRequest,
        cancel: &CancellationToken,
    ) -> Result<OrderResponse, ManagerError> {
        let command = request.validate()?;
        let product_ids = command.distinct_product_ids();

        tracing::debug!(products = ?product_ids, "Resolving active products");
        let products = self
            .guarded(
                PRODUCT_CATALOG,
                "get_active_by_ids",
                cancel,
                self.products.get_active_by_ids(&product_ids, cancel),
            )
            .await
            .map_err(|e| dependency("create", format!("looking up products {product_ids:?}"), e))?;

        let order = Order::place(
            command,
            &products,
            self.order_numbers.next_number(),
            self.clock.now(),
            self.config.policy,
        )?;

        let order = self.persist_new(order, cancel).await?;
        if let Some(metrics) = &self.metrics {
            metrics.record_order_created();
        }

        tracing::info!(
            order_id = ?order.id(),
            order_number = %order.order_number(),
            total = %order.total(),
            item_count = order.items().len(),
            "✅ Order created"
        );

        self.initiate_payment(&order, cancel).await
    }

    /// Store a new order, drawing a fresh number when the repository reports a clash.
    async fn persist_new(&self, mut order: Order, cancel: &CancellationToken) -> Result<Order, ManagerError> {
        let mut attempt = 1;

        loop {
            let stored = self
                .guarded(ORDER_REPOSITORY, "create", cancel, self.repository.create(order.clone(), cancel))
                .await;

            match stored {
                Ok(created) if created.id().is_some() => return Ok(created),
                Ok(_) => {
                    return Err(ManagerError::Dependency {
                        operation: "create",
                        context: format!("persisting order number {}", order.order_number()),
                        source: PortError::rejected(ORDER_REPOSITORY, "stored order has no id"),
                    })
                }
                Err(PortError::DuplicateOrderNumber(number)) if attempt < self.config.order_number_attempts => {
                    tracing::warn!(
                        order_number = %number,
                        attempt = attempt,
                        "Order number already in use, drawing another"
                    );
                    attempt += 1;
                    order.renumber(self.order_numbers.next_number());
                }
                Err(e) => {
                    return Err(dependency(
                        "create",
                        format!("persisting order number {}", order.order_number()),
                        e,
                    ))
                }
            }
        }
    }

    async fn initiate_payment(
        &self,
        order: &Order,
        cancel: &CancellationToken,
    ) -> Result<OrderResponse, ManagerError> {
        let response = OrderResponse::from(order);
        let Some(order_id) = order.id() else {
            return Ok(response);
        };

        let request = PaymentRequest {
            order_id,
            amount: order.total(),
            idempotency_key: Uuid::new_v4(),
        };

        let outcome = retry_on_transient(&self.config.payment_retry, cancel, |_attempt| {
            if let Some(metrics) = &self.metrics {
                metrics.record_retry_attempt("payment_initiation");
            }
            let request = request.clone();
            async move {
                self.guarded(
                    PAYMENT_GATEWAY,
                    "request_payment",
                    cancel,
                    self.payments.request_payment(request, cancel),
                )
                .await
            }
        })
        .await;

        let source = match outcome {
            RetryResult::Success(receipt) => {
                tracing::info!(
                    order_id = %order_id,
                    payment_id = %receipt.payment_id,
                    idempotency_key = %request.idempotency_key,
                    "Payment initiated"
                );
                self.record_payment("initiated");
                return Ok(response);
            }
            RetryResult::Failed(source) | RetryResult::PermanentFailure(source) => source,
            RetryResult::Cancelled => PortError::Cancelled,
        };

        if matches!(source, PortError::Cancelled) {
            tracing::warn!(
                order_id = %order_id,
                amount = %request.amount,
                idempotency_key = %request.idempotency_key,
                "Payment initiation cancelled, order needs reconciliation"
            );
            self.record_payment("cancelled");
        } else {
            tracing::error!(
                order_id = %order_id,
                amount = %request.amount,
                idempotency_key = %request.idempotency_key,
                error = %source,
                "Payment initiation failed, order needs reconciliation"
            );
            self.record_payment("failed");
        }

        Err(ManagerError::PaymentNotInitiated {
            order: Box::new(response),
            source,
        })
    }

    /// Load an order, apply `change`, and save it under optimistic concurrency.
    async fn transition<F>(
        &self,
        operation: &'static str,
        order_id: OrderId,
        cancel: &CancellationToken,
        change: F,
    ) -> Result<OrderResponse, ManagerError>
    where
        F: FnOnce(&mut Order, chrono::DateTime<chrono::Utc>) -> Result<OrderStatus, OrderError>,
    {
        let mut order = self
            .guarded(ORDER_REPOSITORY, "get_by_id", cancel, self.repository.get_by_id(order_id, cancel))
            .await
            .map_err(|e| dependency(operation, format!("retrieving order {order_id}"), e))?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let from = order.status();
        let to = change(&mut order, self.clock.now())?;

        let updated = match self
            .guarded(ORDER_REPOSITORY, "update", cancel, self.repository.update(order, cancel))
            .await
        {
            Ok(updated) => updated,
            Err(source @ PortError::VersionConflict { .. }) => {
                return Err(ManagerError::ConcurrentModification { order_id, source })
            }
            Err(e) => {
                return Err(dependency(operation, format!("saving order {order_id} as {to}"), e))
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_status_transition(from.as_str(), to.as_str());
        }
        tracing::info!(
            order_id = %order_id,
            from = %from,
            to = %to,
            "Order status changed"
        );

        Ok(OrderResponse::from(&updated))
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Await a port call unless `cancel` fires first, recording its latency.
    async fn guarded<T, F>(
        &self,
        port: &'static str,
        operation: &'static str,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T, PortError>
    where
        F: Future<Output = Result<T, PortError>>,
    {
        let started = Instant::now();
        tracing::debug!(port = port, operation = operation, "Calling port");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PortError::Cancelled),
            outcome = call => outcome,
        };

        if let Some(metrics) = &self.metrics {
            metrics.observe_port_call(port, operation, started.elapsed().as_secs_f64());
        }
        outcome
    }

    fn record_payment(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_payment_initiation(outcome);
        }
    }

    fn finish<T>(&self, operation: &'static str, result: Result<T, ManagerError>) -> Result<T, ManagerError> {
        if let Err(error) = &result {
            let kind = error.kind();
            match kind {
                // Already logged with its reconciliation context
                _ if matches!(error, ManagerError::PaymentNotInitiated { .. }) => {}
                FailureKind::Dependency => {
                    tracing::error!(operation = operation, error = %error, "Order operation failed")
                }
                FailureKind::Cancelled => {
                    tracing::info!(operation = operation, "Order operation cancelled by caller")
                }
                FailureKind::Validation | FailureKind::NotFound | FailureKind::Conflict => {
                    tracing::warn!(operation = operation, error = %error, "Order operation rejected")
                }
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_failure(operation, kind.as_str());
            }
        }
        result
    }
}

/// Wrap a port failure with context; cancellation is reported as such.
fn dependency(operation: &'static str, context: String, source: PortError) -> ManagerError {
    match source {
        PortError::Cancelled => ManagerError::Cancelled { operation },
        source => ManagerError::Dependency {
            operation,
            context,
            source,
        },
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
