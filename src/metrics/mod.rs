// Private module declaration
mod server;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the order core
// ============================================================================
//
// Provides metrics for:
// - Orders created and status transitions
// - Payment initiation outcomes and retries
// - Failed manager operations by failure kind
// - Port call latency
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct OrderMetrics {
    registry: Registry,

    // Order Lifecycle Metrics
    pub orders_created: IntCounter,
    pub status_transitions: IntCounterVec,

    // Payment Metrics
    pub payment_initiations: IntCounterVec,
    pub retry_attempts_total: IntCounterVec,

    // Operation Metrics
    pub operation_failures: IntCounterVec,
    pub port_call_duration: HistogramVec,
}

impl OrderMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Order Lifecycle Metrics
        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Order status transitions"),
            &["from_status", "to_status"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        // Payment Metrics
        let payment_initiations = IntCounterVec::new(
            Opts::new("payment_initiations_total", "Payment initiation requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(payment_initiations.clone()))?;

        let retry_attempts_total = IntCounterVec::new(
            Opts::new("retry_attempts_total", "Total attempts made by retried operations"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        // Operation Metrics
        let operation_failures = IntCounterVec::new(
            Opts::new("order_operation_failures_total", "Failed order manager operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(operation_failures.clone()))?;

        let port_call_duration = HistogramVec::new(
            HistogramOpts::new("port_call_duration_seconds", "Latency of calls to external ports")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["port", "operation"],
        )?;
        registry.register(Box::new(port_call_duration.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            status_transitions,
            payment_initiations,
            retry_attempts_total,
            operation_failures,
            port_call_duration,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
    }

    pub fn record_status_transition(&self, from_status: &str, to_status: &str) {
        self.status_transitions.with_label_values(&[from_status, to_status]).inc();
    }

    /// `outcome` is one of `initiated`, `failed` or `cancelled`.
    pub fn record_payment_initiation(&self, outcome: &str) {
        self.payment_initiations.with_label_values(&[outcome]).inc();
    }

    pub fn record_retry_attempt(&self, operation: &str) {
        self.retry_attempts_total.with_label_values(&[operation]).inc();
    }

    pub fn record_failure(&self, operation: &str, kind: &str) {
        self.operation_failures.with_label_values(&[operation, kind]).inc();
    }

    pub fn observe_port_call(&self, port: &str, operation: &str, duration_secs: f64) {
        self.port_call_duration
            .with_label_values(&[port, operation])
            .observe(duration_secs);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        render_registry(&self.registry)
    }
}

pub(crate) fn render_registry(registry: &Registry) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &OrderMetrics, name: &str) -> Vec<f64> {
        metrics
            .registry()
            .gather()
            .iter()
            .find(|m| m.name() == name)
            .map(|family| {
                family
                    .metric
                    .iter()
                    .filter_map(|m| m.counter.value)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = OrderMetrics::new().unwrap();
        metrics.record_order_created();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_order_lifecycle() {
        let metrics = OrderMetrics::new().unwrap();
        metrics.record_order_created();
        metrics.record_order_created();
        metrics.record_status_transition("Received", "InPreparation");
        metrics.record_status_transition("InPreparation", "Ready");

        assert_eq!(counter_value(&metrics, "orders_created_total"), vec![2.0]);
        assert_eq!(counter_value(&metrics, "order_status_transitions_total").len(), 2);
    }

    #[test]
    fn test_record_payment_outcomes() {
        let metrics = OrderMetrics::new().unwrap();
        metrics.record_payment_initiation("initiated");
        metrics.record_payment_initiation("failed");
        metrics.record_payment_initiation("failed");

        let mut values = counter_value(&metrics, "payment_initiations_total");
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_render_text_format() {
        let metrics = OrderMetrics::new().unwrap();
        metrics.record_failure("create", "dependency");
        metrics.observe_port_call("order_repository", "create", 0.002);

        let text = metrics.render().unwrap();
        assert!(text.contains("order_operation_failures_total"));
        assert!(text.contains("port_call_duration_seconds"));
    }
}
