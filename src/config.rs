use clap::Parser;
use std::time::Duration;

use crate::application::ManagerConfig;
use crate::domain::order::OrderPolicy;
use crate::utils::RetryConfig;

/// Runtime settings, read from flags or `KITCHEN_ORDERS_*` environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "kitchen-orders", about = "Kitchen order lifecycle service", long_about = None)]
pub struct AppConfig {
    /// Tracing filter directive, overridden by RUST_LOG when set
    #[arg(long, env = "KITCHEN_ORDERS_LOG", default_value = "info,kitchen_orders=debug")]
    pub log_filter: String,

    /// Port for the /metrics and /health endpoints
    #[arg(long, env = "KITCHEN_ORDERS_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,

    /// Largest page any listing query may return
    #[arg(long, env = "KITCHEN_ORDERS_MAX_PAGE_SIZE", default_value_t = 100)]
    pub max_page_size: usize,

    /// Attempts made to initiate payment for a new order
    #[arg(long, env = "KITCHEN_ORDERS_PAYMENT_ATTEMPTS", default_value_t = 3)]
    pub payment_attempts: u32,

    /// Delay before the first payment retry, in milliseconds
    #[arg(long, env = "KITCHEN_ORDERS_PAYMENT_INITIAL_DELAY_MS", default_value_t = 200)]
    pub payment_initial_delay_ms: u64,

    /// Upper bound for the payment retry delay, in milliseconds
    #[arg(long, env = "KITCHEN_ORDERS_PAYMENT_MAX_DELAY_MS", default_value_t = 5_000)]
    pub payment_max_delay_ms: u64,

    /// Times a new order number is drawn when the repository reports a clash
    #[arg(long, env = "KITCHEN_ORDERS_ORDER_NUMBER_ATTEMPTS", default_value_t = 3)]
    pub order_number_attempts: u32,

    /// Fail order creation when a requested product has no active price
    #[arg(long, env = "KITCHEN_ORDERS_REJECT_UNPRICED_ITEMS", default_value_t = false)]
    pub reject_unpriced_items: bool,
}

impl AppConfig {
    /// Load `.env` if present, then parse flags and environment.
    pub fn load() -> Self {
        let _env = dotenvy::dotenv();
        Self::parse()
    }

    pub fn payment_retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.payment_attempts.max(1),
            initial_delay: Duration::from_millis(self.payment_initial_delay_ms),
            max_delay: Duration::from_millis(self.payment_max_delay_ms),
            multiplier: 2.0,
        }
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            max_page_size: self.max_page_size.max(1),
            order_number_attempts: self.order_number_attempts.max(1),
            payment_retry: self.payment_retry(),
            policy: OrderPolicy {
                reject_unpriced_items: self.reject_unpriced_items,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse_from(["kitchen-orders"]);
        let manager = config.manager_config();

        assert_eq!(manager.max_page_size, 100);
        assert_eq!(manager.order_number_attempts, 3);
        assert_eq!(manager.payment_retry.max_attempts, 3);
        assert_eq!(manager.payment_retry.initial_delay, Duration::from_millis(200));
        assert!(!manager.policy.reject_unpriced_items);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = AppConfig::parse_from([
            "kitchen-orders",
            "--max-page-size",
            "0",
            "--payment-attempts",
            "5",
            "--reject-unpriced-items",
        ]);
        let manager = config.manager_config();

        assert_eq!(manager.max_page_size, 1);
        assert_eq!(manager.payment_retry.max_attempts, 5);
        assert!(manager.policy.reject_unpriced_items);
    }
}
