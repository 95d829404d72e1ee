use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kitchen_orders::adapters::{InMemoryOrderRepository, InMemoryProductCatalog, RecordingPaymentGateway};
use kitchen_orders::application::OrderManager;
use kitchen_orders::config::AppConfig;
use kitchen_orders::domain::order::{OrderItemRequest, OrderRequest, Page, Product, ProductId};
use kitchen_orders::metrics::{self, OrderMetrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load();

    // RUST_LOG wins over the configured filter when set
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .init();

    tracing::info!("🚀 Starting kitchen order demo");

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(OrderMetrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // Metrics server runs on its own runtime, like any actix system
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!(error = %e, "Could not start metrics runtime");
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 2. Wire the in-memory adapters ===
    let catalog = InMemoryProductCatalog::new([
        Product {
            id: ProductId::new("burger"),
            name: "Cheeseburger".to_string(),
            price: Decimal::new(2000, 2),
            is_active: true,
        },
        Product {
            id: ProductId::new("fries"),
            name: "Fries".to_string(),
            price: Decimal::new(850, 2),
            is_active: true,
        },
        Product {
            id: ProductId::new("shake"),
            name: "Milkshake".to_string(),
            price: Decimal::new(1200, 2),
            is_active: false,
        },
    ]);

    let manager = OrderManager::new(
        Arc::new(InMemoryOrderRepository::new()),
        Arc::new(catalog),
        Arc::new(RecordingPaymentGateway::new()),
    )
    .with_metrics(metrics.clone())
    .with_config(config.manager_config());

    // Ctrl-C cancels whatever is in flight
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    // === 3. Demonstrate the order lifecycle ===
    tracing::info!("📝 Demonstrating order lifecycle");

    let first = manager
        .create(
            OrderRequest::new(vec![OrderItemRequest::new("burger", 2)]).with_cpf("529.982.247-25"),
            &cancel,
        )
        .await?;
    let second = manager
        .create(
            OrderRequest::new(vec![
                OrderItemRequest::new("fries", 1),
                OrderItemRequest::new("shake", 1),
            ]),
            &cancel,
        )
        .await?;
    tracing::info!(first_total = %first.total, second_total = %second.total, "Orders placed");

    let Some(first_id) = first.id else {
        anyhow::bail!("created order has no id");
    };
    for _ in 0..2 {
        let order = manager.update_status(first_id, &cancel).await?;
        tracing::info!(order_id = %first_id, status = %order.status, "✅ Order advanced");
    }

    // === 4. What the kitchen display would show ===
    for order in manager.get_orders_to_monitor(Page::default(), &cancel).await? {
        tracing::info!(
            order_number = order.order_number,
            status = %order.status,
            total = %order.total,
            "🍳 Monitored order"
        );
    }

    tracing::info!("{}", serde_json::to_string_pretty(&first)?);
    tracing::info!("🎉 Demo complete!");

    Ok(())
}
