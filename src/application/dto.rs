use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::order::{Order, OrderId, OrderItem, OrderStatus, ProductId};

/// Read projection of an order returned by every manager operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderResponse {
    pub id: Option<OrderId>,
    pub order_number: u32,
    pub cpf: Option<String>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub quantity: u32,
    pub product_name: Option<String>,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            product_name: item.product.as_ref().map(|product| product.name.clone()),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            order_number: order.order_number().value(),
            cpf: order.cpf().map(|cpf| cpf.to_string()),
            total: order.total(),
            status: order.status(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}
