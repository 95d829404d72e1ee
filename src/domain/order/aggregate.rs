use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::cpf::Cpf;
use super::commands::{OrderRequest, PlaceOrder};
use super::errors::OrderError;
use super::value_objects::{
    OrderId, OrderItem, OrderNumber, OrderStatus, Product, ProductId,
};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

/// How to treat requested items whose product has no active price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPolicy {
    /// Fail creation instead of pricing unmatched items at zero.
    pub reject_unpriced_items: bool,
}

/// Rehydrate stored orders with [`Order::restore`]; there is no
/// `Deserialize` so every instance passes through a checked constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    // Identity
    id: Option<OrderId>,
    version: u64,
    order_number: OrderNumber,

    // Current State
    cpf: Option<Cpf>,
    total: Decimal,
    status: OrderStatus,
    items: Vec<OrderItem>,

    // Audit Trail
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Validate `request` and build a new order priced against `active_products`.
    pub fn create(
        request: &OrderRequest,
        active_products: &[Product],
        order_number: OrderNumber,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let command = request.validate()?;
        Self::place(command, active_products, order_number, now, OrderPolicy::default())
    }

    /// Build a new, unpersisted order in status `Received`.
    ///
    /// Items whose product is missing from `active_products` contribute zero to
    /// the total unless `policy` rejects them.
    pub fn place(
        command: PlaceOrder,
        active_products: &[Product],
        order_number: OrderNumber,
        now: DateTime<Utc>,
        policy: OrderPolicy,
    ) -> Result<Self, OrderError> {
        let catalog: HashMap<&ProductId, &Product> =
            active_products.iter().map(|product| (&product.id, product)).collect();

        let (cpf, requested) = command.into_parts();

        let unpriced: Vec<ProductId> = requested
            .iter()
            .filter(|item| !catalog.contains_key(&item.product_id))
            .map(|item| item.product_id.clone())
            .collect();

        if !unpriced.is_empty() {
            if policy.reject_unpriced_items {
                return Err(OrderError::UnpricedItems(unpriced));
            }
            tracing::warn!(
                order_number = %order_number,
                unpriced = ?unpriced,
                "Items without an active product were priced at zero"
            );
        }

        let total = requested
            .iter()
            .filter_map(|item| {
                catalog
                    .get(&item.product_id)
                    .map(|product| product.price * Decimal::from(item.quantity))
            })
            .sum();

        let items = requested
            .into_iter()
            .map(|item| OrderItem {
                product: catalog.get(&item.product_id).map(|product| (*product).clone()),
                product_id: item.product_id,
                quantity: item.quantity,
                order_id: None,
            })
            .collect();

        Ok(Self {
            id: None,
            version: 0,
            order_number,
            cpf,
            total,
            status: OrderStatus::Received,
            items,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild an order from stored state.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OrderId,
        version: u64,
        order_number: OrderNumber,
        cpf: Option<Cpf>,
        total: Decimal,
        status: OrderStatus,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let mut order = Self {
            id: None,
            version,
            order_number,
            cpf,
            total,
            status,
            items,
            created_at,
            updated_at,
        };
        order.assign_id(id);
        order
    }

    /// Move to the next pipeline status and return it.
    pub fn advance_status(&mut self, now: DateTime<Utc>) -> Result<OrderStatus, OrderError> {
        let next = self
            .status
            .next()
            .ok_or(OrderError::StatusChangeNotAllowed(self.status))?;

        self.status = next;
        self.updated_at = now;
        Ok(next)
    }

    /// Payment confirmation moves a `Received` order into the kitchen.
    pub fn confirm_payment(&mut self, now: DateTime<Utc>) -> Result<OrderStatus, OrderError> {
        if self.status != OrderStatus::Received {
            return Err(OrderError::NotAwaitingConfirmation(
                self.id.unwrap_or(OrderId(0)),
                self.status,
            ));
        }
        self.advance_status(now)
    }

    /// Set the identity on the order and every owned item.
    pub fn assign_id(&mut self, id: OrderId) {
        self.id = Some(id);
        for item in &mut self.items {
            item.order_id = Some(id);
        }
    }

    /// Record the version a repository stored this order under.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Draw a different ticket number before the order is persisted.
    pub fn renumber(&mut self, order_number: OrderNumber) {
        if self.id.is_none() {
            self.order_number = order_number;
        }
    }

    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn order_number(&self) -> OrderNumber {
        self.order_number
    }

    pub fn cpf(&self) -> Option<&Cpf> {
        self.cpf.as_ref()
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
