use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::cpf::Cpf;
use super::errors::OrderError;
use super::value_objects::{OrderItemRequest, ProductId};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Raw order request as received from a point of sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub cpf: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

impl OrderRequest {
    pub fn new(items: Vec<OrderItemRequest>) -> Self {
        Self { cpf: None, items }
    }

    pub fn with_cpf(mut self, cpf: impl Into<String>) -> Self {
        self.cpf = Some(cpf.into());
        self
    }

    /// Check the request's structure and turn it into a [`PlaceOrder`] command.
    ///
    /// Item checks run before the CPF so an empty request always reports
    /// [`OrderError::EmptyOrderItems`].
    pub fn validate(&self) -> Result<PlaceOrder, OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyOrderItems);
        }

        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity(item.product_id.clone()));
        }

        let cpf = match &self.cpf {
            Some(raw) => Some(Cpf::parse(raw).ok_or(OrderError::InvalidCpf)?),
            None => None,
        };

        Ok(PlaceOrder {
            cpf,
            items: self.items.clone(),
        })
    }
}

/// A structurally valid request: at least one item, positive quantities and
/// a checked CPF when one was given.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
    cpf: Option<Cpf>,
    items: Vec<OrderItemRequest>,
}

impl PlaceOrder {
    pub fn cpf(&self) -> Option<&Cpf> {
        self.cpf.as_ref()
    }

    pub fn items(&self) -> &[OrderItemRequest] {
        &self.items
    }

    /// Referenced product ids without duplicates, in first-seen order.
    pub fn distinct_product_ids(&self) -> Vec<ProductId> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|item| seen.insert(&item.product_id))
            .map(|item| item.product_id.clone())
            .collect()
    }

    pub(super) fn into_parts(self) -> (Option<Cpf>, Vec<OrderItemRequest>) {
        (self.cpf, self.items)
    }
}
