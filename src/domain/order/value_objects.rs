use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Surrogate identity assigned by the repository when an order is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Customer-facing ticket number in `[100000, 999999]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct OrderNumber(u32);

impl OrderNumber {
    pub const MIN: u32 = 100_000;
    pub const MAX: u32 = 999_999;

    pub fn new(value: u32) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Snap an arbitrary value into the valid range.
    pub fn clamped(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for OrderNumber {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!("order number {value} outside [{}, {}]", Self::MIN, Self::MAX)
        })
    }
}

impl From<OrderNumber> for u32 {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only snapshot of a product as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub is_active: bool,
}

/// Kitchen pipeline status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Received,
    InPreparation,
    Ready,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Received,
        OrderStatus::InPreparation,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Canceled,
    ];

    /// Next step of the preparation pipeline, `None` for terminal states.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Received => Some(OrderStatus::InPreparation),
            OrderStatus::InPreparation => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Canceled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Kitchen display priority, lower comes first. Terminal states are not monitored.
    pub fn monitor_priority(self) -> Option<u8> {
        match self {
            OrderStatus::Ready => Some(0),
            OrderStatus::InPreparation => Some(1),
            OrderStatus::Received => Some(2),
            OrderStatus::Completed | OrderStatus::Canceled => None,
        }
    }

    pub fn is_monitored(self) -> bool {
        self.monitor_priority().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Received => "Received",
            OrderStatus::InPreparation => "InPreparation",
            OrderStatus::Ready => "Ready",
            OrderStatus::Completed => "Completed",
            OrderStatus::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }
}

/// Line item owned by an [`Order`](super::Order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Back-reference to the parent, filled in once the parent is persisted.
    pub order_id: Option<OrderId>,
    /// Display snapshot of the product at creation time.
    pub product: Option<Product>,
}

/// Pagination window for listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub skip: usize,
    pub take: usize,
}

impl Page {
    pub const DEFAULT_TAKE: usize = 10;

    pub fn new(skip: usize, take: usize) -> Self {
        Self { skip, take }
    }

    pub fn clamped(self, max_take: usize) -> Self {
        Self {
            skip: self.skip,
            take: self.take.min(max_take),
        }
    }

    /// Cut this window out of an already ordered sequence.
    pub fn slice<T, I>(&self, items: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
    {
        items.into_iter().skip(self.skip).take(self.take).collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_TAKE)
    }
}

/// Compare two `(status, created_at)` keys for the kitchen display:
/// Ready, then InPreparation, then Received, oldest first inside each tier.
/// Unmonitored statuses sort last.
pub fn monitor_ordering<T: Ord>(a: (OrderStatus, T), b: (OrderStatus, T)) -> Ordering {
    let rank = |status: OrderStatus| status.monitor_priority().unwrap_or(u8::MAX);
    rank(a.0).cmp(&rank(b.0)).then_with(|| a.1.cmp(&b.1))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_deserialization_is_range_checked() {
        assert!(serde_json::from_str::<OrderNumber>("5").is_err());
        assert!(serde_json::from_str::<OrderNumber>("1000000").is_err());

        let number: OrderNumber = serde_json::from_str("123456").unwrap();
        assert_eq!(number.value(), 123_456);
        assert_eq!(serde_json::to_string(&number).unwrap(), "123456");
    }

    #[test]
    fn test_order_number_range() {
        assert!(OrderNumber::new(99_999).is_none());
        assert!(OrderNumber::new(1_000_000).is_none());
        assert_eq!(OrderNumber::new(100_000).unwrap().value(), 100_000);
        assert_eq!(OrderNumber::new(999_999).unwrap().value(), 999_999);
    }

    #[test]
    fn test_status_transition_is_total() {
        for status in OrderStatus::ALL {
            match status {
                OrderStatus::Completed | OrderStatus::Canceled => assert!(status.is_terminal()),
                _ => assert!(status.next().is_some()),
            }
        }
    }

    #[test]
    fn test_status_pipeline_order() {
        assert_eq!(OrderStatus::Received.next(), Some(OrderStatus::InPreparation));
        assert_eq!(OrderStatus::InPreparation.next(), Some(OrderStatus::Ready));
        assert_eq!(OrderStatus::Ready.next(), Some(OrderStatus::Completed));
    }

    #[test]
    fn test_order_status_serializes_as_name() {
        let json = serde_json::to_string(&OrderStatus::InPreparation).unwrap();
        assert_eq!(json, "\"InPreparation\"");
    }

    #[test]
    fn test_monitor_ordering_prefers_ready_then_oldest() {
        let mut keys = vec![
            (OrderStatus::Received, 1),
            (OrderStatus::Ready, 5),
            (OrderStatus::InPreparation, 2),
            (OrderStatus::Ready, 3),
            (OrderStatus::Received, 0),
        ];
        keys.sort_by(|a, b| monitor_ordering(*a, *b));

        assert_eq!(
            keys,
            vec![
                (OrderStatus::Ready, 3),
                (OrderStatus::Ready, 5),
                (OrderStatus::InPreparation, 2),
                (OrderStatus::Received, 0),
                (OrderStatus::Received, 1),
            ]
        );
    }

    #[test]
    fn test_page_clamp_and_slice() {
        let page = Page::new(1, 500).clamped(2);
        assert_eq!(page.take, 2);
        assert_eq!(page.slice(vec![1, 2, 3, 4]), vec![2, 3]);
        assert!(Page::new(10, 2).slice(vec![1, 2]).is_empty());
    }
}
