use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::ProductId;
use super::timestamp;

pub type OrderId = u64;

/// Lifecycle status of an order ("command" on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Wire name, also used as the `status` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Human label: first letter upper-case, rest lower-case.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// An order can be cancelled until it leaves the warehouse.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "invalid status '{}'. expected one of: PENDING | CONFIRMED | PROCESSING | SHIPPED | DELIVERED | CANCELLED",
                    s
                )
            })
    }
}

/// One line of an order as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, alias = "price")]
    pub unit_price: Option<f64>,
}

/// Payload line for replacing an order's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl FromStr for OrderItemRequest {
    type Err = String;

    /// Parses `PRODUCT_ID:QUANTITY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (product, quantity) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid item '{}'. expected PRODUCT_ID:QUANTITY", s))?;
        let product_id = product
            .trim()
            .parse()
            .map_err(|_| format!("invalid product id '{}'", product.trim()))?;
        let quantity: u32 = quantity
            .trim()
            .parse()
            .map_err(|_| format!("invalid quantity '{}'", quantity.trim()))?;
        if quantity == 0 {
            return Err("quantity must be at least 1".to_string());
        }
        Ok(Self { product_id, quantity })
    }
}

/// A customer order. Held by the client only as a read-only snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "commandId", alias = "id")]
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default, alias = "date", deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "totalPrice")]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub username: Option<String>,
}

impl Order {
    pub fn new(id: OrderId, status: OrderStatus) -> Self {
        Self {
            id,
            status,
            created_at: None,
            total_amount: None,
            items: Vec::new(),
            username: None,
        }
    }

    #[cfg(test)]
    pub fn created(mut self, raw: &str) -> Self {
        self.created_at = timestamp::parse_lenient(raw);
        self
    }

    #[cfg(test)]
    pub fn total(mut self, amount: f64) -> Self {
        self.total_amount = Some(amount);
        self
    }

    #[cfg(test)]
    pub fn owned_by(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[cfg(test)]
    pub fn with_item(mut self, product_id: ProductId, quantity: u32) -> Self {
        self.items.push(OrderItem {
            product_id,
            quantity,
            product_name: None,
            unit_price: None,
        });
        self
    }
}
