use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProductRef, UserRef, nullable};
use crate::types::{OrderId, OrderItemId, OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing reference (`ORD-...`), distinct from the primary key.
    #[serde(default, deserialize_with = "nullable")]
    pub order_id: String,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "nullable")]
    pub total_amount: Decimal,
    #[serde(default, deserialize_with = "nullable")]
    pub discount_amount: Decimal,
    #[serde(default, deserialize_with = "nullable")]
    pub final_amount: Decimal,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_method: String,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub shipping_address: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// What the customer pays: `final_amount` when set, else `total_amount`.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        if self.final_amount.is_zero() {
            self.total_amount
        } else {
            self.final_amount
        }
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    #[serde(default)]
    pub product: ProductRef,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub price: Decimal,
    #[serde(default)]
    pub free_quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}
