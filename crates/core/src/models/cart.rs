use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, nullable};
use crate::types::{CartId, CartItemId, ProductId};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub id: Option<CartId>,
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<CartItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub total_price: Decimal,
    #[serde(default, deserialize_with = "nullable")]
    pub discounted_total: Decimal,
}

impl Cart {
    /// Badge count: total units, not distinct lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    #[must_use]
    pub fn find_product(&self, product: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product.id == product)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product: Product,
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_count_sums_quantities() {
        let cart: Cart = serde_json::from_str(
            r#"{"id":1,"total_price":"300.00","items":[
                {"id":1,"quantity":2,"product":{"id":5,"name":"Case","price":"100.00"}},
                {"id":2,"quantity":1,"product":{"id":6,"name":"Film","price":"100.00"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(cart.item_count(), 3);
        assert!(cart.find_product(ProductId::new(6)).is_some());
    }
}
