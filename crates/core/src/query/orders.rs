use std::cmp::Ordering;
use std::str::FromStr;

use super::{Criteria, contains_folded, normalize_search};
use crate::models::Order;
use crate::types::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderStatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl FromStr for OrderStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            other => other
                .parse()
                .map(Self::Only)
                .map_err(|e: crate::types::OrderStatusError| e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    #[default]
    Recent,
    Oldest,
    AmountHigh,
    AmountLow,
}

impl FromStr for OrderSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "recent" => Ok(Self::Recent),
            "oldest" => Ok(Self::Oldest),
            "amount_high" => Ok(Self::AmountHigh),
            "amount_low" => Ok(Self::AmountLow),
            other => Err(format!("unknown order sort: {other}")),
        }
    }
}

/// Search and filter state of the order table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderQuery {
    /// Matches the order reference, customer first name or email.
    pub search: String,
    pub status: OrderStatusFilter,
    pub sort: OrderSort,
}

impl Criteria<Order> for OrderQuery {
    fn matches(&self, order: &Order) -> bool {
        if let Some(term) = normalize_search(&self.search) {
            let (first_name, email) = order
                .user
                .as_ref()
                .map_or(("", ""), |u| (u.first_name(), u.email()));
            let hit = contains_folded(&order.order_id, &term)
                || contains_folded(first_name, &term)
                || contains_folded(email, &term);
            if !hit {
                return false;
            }
        }
        match self.status {
            OrderStatusFilter::All => true,
            OrderStatusFilter::Only(status) => order.status == status,
        }
    }

    fn compare(&self, a: &Order, b: &Order) -> Ordering {
        match self.sort {
            OrderSort::Recent => b.created_at.cmp(&a.created_at),
            OrderSort::Oldest => a.created_at.cmp(&b.created_at),
            OrderSort::AmountHigh => b.amount().cmp(&a.amount()),
            OrderSort::AmountLow => a.amount().cmp(&b.amount()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{UserRef, UserSummary};
    use crate::query::filter_sort;
    use crate::types::OrderId;

    fn order(id: i64, status: OrderStatus, total: i64, final_amount: i64, name: &str) -> Order {
        Order {
            id: OrderId::new(id),
            order_id: format!("ORD-{id:04}"),
            user: Some(UserRef::Summary(UserSummary {
                first_name: name.to_owned(),
                email: format!("{}@shop.test", name.to_lowercase()),
                ..UserSummary::default()
            })),
            items: Vec::new(),
            status,
            total_amount: Decimal::from(total),
            discount_amount: Decimal::ZERO,
            final_amount: Decimal::from(final_amount),
            payment_method: String::new(),
            payment_status: String::new(),
            shipping_address: String::new(),
            created_at: Utc.timestamp_opt(1_700_000_000 + id * 3600, 0).single(),
        }
    }

    fn orders() -> Vec<Order> {
        vec![
            order(1, OrderStatus::Pending, 500, 450, "Asha"),
            order(2, OrderStatus::Shipped, 900, 0, "Ravi"),
            order(3, OrderStatus::Pending, 100, 0, "Meera"),
            order(4, OrderStatus::Cancelled, 700, 650, "asha"),
        ]
    }

    #[test]
    fn test_search_covers_reference_name_and_email() {
        let by_name = OrderQuery {
            search: "ASHA".into(),
            ..OrderQuery::default()
        };
        assert_eq!(filter_sort(&orders(), &by_name).len(), 2);

        let by_ref = OrderQuery {
            search: "ord-0003".into(),
            ..OrderQuery::default()
        };
        assert_eq!(filter_sort(&orders(), &by_ref)[0].id, OrderId::new(3));

        let by_email = OrderQuery {
            search: "ravi@".into(),
            ..OrderQuery::default()
        };
        assert_eq!(filter_sort(&orders(), &by_email).len(), 1);
    }

    #[test]
    fn test_status_filter() {
        let query = OrderQuery {
            status: "pending".parse().unwrap(),
            ..OrderQuery::default()
        };
        let hits = filter_sort(&orders(), &query);
        assert!(hits.iter().all(|o| o.status == OrderStatus::Pending));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_amount_sort_uses_final_then_total() {
        let query = OrderQuery {
            sort: OrderSort::AmountHigh,
            ..OrderQuery::default()
        };
        let ids: Vec<i64> = filter_sort(&orders(), &query).iter().map(|o| o.id.get()).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_recent_and_oldest() {
        let recent = filter_sort(&orders(), &OrderQuery::default());
        assert_eq!(recent[0].id, OrderId::new(4));
        let oldest = filter_sort(
            &orders(),
            &OrderQuery {
                sort: OrderSort::Oldest,
                ..OrderQuery::default()
            },
        );
        assert_eq!(oldest[0].id, OrderId::new(1));
    }
}
