use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::nullable;

/// Headline counters from `/admin/analytics/stats/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub total_revenue: Decimal,
}
