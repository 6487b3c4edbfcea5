//! Dashboard aggregation: six independent fetches merged into one view.
//!
//! Each source is fetched concurrently and guarded on its own: a failing
//! source is logged, recorded in [`DashboardView::failed_sections`] and
//! replaced by its empty default. Only when every source fails does the load
//! itself fail (and the operator get a notice).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use emporium_core::models::{AdminStats, Category, Order, Product, User, WishlistItem};
use emporium_core::types::OrderStatus;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use super::notify::Notifier;
use crate::api::{ApiClient, ApiError};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load dashboard data";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("Every dashboard source failed to load")]
    AllSourcesFailed,

    #[error("Dashboard load cancelled")]
    Cancelled,
}

/// One independently fetched part of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardSection {
    Stats,
    Products,
    Users,
    Orders,
    Wishlists,
    Categories,
}

impl DashboardSection {
    pub const ALL: [Self; 6] = [
        Self::Stats,
        Self::Products,
        Self::Users,
        Self::Orders,
        Self::Wishlists,
        Self::Categories,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Products => "products",
            Self::Users => "users",
            Self::Orders => "orders",
            Self::Wishlists => "wishlists",
            Self::Categories => "categories",
        }
    }
}

impl fmt::Display for DashboardSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the admin dashboard shows, as last loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub stats: AdminStats,
    pub products: Vec<Product>,
    pub users: Vec<User>,
    pub orders: Vec<Order>,
    pub wishlists: Vec<WishlistItem>,
    pub categories: Vec<Category>,
    /// Sources that failed and were replaced by defaults.
    pub failed_sections: Vec<DashboardSection>,
}

impl DashboardView {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_sections.is_empty()
    }

    #[must_use]
    pub fn section_failed(&self, section: DashboardSection) -> bool {
        self.failed_sections.contains(&section)
    }

    #[must_use]
    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary::from_view(self)
    }
}

/// Stat-card figures derived from a [`DashboardView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Server totals when the stats source loaded, else counted locally.
    pub total_products: u64,
    pub total_orders: u64,
    pub total_users: u64,
    /// Sum of non-cancelled order amounts.
    pub revenue: Decimal,
    /// One entry per status, in [`OrderStatus::ALL`] order.
    pub orders_by_status: Vec<(OrderStatus, usize)>,
    pub active_users: usize,
    pub low_stock_products: usize,
    pub unavailable_products: usize,
}

impl DashboardSummary {
    #[must_use]
    pub fn from_view(view: &DashboardView) -> Self {
        let count = |n: usize| u64::try_from(n).unwrap_or(u64::MAX);
        let (total_products, total_orders, total_users) = if view.section_failed(DashboardSection::Stats) {
            (
                count(view.products.len()),
                count(view.orders.len()),
                count(view.users.len()),
            )
        } else {
            (
                view.stats.total_products,
                view.stats.total_orders,
                view.stats.total_users,
            )
        };

        Self {
            total_products,
            total_orders,
            total_users,
            revenue: view
                .orders
                .iter()
                .filter(|o| o.status != OrderStatus::Cancelled)
                .map(Order::amount)
                .sum(),
            orders_by_status: OrderStatus::ALL
                .iter()
                .map(|&s| (s, view.orders.iter().filter(|o| o.status == s).count()))
                .collect(),
            active_users: view.users.iter().filter(|u| u.is_active).count(),
            low_stock_products: view.products.iter().filter(|p| p.is_low_stock()).count(),
            unavailable_products: view.products.iter().filter(|p| !p.available).count(),
        }
    }

    #[must_use]
    pub fn orders_with_status(&self, status: OrderStatus) -> usize {
        self.orders_by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    }
}

/// Loads a [`DashboardView`] from the admin endpoints.
#[derive(Clone)]
pub struct DashboardAggregator {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl DashboardAggregator {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Fetch every source concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::AllSourcesFailed`] only when no source
    /// loaded; partial failures are reported in the view.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<DashboardView, DashboardError> {
        let (stats, products, users, orders, wishlists, categories) = tokio::join!(
            self.api.admin_stats(),
            self.api.admin_products(),
            self.api.admin_users(),
            self.api.admin_orders(),
            self.api.admin_wishlists(),
            self.api.categories(),
        );

        let mut failed = Vec::new();
        let view = DashboardView {
            stats: settle(DashboardSection::Stats, stats, &mut failed),
            products: settle(DashboardSection::Products, products, &mut failed),
            users: settle(DashboardSection::Users, users, &mut failed),
            orders: settle(DashboardSection::Orders, orders, &mut failed),
            wishlists: settle(DashboardSection::Wishlists, wishlists, &mut failed),
            categories: settle(DashboardSection::Categories, categories, &mut failed),
            failed_sections: failed,
        };

        if view.failed_sections.len() == DashboardSection::ALL.len() {
            tracing::error!("All dashboard sources failed");
            self.notifier.error(LOAD_FAILED_MESSAGE);
            return Err(DashboardError::AllSourcesFailed);
        }

        tracing::info!(
            products = view.products.len(),
            users = view.users.len(),
            orders = view.orders.len(),
            wishlists = view.wishlists.len(),
            categories = view.categories.len(),
            failed = view.failed_sections.len(),
            "Dashboard data loaded"
        );
        Ok(view)
    }

    /// [`Self::load`], abandoned as soon as `cancel` completes.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Cancelled`] if `cancel` finishes first.
    pub async fn load_until<C>(&self, cancel: C) -> Result<DashboardView, DashboardError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                tracing::info!("Dashboard load cancelled");
                Err(DashboardError::Cancelled)
            }
            result = self.load() => result,
        }
    }
}

impl fmt::Debug for DashboardAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardAggregator")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

/// Unwrap one source, or log it and fall back to the default.
fn settle<T: Default>(section: DashboardSection, result: Result<T, ApiError>, failed: &mut Vec<DashboardSection>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(section = %section, error = %e, "Failed to fetch dashboard section");
            failed.push(section);
            T::default()
        }
    }
}
