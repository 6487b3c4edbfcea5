//! Admin and storefront workflows on top of the API client.
//!
//! # Services
//!
//! - `console` - Admin CRUD over the dashboard lists (validate, confirm, submit, refetch)
//! - `dashboard` - Parallel, independently guarded dashboard load
//! - `cart` - Cart operations with availability checks
//! - `offers` - Applying offers to the cart, and the admin offer table
//! - `orders` - Checkout, order history, tracking and cancellation
//! - `shopper` - Wishlist, compare list, reviews and account
//! - `recommendations` - Home shelves from the API, simulator fallback
//! - `history` - Recent searches and the interaction log
//! - `optimistic` - Apply-then-reconcile helper
//! - `notify` / `confirm` - Operator notices and delete confirmation

pub mod cart;
pub mod confirm;
pub mod console;
pub mod dashboard;
pub mod history;
pub mod notify;
pub mod offers;
pub mod optimistic;
pub mod orders;
pub mod recommendations;
pub mod shopper;

pub use cart::CartService;
pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm};
pub use console::AdminConsole;
pub use dashboard::{DashboardAggregator, DashboardError, DashboardSection, DashboardSummary, DashboardView};
pub use history::HistoryService;
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use offers::{OfferDesk, OfferService};
pub use optimistic::apply_then_reconcile;
pub use orders::OrderService;
pub use recommendations::{RecommendationService, RecommendationSource, Recommendations};
pub use shopper::ShopperService;

use emporium_core::forms::FormError;
use emporium_core::types::{OrderStatus, format_currency};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::storage::StorageError;

/// Errors from service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Rejected before any request was sent.
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The operator declined the confirmation prompt.
    #[error("Cancelled: {0}")]
    NotConfirmed(String),

    /// Refused by the strict transition policy.
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The id is not in the loaded list.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("This product is currently unavailable")]
    Unavailable,

    #[error("This product is out of stock")]
    OutOfStock,

    #[error("This offer is already applied to your cart")]
    OfferAlreadyApplied,

    #[error("Minimum order value of {} required", format_currency(*.min_order_value))]
    MinimumOrderNotMet { min_order_value: Decimal },

    /// Shipped, delivered and cancelled orders stay as they are.
    #[error("Order cannot be cancelled once {0}")]
    NotCancellable(OrderStatus),
}

/// Turn signed-out callers away before any request, with a warning notice.
pub(crate) fn require_session(api: &ApiClient, notifier: &dyn notify::Notifier, message: &str) -> Result<(), ServiceError> {
    if api.tokens().access_token()?.is_some() {
        return Ok(());
    }
    tracing::debug!(message, "No session");
    notifier.warning(message);
    Err(ApiError::Unauthorized.into())
}

/// The backend's own message for a rejected request, if it sent one.
pub(crate) fn backend_message(error: &ApiError) -> Option<String> {
    match error {
        ApiError::Api { message, .. } if !message.is_empty() => Some(message.clone()),
        _ => None,
    }
}
