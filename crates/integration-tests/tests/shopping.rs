//! Integration tests for checkout, the shopper's orders, saved lists,
//! reviews, the account, and the admin compare and analytics panels.

use std::sync::Arc;

use axum::http::Method;
use emporium_admin::ApiError;
use emporium_admin::api::{CheckoutRequest, NewReview, ProfileUpdate, RegisterRequest};
use emporium_admin::services::{
    AdminConsole, AlwaysConfirm, Confirm, NeverConfirm, NoticeLevel, OrderService, RecordingNotifier, ServiceError,
    ShopperService,
};
use emporium_admin::MemoryStore;
use emporium_core::forms::FormError;
use emporium_core::types::{CompareItemId, OrderId, OrderStatus, ProductId, TransitionPolicy};
use emporium_integration_tests::{MockBackend, fixtures};
use rust_decimal::Decimal;
use secrecy::SecretString;

fn order_service(backend: &MockBackend, confirm: Arc<dyn Confirm>) -> (OrderService, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let client = backend.client(backend.signed_in_store());
    (OrderService::new(client, notifier.clone(), confirm), notifier)
}

fn shopper(backend: &MockBackend) -> (ShopperService, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let client = backend.client(backend.signed_in_store());
    (ShopperService::new(client, notifier.clone()), notifier)
}

fn console(backend: &MockBackend, confirm: Arc<dyn Confirm>) -> (AdminConsole, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let client = backend.client(backend.signed_in_store());
    (
        AdminConsole::new(client, notifier.clone(), confirm, TransitionPolicy::Permissive),
        notifier,
    )
}

fn registration(username: &str, password: &str, confirm: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_owned(),
        email: format!("{username}@shop.test"),
        first_name: String::new(),
        last_name: String::new(),
        password: SecretString::from(password.to_owned()),
        password_confirm: SecretString::from(confirm.to_owned()),
    }
}

// ============================================================================
// Checkout and orders
// ============================================================================

#[tokio::test]
async fn test_checkout_empty_cart_shows_backend_message() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (mut orders, notifier) = order_service(&backend, Arc::new(AlwaysConfirm));

    let err = orders
        .checkout(&CheckoutRequest::default())
        .await
        .expect_err("empty cart");

    assert!(matches!(err, ServiceError::Api(ApiError::Api { status: 400, .. })));
    assert_eq!(notifier.messages(NoticeLevel::Error), ["Cart is empty!"]);
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let backend = MockBackend::start().await.expect("mock starts");
    backend.state().fill_cart(&[1, 2]);
    let (mut orders, notifier) = order_service(&backend, Arc::new(AlwaysConfirm));

    let order = orders
        .checkout(&CheckoutRequest {
            payment_method: Some("Cash on Delivery".into()),
            ..CheckoutRequest::default()
        })
        .await
        .expect("placed");

    assert_eq!(order.order_id, "ORD-0004");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.item_count(), 2);
    assert_eq!(order.payment_method, "Cash on Delivery");
    assert!(backend.state().cart_items.is_empty());
    assert_eq!(
        notifier.messages(NoticeLevel::Success),
        ["Order ORD-0004 placed successfully!"]
    );
}

#[tokio::test]
async fn test_signed_out_checkout_sends_nothing() {
    let backend = MockBackend::start().await.expect("mock starts");
    let notifier = Arc::new(RecordingNotifier::new());
    let client = backend.client(Arc::new(MemoryStore::new()));
    let mut orders = OrderService::new(client, notifier.clone(), Arc::new(AlwaysConfirm));

    let err = orders
        .checkout(&CheckoutRequest::default())
        .await
        .expect_err("signed out");

    assert!(matches!(err, ServiceError::Api(ApiError::Unauthorized)));
    assert!(backend.state().requests.is_empty());
    assert_eq!(notifier.messages(NoticeLevel::Warning), ["Please login to checkout"]);
}

#[tokio::test]
async fn test_shipped_order_is_refused_locally() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (mut orders, notifier) = order_service(&backend, Arc::new(AlwaysConfirm));
    orders.refresh().await.expect("history loads");

    let err = orders.cancel(OrderId::new(2)).await.expect_err("shipped");

    assert!(matches!(err, ServiceError::NotCancellable(OrderStatus::Shipped)));
    assert_eq!(backend.state().count(&Method::POST, "orders/2/cancel/"), 0);
    assert_eq!(notifier.messages(NoticeLevel::Error), [err.to_string()]);
}

#[tokio::test]
async fn test_declined_cancel_sends_nothing() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (mut orders, _notifier) = order_service(&backend, Arc::new(NeverConfirm));
    orders.refresh().await.expect("history loads");

    let err = orders.cancel(OrderId::new(1)).await.expect_err("declined");

    assert!(matches!(err, ServiceError::NotConfirmed(_)));
    assert!(backend.state().mutations().is_empty());
}

#[tokio::test]
async fn test_cancel_pending_order_reports_refund_and_refetches() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (mut orders, notifier) = order_service(&backend, Arc::new(AlwaysConfirm));
    orders.refresh().await.expect("history loads");

    let response = orders.cancel(OrderId::new(1)).await.expect("cancelled");

    assert!(response.success);
    assert!(response.refund_amount.is_some());
    let cancelled = orders
        .orders()
        .iter()
        .find(|o| o.id == OrderId::new(1))
        .expect("still listed");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(backend.state().count(&Method::GET, "orders/"), 2);
    let success = notifier.messages(NoticeLevel::Success);
    assert_eq!(success.len(), 1);
    assert!(success[0].starts_with("Order cancelled successfully! Refund of ₹"));
    assert!(success[0].ends_with("will be processed within 3-5 business days."));
}

#[tokio::test]
async fn test_unknown_order_is_not_cancelled() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (mut orders, _notifier) = order_service(&backend, Arc::new(AlwaysConfirm));

    let err = orders.cancel(OrderId::new(1)).await.expect_err("history not loaded");

    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(backend.state().requests.is_empty());
}

#[tokio::test]
async fn test_track_by_reference() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (orders, notifier) = order_service(&backend, Arc::new(AlwaysConfirm));

    let order = orders.track(" ORD-0002 ").await.expect("found");
    assert_eq!(order.status, OrderStatus::Shipped);

    orders.track("ORD-9999").await.expect_err("unknown");
    assert_eq!(notifier.messages(NoticeLevel::Error), ["Order not found"]);
}

// ============================================================================
// Wishlist and compare
// ============================================================================

#[tokio::test]
async fn test_wishlist_add_twice_then_remove() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (shopper, notifier) = shopper(&backend);

    shopper.add_to_wishlist("usb-c-cable").await.expect("added");
    shopper.add_to_wishlist("usb-c-cable").await.expect("already there");

    assert_eq!(shopper.wishlist().await.expect("listed").len(), 1);
    assert_eq!(notifier.messages(NoticeLevel::Info), ["Item already in wishlist"]);

    shopper.remove_from_wishlist(ProductId::new(1)).await.expect("removed");
    assert!(shopper.wishlist().await.expect("listed").is_empty());
    assert_eq!(
        notifier.messages(NoticeLevel::Success),
        ["USB C Cable added to wishlist!", "Item removed from wishlist!"]
    );
}

#[tokio::test]
async fn test_compare_holds_four_products() {
    let backend = MockBackend::start().await.expect("mock starts");
    backend
        .state()
        .products
        .push(fixtures::product(5, "Optical Cable", "199.00", 9, true, "cables"));
    let (shopper, notifier) = shopper(&backend);

    for id in 1..=4 {
        shopper.add_to_compare(ProductId::new(id)).await.expect("room left");
    }
    let err = shopper.add_to_compare(ProductId::new(5)).await.expect_err("full");

    assert!(matches!(err, ServiceError::Api(ApiError::Api { status: 400, .. })));
    assert_eq!(
        notifier.messages(NoticeLevel::Error),
        ["You can compare maximum 4 products at a time!"]
    );
    assert_eq!(shopper.compare_list().await.expect("listed").len(), 4);
}

#[tokio::test]
async fn test_compare_duplicate_is_info() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (shopper, notifier) = shopper(&backend);

    let listed = shopper.add_to_compare(ProductId::new(2)).await.expect("added");
    assert_eq!(listed.len(), 1);
    shopper.add_to_compare(ProductId::new(2)).await.expect("already there");

    assert_eq!(notifier.messages(NoticeLevel::Info), ["HDMI Cable already in compare list!"]);

    shopper.clear_compare().await.expect("cleared");
    assert!(backend.state().compare_items.is_empty());
}

// ============================================================================
// Reviews and account
// ============================================================================

#[tokio::test]
async fn test_out_of_range_rating_sends_nothing() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (shopper, notifier) = shopper(&backend);
    let review = NewReview {
        rating: 6,
        comment: "Too good".into(),
    };

    let err = shopper.add_review(ProductId::new(1), &review).await.expect_err("rating");

    assert!(matches!(err, ServiceError::Form(FormError::RatingOutOfRange)));
    assert!(backend.state().requests.is_empty());
    assert_eq!(notifier.messages(NoticeLevel::Error), ["Rating must be between 1 and 5"]);
}

#[tokio::test]
async fn test_review_is_added() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (shopper, notifier) = shopper(&backend);
    let review = NewReview {
        rating: 4,
        comment: "Sturdy".into(),
    };

    let saved = shopper.add_review(ProductId::new(1), &review).await.expect("added");

    assert_eq!(saved.rating, 4);
    assert_eq!(shopper.reviews(ProductId::new(1)).await.expect("listed").len(), 2);
    assert_eq!(notifier.messages(NoticeLevel::Success), ["Review added successfully!"]);
}

#[tokio::test]
async fn test_password_mismatch_sends_nothing() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (shopper, notifier) = shopper(&backend);

    let err = shopper
        .register(&registration("meera", "one-password", "another"))
        .await
        .expect_err("mismatch");

    assert!(matches!(err, ServiceError::Form(FormError::PasswordMismatch)));
    assert!(backend.state().requests.is_empty());
    assert_eq!(notifier.messages(NoticeLevel::Error), ["Passwords do not match"]);
}

#[tokio::test]
async fn test_duplicate_username_shows_backend_message() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (shopper, notifier) = shopper(&backend);

    shopper
        .register(&registration("asha", "pw-12345", "pw-12345"))
        .await
        .expect_err("taken");

    assert_eq!(notifier.messages(NoticeLevel::Error), ["Username already exists"]);
}

#[tokio::test]
async fn test_register_signs_in() {
    let backend = MockBackend::start().await.expect("mock starts");
    let notifier = Arc::new(RecordingNotifier::new());
    let client = backend.client(Arc::new(MemoryStore::new()));
    let shopper = ShopperService::new(client.clone(), notifier.clone());

    let user = shopper
        .register(&registration("meera", "pw-12345", "pw-12345"))
        .await
        .expect("registered");

    assert_eq!(user.username, "meera");
    assert_eq!(
        client.current_user().expect("store readable").map(|u| u.username),
        Some("meera".to_owned())
    );
    assert_eq!(notifier.messages(NoticeLevel::Success), ["Registration successful!"]);
}

#[tokio::test]
async fn test_profile_update_sends_only_given_fields() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (shopper, notifier) = shopper(&backend);

    let user = shopper
        .update_profile(&ProfileUpdate {
            first_name: Some("Ada".into()),
            ..ProfileUpdate::default()
        })
        .await
        .expect("updated");

    assert_eq!(user.first_name, "Ada");
    assert_eq!(user.email, "admin@example.com");
    assert_eq!(notifier.messages(NoticeLevel::Success), ["Profile updated successfully!"]);
}

// ============================================================================
// Admin compares and analytics
// ============================================================================

#[tokio::test]
async fn test_admin_compare_removal_asks_first() {
    let backend = MockBackend::start().await.expect("mock starts");
    let product = fixtures::products()[0].clone();
    backend
        .state()
        .compare_items
        .push(fixtures::saved_item(1, "asha", &product));

    let (declining, _notifier) = console(&backend, Arc::new(NeverConfirm));
    declining
        .remove_compare_item(CompareItemId::new(1))
        .await
        .expect_err("declined");
    assert!(backend.state().mutations().is_empty());

    let (admin, notifier) = console(&backend, Arc::new(AlwaysConfirm));
    assert_eq!(admin.compares().await.expect("listed").len(), 1);
    admin
        .remove_compare_item(CompareItemId::new(1))
        .await
        .expect("removed");
    assert!(backend.state().compare_items.is_empty());
    assert_eq!(
        notifier.messages(NoticeLevel::Success),
        ["Compare item removed successfully"]
    );
}

#[tokio::test]
async fn test_analytics_counts_cancellations() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (admin, _notifier) = console(&backend, Arc::new(AlwaysConfirm));

    let summary = admin.analytics().await.expect("loaded");

    assert_eq!(summary.cancelled_orders, 1);
    assert_eq!(summary.completed_orders_count, 2);
    assert!(summary.total_refunds > Decimal::ZERO);
}

#[tokio::test]
async fn test_failed_analytics_notifies() {
    let backend = MockBackend::start().await.expect("mock starts");
    backend
        .state()
        .fail_paths
        .insert("admin/analytics/dashboard/".to_owned());
    let (admin, notifier) = console(&backend, Arc::new(AlwaysConfirm));

    admin.analytics().await.expect_err("server fails");

    assert_eq!(notifier.messages(NoticeLevel::Error), ["Failed to load analytics"]);
}
