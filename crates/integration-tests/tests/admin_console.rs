//! Integration tests for admin CRUD: validation, confirmation, optimistic
//! updates and rollback.

use std::sync::Arc;

use axum::http::Method;
use emporium_admin::ApiError;
use emporium_admin::services::{AdminConsole, AlwaysConfirm, Confirm, NeverConfirm, NoticeLevel, RecordingNotifier, ServiceError};
use emporium_core::forms::{CategoryDraft, FormError, ProductDraft, UserDraft};
use emporium_core::types::{OrderId, OrderStatus, ProductId, TransitionPolicy, UserId, WishlistItemId};
use emporium_integration_tests::MockBackend;

struct Harness {
    backend: MockBackend,
    console: AdminConsole,
    notifier: Arc<RecordingNotifier>,
}

async fn loaded(confirm: Arc<dyn Confirm>, policy: TransitionPolicy) -> Harness {
    let backend = MockBackend::start().await.expect("mock starts");
    let notifier = Arc::new(RecordingNotifier::new());
    let client = backend.client(backend.signed_in_store());
    let mut console = AdminConsole::new(client, notifier.clone(), confirm, policy);
    console.refresh().await.expect("dashboard loads");
    backend.state().requests.clear();

    Harness {
        backend,
        console,
        notifier,
    }
}

async fn permissive() -> Harness {
    loaded(Arc::new(AlwaysConfirm), TransitionPolicy::Permissive).await
}

fn order_status(harness: &Harness, id: i64) -> OrderStatus {
    harness
        .console
        .view()
        .orders
        .iter()
        .find(|o| o.id == OrderId::new(id))
        .map(|o| o.status)
        .expect("order loaded")
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_order_status_update_succeeds() {
    let mut h = permissive().await;

    let update = h
        .console
        .update_order_status(OrderId::new(1), OrderStatus::Confirmed)
        .await
        .expect("updated");

    assert_eq!(update.new_status, OrderStatus::Confirmed);
    assert_eq!(order_status(&h, 1), OrderStatus::Confirmed);
    assert_eq!(
        h.notifier.messages(NoticeLevel::Success),
        ["Order confirmed successfully"]
    );
}

#[tokio::test]
async fn test_order_status_failure_rolls_back() {
    let mut h = permissive().await;
    h.backend
        .state()
        .fail_paths
        .insert("admin/orders/update/1/".to_owned());

    let err = h
        .console
        .update_order_status(OrderId::new(1), OrderStatus::Shipped)
        .await
        .expect_err("server refused");

    assert!(matches!(err, ServiceError::Api(ApiError::Api { status: 500, .. })));
    assert_eq!(order_status(&h, 1), OrderStatus::Pending);
    let last = h.notifier.last().expect("a notice");
    assert_eq!(last.level, NoticeLevel::Error);
    assert_eq!(last.message, "Internal server error");
}

#[tokio::test]
async fn test_strict_policy_rejects_before_any_request() {
    let mut h = loaded(Arc::new(AlwaysConfirm), TransitionPolicy::Strict).await;

    // Order 2 is shipped; shipped -> pending is outside the flow
    let err = h
        .console
        .update_order_status(OrderId::new(2), OrderStatus::Pending)
        .await
        .expect_err("rejected");

    assert!(matches!(
        err,
        ServiceError::InvalidTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Pending
        }
    ));
    assert!(h.backend.state().requests.is_empty());
    assert_eq!(order_status(&h, 2), OrderStatus::Shipped);
    assert_eq!(h.notifier.messages(NoticeLevel::Error).len(), 1);
}

#[tokio::test]
async fn test_permissive_policy_sends_out_of_flow_moves() {
    let mut h = permissive().await;

    h.console
        .update_order_status(OrderId::new(2), OrderStatus::Pending)
        .await
        .expect("sent anyway");

    assert_eq!(h.backend.state().count(&Method::PUT, "admin/orders/update/2/"), 1);
    assert_eq!(order_status(&h, 2), OrderStatus::Pending);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_invalid_product_draft_makes_no_request() {
    let mut h = permissive().await;
    let draft = ProductDraft {
        name: "  ".to_owned(),
        price: "100".to_owned(),
        category: "cables".to_owned(),
        ..ProductDraft::default()
    };

    let err = h.console.save_product(None, &draft).await.expect_err("invalid");

    assert!(matches!(err, ServiceError::Form(FormError::NameAndPriceRequired)));
    assert!(h.backend.state().requests.is_empty());
    assert_eq!(
        h.notifier.messages(NoticeLevel::Error),
        ["Name and price are required"]
    );
}

#[tokio::test]
async fn test_create_product_refetches_list() {
    let mut h = permissive().await;
    let draft = ProductDraft {
        name: "Lightning Cable".to_owned(),
        price: "349".to_owned(),
        stock: "15".to_owned(),
        category: "cables".to_owned(),
        ..ProductDraft::default()
    };

    let product = h.console.save_product(None, &draft).await.expect("created");

    assert_eq!(product.name, "Lightning Cable");
    assert_eq!(h.console.view().products.len(), 5);
    let state = h.backend.state();
    assert_eq!(state.count(&Method::POST, "admin/products/create/"), 1);
    assert_eq!(state.count(&Method::GET, "admin/products/"), 1);
    drop(state);
    assert_eq!(
        h.notifier.messages(NoticeLevel::Success),
        ["Product created successfully"]
    );
}

#[tokio::test]
async fn test_toggle_product_flips_availability() {
    let mut h = permissive().await;

    let available = h.console.toggle_product(ProductId::new(3)).await.expect("toggled");

    assert!(available);
    let product = h
        .console
        .view()
        .products
        .iter()
        .find(|p| p.id == ProductId::new(3))
        .expect("loaded");
    assert!(product.available);
}

#[tokio::test]
async fn test_toggle_product_failure_rolls_back() {
    let mut h = permissive().await;
    h.backend
        .state()
        .fail_paths
        .insert("admin/products/toggle/1/".to_owned());

    h.console
        .toggle_product(ProductId::new(1))
        .await
        .expect_err("server refused");

    let product = h
        .console
        .view()
        .products
        .iter()
        .find(|p| p.id == ProductId::new(1))
        .expect("loaded");
    assert!(product.available);
    assert_eq!(
        h.notifier.messages(NoticeLevel::Error),
        ["Failed to update product status"]
    );
}

#[tokio::test]
async fn test_declined_delete_makes_no_request() {
    let mut h = loaded(Arc::new(NeverConfirm), TransitionPolicy::Permissive).await;

    let err = h
        .console
        .delete_product(ProductId::new(1))
        .await
        .expect_err("declined");

    assert!(matches!(err, ServiceError::NotConfirmed(_)));
    assert!(h.backend.state().mutations().is_empty());
    assert_eq!(h.console.view().products.len(), 4);
}

#[tokio::test]
async fn test_confirmed_delete_removes_locally() {
    let prompts = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
    let seen = Arc::clone(&prompts);
    let confirm = move |prompt: &str| {
        seen.lock().expect("not poisoned").push(prompt.to_owned());
        true
    };
    let mut h = loaded(Arc::new(confirm), TransitionPolicy::Permissive).await;

    h.console.delete_product(ProductId::new(2)).await.expect("deleted");

    assert_eq!(
        *prompts.lock().expect("not poisoned"),
        ["Are you sure you want to delete this product?"]
    );
    assert!(h.console.view().products.iter().all(|p| p.id != ProductId::new(2)));
    assert_eq!(h.backend.state().count(&Method::DELETE, "admin/products/delete/2/"), 1);
}

// ============================================================================
// Users, categories, wishlists
// ============================================================================

#[tokio::test]
async fn test_new_user_requires_password() {
    let mut h = permissive().await;
    let draft = UserDraft {
        username: "meera".to_owned(),
        email: "meera@example.com".to_owned(),
        ..UserDraft::default()
    };

    let err = h.console.save_user(&draft).await.expect_err("invalid");

    assert!(matches!(err, ServiceError::Form(FormError::PasswordRequired)));
    assert!(h.backend.state().requests.is_empty());
}

#[tokio::test]
async fn test_ban_marks_user_inactive() {
    let mut h = permissive().await;

    h.console.ban_user(UserId::new(2)).await.expect("banned");

    let user = h
        .console
        .view()
        .users
        .iter()
        .find(|u| u.id == UserId::new(2))
        .expect("loaded");
    assert!(!user.is_active);
    assert_eq!(h.notifier.messages(NoticeLevel::Success), ["User banned successfully"]);
}

#[tokio::test]
async fn test_create_category_derives_slug() {
    let mut h = permissive().await;
    let draft = CategoryDraft {
        name: "Phone Cases & Covers".to_owned(),
        ..CategoryDraft::default()
    };

    let category = h.console.save_category(&draft).await.expect("created");

    assert_eq!(category.slug, "phone-cases-covers");
    assert_eq!(h.console.view().categories.len(), 3);
}

#[tokio::test]
async fn test_remove_wishlist_item() {
    let mut h = permissive().await;

    h.console
        .remove_wishlist_item(WishlistItemId::new(1))
        .await
        .expect("removed");

    assert_eq!(h.console.view().wishlists.len(), 1);
    assert_eq!(
        h.notifier.messages(NoticeLevel::Success),
        ["Wishlist item removed successfully"]
    );
}
