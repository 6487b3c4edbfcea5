//! Integration tests for the parallel dashboard load.

use std::sync::Arc;
use std::time::Duration;

use emporium_admin::services::dashboard::LOAD_FAILED_MESSAGE;
use emporium_admin::services::{DashboardAggregator, DashboardError, DashboardSection, NoticeLevel, RecordingNotifier};
use emporium_core::types::OrderStatus;
use emporium_integration_tests::MockBackend;

fn aggregator(backend: &MockBackend) -> (DashboardAggregator, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let client = backend.client(backend.signed_in_store());
    (DashboardAggregator::new(client, notifier.clone()), notifier)
}

#[tokio::test]
async fn test_loads_every_section() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (aggregator, notifier) = aggregator(&backend);

    let view = aggregator.load().await.expect("dashboard loads");

    assert!(view.is_complete());
    assert_eq!(view.products.len(), 4);
    assert_eq!(view.users.len(), 3);
    assert_eq!(view.orders.len(), 3);
    assert_eq!(view.wishlists.len(), 2);
    assert_eq!(view.categories.len(), 2);
    assert_eq!(view.stats.total_products, 4);

    let summary = view.summary();
    assert_eq!(summary.orders_with_status(OrderStatus::Pending), 1);
    assert_eq!(summary.unavailable_products, 1);
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn test_one_failing_source_leaves_the_others() {
    let backend = MockBackend::start().await.expect("mock starts");
    backend.state().fail_paths.insert("admin/users/".to_owned());
    let (aggregator, notifier) = aggregator(&backend);

    let view = aggregator.load().await.expect("partial load still succeeds");

    assert_eq!(view.failed_sections, [DashboardSection::Users]);
    assert!(view.users.is_empty());
    assert_eq!(view.products.len(), 4);
    assert_eq!(view.orders.len(), 3);
    assert_eq!(view.wishlists.len(), 2);
    assert_eq!(view.categories.len(), 2);
    // Partial failures are logged, not shown
    assert!(notifier.messages(NoticeLevel::Error).is_empty());
}

#[tokio::test]
async fn test_every_source_failing_is_an_error() {
    let backend = MockBackend::start().await.expect("mock starts");
    {
        let mut state = backend.state();
        for path in [
            "admin/analytics/stats/",
            "admin/products/",
            "admin/users/",
            "admin/orders/",
            "admin/wishlists/",
            "categories/",
        ] {
            state.fail_paths.insert(path.to_owned());
        }
    }
    let (aggregator, notifier) = aggregator(&backend);

    let err = aggregator.load().await.expect_err("nothing loaded");

    assert_eq!(err, DashboardError::AllSourcesFailed);
    assert_eq!(notifier.messages(NoticeLevel::Error), [LOAD_FAILED_MESSAGE]);
}

#[tokio::test]
async fn test_load_can_be_cancelled() {
    let backend = MockBackend::start().await.expect("mock starts");
    backend.state().delay = Some(Duration::from_secs(2));
    let (aggregator, _notifier) = aggregator(&backend);

    let result = aggregator
        .load_until(tokio::time::sleep(Duration::from_millis(50)))
        .await;

    assert_eq!(result.expect_err("cancelled"), DashboardError::Cancelled);
}

#[tokio::test]
async fn test_expired_token_refreshes_once_for_all_sources() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (aggregator, _notifier) = aggregator(&backend);
    backend.rotate_access_token();

    let view = aggregator.load().await.expect("dashboard loads");

    assert!(view.is_complete());
    assert_eq!(
        backend
            .state()
            .count(&axum::http::Method::POST, "auth/refresh/"),
        1
    );
}
