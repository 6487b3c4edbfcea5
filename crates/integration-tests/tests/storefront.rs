//! Integration tests for the cart, recommendation fallback and search history.

use std::sync::Arc;

use axum::http::Method;
use chrono::{TimeZone, Utc};
use emporium_admin::services::{
    CartService, HistoryService, NoticeLevel, RecommendationService, RecommendationSource, RecordingNotifier,
    ServiceError,
};
use emporium_admin::{KeyValueStore, MemoryStore};
use emporium_core::simulation::InteractionKind;
use emporium_core::types::ProductId;
use emporium_integration_tests::{MockBackend, fixtures};
use serde_json::json;

fn cart_service(backend: &MockBackend) -> (CartService, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let client = backend.client(backend.signed_in_store());
    (CartService::new(client, notifier.clone()), notifier)
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_unavailable_product_never_reaches_the_cart() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (mut cart, notifier) = cart_service(&backend);

    let err = cart.add("old-headphones").await.expect_err("refused");

    assert!(matches!(err, ServiceError::Unavailable));
    assert!(backend.state().mutations().is_empty());
    assert_eq!(
        notifier.messages(NoticeLevel::Error),
        ["This product is currently unavailable"]
    );
}

#[tokio::test]
async fn test_sold_out_product_never_reaches_the_cart() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (mut cart, _notifier) = cart_service(&backend);

    let err = cart.add("wireless-earbuds").await.expect_err("refused");

    assert!(matches!(err, ServiceError::OutOfStock));
    assert_eq!(backend.state().count(&Method::POST, "cart/add/4/"), 0);
}

#[tokio::test]
async fn test_add_refetches_cart() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (mut cart, notifier) = cart_service(&backend);

    let count = cart.add("usb-c-cable").await.expect("added").item_count();

    assert_eq!(count, 1);
    assert_eq!(cart.item_count(), 1);
    let state = backend.state();
    assert_eq!(state.count(&Method::POST, "cart/add/1/"), 1);
    assert_eq!(state.count(&Method::GET, "cart/"), 1);
    drop(state);
    assert_eq!(notifier.messages(NoticeLevel::Success), ["Product added to cart"]);
}

#[tokio::test]
async fn test_missing_product_is_an_api_error() {
    let backend = MockBackend::start().await.expect("mock starts");
    let (mut cart, _notifier) = cart_service(&backend);

    let err = cart.add("no-such-thing").await.expect_err("missing");

    assert!(matches!(err, ServiceError::Api(_)));
    assert_eq!(cart.item_count(), 0);
}

// ============================================================================
// Recommendations
// ============================================================================

fn recommendation_service(backend: &MockBackend) -> RecommendationService {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let client = backend.client(backend.signed_in_store());
    RecommendationService::new(client, HistoryService::new(store))
}

#[tokio::test]
async fn test_home_falls_back_to_simulated_shelves() {
    let backend = MockBackend::start().await.expect("mock starts");
    let service = recommendation_service(&backend);
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid time");

    let first = service.home(now).await.expect("simulated");
    let again = service.home(now).await.expect("simulated");

    assert_eq!(first.source, RecommendationSource::Simulated);
    assert_eq!(first.shelves.most_ordered.len(), 4);
    assert_eq!(first.shelves.most_popular.len(), 2);
    assert_eq!(first.shelves.knn_recommendations.len(), 3);
    assert_eq!(first.shelves.best_ml_recommendations.len(), 1);
    // Same seed window, same shelves
    assert_eq!(first, again);
}

#[tokio::test]
async fn test_home_uses_api_shelves_when_available() {
    let backend = MockBackend::start().await.expect("mock starts");
    backend.state().recommendations = Some(json!({
        "most_ordered": [fixtures::product(1, "USB C Cable", "299.00", 40, true, "cables")],
        "most_popular": [],
        "knn_recommendations": [],
        "best_ml_recommendations": [],
    }));
    let service = recommendation_service(&backend);

    let recommendations = service.home(Utc::now()).await.expect("from api");

    assert_eq!(recommendations.source, RecommendationSource::Api);
    assert_eq!(recommendations.shelves.most_ordered.len(), 1);
    assert_eq!(recommendations.shelves.most_ordered[0].product.id, ProductId::new(1));
    assert_eq!(backend.state().count(&Method::GET, "products/"), 0);
}

#[tokio::test]
async fn test_similar_excludes_the_product_itself() {
    let backend = MockBackend::start().await.expect("mock starts");
    let service = recommendation_service(&backend);

    let similar = service.similar("usb-c-cable", Utc::now()).await.expect("similar");

    assert!(similar.iter().all(|r| r.product.id != ProductId::new(1)));
    assert!(similar.iter().any(|r| r.product.id == ProductId::new(2)));
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_tracked_interactions_feed_metrics() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let history = HistoryService::new(store);
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid time");

    history.track(ProductId::new(1), InteractionKind::View, now).expect("tracked");
    history.track(ProductId::new(1), InteractionKind::Click, now).expect("tracked");
    history.track(ProductId::new(2), InteractionKind::View, now).expect("tracked");

    let metrics = history.metrics().expect("metrics");
    assert_eq!(metrics.total_interactions, 3);
    assert_eq!(metrics.total_views, 2);
    assert_eq!(metrics.total_clicks, 1);
}
