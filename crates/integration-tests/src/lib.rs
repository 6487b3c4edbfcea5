//! Integration tests for the Emporium client.
//!
//! The tests run the real [`ApiClient`] and services against an in-process
//! axum server that imitates the storefront backend: bearer tokens, refresh,
//! the admin lists and the mutations the services call. Each test starts
//! its own [`MockBackend`] on an ephemeral port.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```
//!
//! # Knobs
//!
//! [`MockState`] is shared with the server; tests change it between calls:
//! - `fail_paths` - answer 500 on these paths
//! - `refresh_succeeds` - whether `auth/refresh/` issues a new token
//! - `delay` - sleep before answering protected routes
//! - `requests` - every request received, in order
//! - `cart_items` - lines the offer and checkout routes price; see
//!   [`MockState::fill_cart`]
//! - `redemptions` - which orders the usage recount credits to an offer

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use emporium_admin::{ApiClient, ClientConfig, KeyValueStore, MemoryStore, TokenStore};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

pub mod fixtures;

/// Password the mock accepts for any username.
pub const PASSWORD: &str = "correct-horse";

/// One request as the mock saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path below `/api/`, e.g. `admin/products/`.
    pub path: String,
}

/// Everything the mock serves, plus the knobs tests turn.
#[derive(Debug)]
pub struct MockState {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_succeeds: bool,
    pub refresh_count: u32,
    pub fail_paths: HashSet<String>,
    pub delay: Option<Duration>,
    pub requests: Vec<RecordedRequest>,
    pub products: Vec<Value>,
    pub users: Vec<Value>,
    pub orders: Vec<Value>,
    pub wishlists: Vec<Value>,
    pub categories: Vec<Value>,
    pub cart_items: Vec<Value>,
    /// Body of `recommendations/home/`; `None` answers 404.
    pub recommendations: Option<Value>,
    pub offers: Vec<Value>,
    /// Offer ids applied to the cart.
    pub applied_offers: Vec<i64>,
    /// `(offer_id, order_id)` pairs the usage recount finds.
    pub redemptions: Vec<(i64, i64)>,
    /// The signed-in shopper's wishlist rows.
    pub wishlist_items: Vec<Value>,
    /// Compare rows; the admin list and the shopper's list are the same rows.
    pub compare_items: Vec<Value>,
    pub reviews: Vec<Value>,
    /// The signed-in user, as `profile/` returns it.
    pub profile: Value,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            access_token: "access-0".to_owned(),
            refresh_token: "refresh-0".to_owned(),
            refresh_succeeds: true,
            refresh_count: 0,
            fail_paths: HashSet::new(),
            delay: None,
            requests: Vec::new(),
            products: fixtures::products(),
            users: fixtures::users(),
            orders: fixtures::orders(),
            wishlists: fixtures::wishlists(),
            categories: fixtures::categories(),
            cart_items: Vec::new(),
            recommendations: None,
            offers: fixtures::offers(),
            applied_offers: Vec::new(),
            redemptions: vec![(1, 1), (1, 3)],
            wishlist_items: Vec::new(),
            compare_items: Vec::new(),
            reviews: vec![fixtures::review(1, "asha", 5, "Works great")],
            profile: fixtures::user(1, "admin", true),
        }
    }
}

impl MockState {
    /// Requests matching `method` and `path`.
    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests
            .iter()
            .filter(|r| r.method == *method && r.path == path)
            .count()
    }

    /// Requests other than list reads.
    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedRequest> {
        self.requests
            .iter()
            .filter(|r| r.method != Method::GET)
            .cloned()
            .collect()
    }

    /// Put one unit of each product id in the cart.
    pub fn fill_cart(&mut self, product_ids: &[i64]) {
        for id in product_ids {
            if let Some(product) = self.products.iter().find(|p| p["id"].as_i64() == Some(*id)).cloned() {
                let line = next_id(&self.cart_items);
                self.cart_items.push(json!({"id": line, "product": product, "quantity": 1}));
            }
        }
    }

    fn cart_subtotal(&self) -> f64 {
        self.cart_items
            .iter()
            .map(|line| money(&line["product"]["price"]) * line["quantity"].as_f64().unwrap_or(1.0))
            .sum()
    }
}

/// Money arrives as a decimal string or a number.
fn money(value: &Value) -> f64 {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .or_else(|| value.as_f64())
        .unwrap_or(0.0)
}

fn next_id(rows: &[Value]) -> i64 {
    rows.iter().filter_map(|r| r["id"].as_i64()).max().unwrap_or(0) + 1
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running mock backend. The server stops when this is dropped.
pub struct MockBackend {
    base_url: Url,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start with the default fixtures.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        Self::with_state(MockState::default()).await
    }

    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn with_state(state: MockState) -> std::io::Result<Self> {
        let state: Shared = Arc::new(Mutex::new(state));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let app = router(Arc::clone(&state));

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/api/"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        Ok(Self {
            base_url,
            state,
            server,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Lock the shared state to inspect or change it.
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    /// A store holding the mock's current tokens.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory store rejects the write, which it never does.
    #[must_use]
    pub fn signed_in_store(&self) -> Arc<dyn KeyValueStore> {
        let (access, refresh) = {
            let state = self.state();
            (state.access_token.clone(), state.refresh_token.clone())
        };
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        TokenStore::new(Arc::clone(&store))
            .set_tokens(&SecretString::from(access), &SecretString::from(refresh))
            .expect("memory store accepts writes");
        store
    }

    /// A client for this backend over `store`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self, store: Arc<dyn KeyValueStore>) -> ApiClient {
        let config = ClientConfig {
            request_timeout: Duration::from_secs(5),
            ..ClientConfig::default()
        }
        .with_api_url(self.base_url.clone());
        ApiClient::new(&config, store).expect("client builds")
    }

    /// Expire the current access token; the refresh token stays valid.
    pub fn rotate_access_token(&self) {
        let mut state = self.state();
        state.access_token = format!("rotated-{}", state.requests.len());
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Shared) -> Router {
    let protected = Router::new()
        .route("/api/admin/analytics/stats/", get(stats))
        .route("/api/admin/products/", get(list_products_admin))
        .route("/api/admin/products/create/", post(create_product))
        .route("/api/admin/products/update/{id}/", put(update_product))
        .route("/api/admin/products/toggle/{id}/", put(toggle_product))
        .route("/api/admin/products/delete/{id}/", delete(delete_product))
        .route("/api/admin/categories/create/", post(create_category))
        .route("/api/admin/categories/delete/{id}/", delete(delete_category))
        .route("/api/admin/users/", get(list_users))
        .route("/api/admin/users/ban/{id}/", put(ban_user))
        .route("/api/admin/users/delete/{id}/", delete(delete_user))
        .route("/api/admin/orders/", get(list_orders))
        .route("/api/admin/orders/update/{id}/", put(update_order))
        .route("/api/admin/wishlists/", get(list_wishlists))
        .route("/api/admin/wishlists/remove/{id}/", delete(remove_wishlist))
        .route("/api/categories/", get(list_categories))
        .route("/api/products/", get(list_products))
        .route("/api/products/{slug}/", get(product_detail))
        .route("/api/recommendations/home/", get(home_recommendations))
        .route("/api/cart/", get(cart))
        .route("/api/cart/add/{id}/", post(add_to_cart))
        .route("/api/profile/", get(profile).put(update_profile))
        .route("/api/products/{slug}/reviews/", get(product_reviews))
        .route("/api/products/{slug}/reviews/add/", post(add_review))
        .route("/api/wishlist/", get(my_wishlist))
        .route("/api/wishlist/add/{id}/", post(add_to_wishlist))
        .route("/api/wishlist/remove/{id}/", delete(remove_from_wishlist))
        .route("/api/compare/", get(my_compare))
        .route("/api/compare/add/{id}/", post(add_to_compare))
        .route("/api/compare/remove/{id}/", delete(remove_from_compare))
        .route("/api/compare/clear/", delete(clear_compare))
        .route("/api/checkout/", post(checkout))
        .route("/api/orders/", get(my_orders))
        .route("/api/orders/{order}/", get(order_detail))
        .route("/api/orders/{order}/cancel/", post(cancel_order))
        .route("/api/admin/compares/", get(admin_compares))
        .route("/api/admin/compares/remove/{id}/", delete(admin_remove_compare))
        .route("/api/admin/analytics/dashboard/", get(analytics))
        .route("/api/offers/active/", get(active_offers))
        .route("/api/offers/apply/", post(apply_offer))
        .route("/api/offers/remove/", post(remove_offer))
        .route("/api/offers/check-combo-eligibility/{id}/", get(combo_eligibility))
        .route("/api/admin/offers/", get(admin_offers))
        .route("/api/admin/offers/create/", post(create_offer))
        .route("/api/admin/offers/update/{id}/", put(update_offer))
        .route("/api/admin/offers/delete/{id}/", delete(delete_offer))
        .route("/api/admin/offers/revoke/{id}/", post(revoke_offer))
        .route("/api/admin/offers/usage-stats/{id}/", get(offer_usage))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), authorize));

    Router::new()
        .route("/api/login/", post(login))
        .route("/api/auth/refresh/", post(refresh))
        .route("/api/register/", post(register))
        .merge(protected)
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

// ============================================================================
// Middleware
// ============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request
        .uri()
        .path()
        .trim_start_matches("/api/")
        .to_owned();
    lock(&state).requests.push(RecordedRequest {
        method: request.method().clone(),
        path,
    });
    next.run(request).await
}

/// Bearer check, then injected failures and delay.
async fn authorize(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path().trim_start_matches("/api/").to_owned();
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    let (authorized, failing, delay) = {
        let state = lock(&state);
        (
            bearer.as_deref() == Some(state.access_token.as_str()),
            state.fail_paths.contains(&path),
            state.delay,
        )
    };

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Given token not valid for any token type"})),
        )
            .into_response();
    }
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Internal server error"}))).into_response();
    }
    next.run(request).await
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    if body.password != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid credentials"}))).into_response();
    }
    let state = lock(&state);
    let user = fixtures::user(1, &body.username, true);
    Json(json!({
        "user": user,
        "access": state.access_token,
        "refresh": state.refresh_token,
    }))
    .into_response()
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

async fn refresh(State(state): State<Shared>, Json(body): Json<RefreshBody>) -> Response {
    let mut state = lock(&state);
    if !state.refresh_succeeds || body.refresh != state.refresh_token {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired"})),
        )
            .into_response();
    }
    state.refresh_count += 1;
    state.access_token = format!("access-{}", state.refresh_count);
    Json(json!({"access": state.access_token})).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let username = body["username"].as_str().unwrap_or_default().to_owned();
    if state.users.iter().any(|u| u["username"].as_str() == Some(username.as_str())) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Username already exists"}))).into_response();
    }
    let id = next_id(&state.users);
    let mut user = fixtures::user(id, &username, true);
    user["email"] = body["email"].clone();
    state.users.push(user.clone());
    state.profile = user.clone();
    (
        StatusCode::CREATED,
        Json(json!({"user": user, "access": state.access_token, "refresh": state.refresh_token})),
    )
        .into_response()
}

async fn profile(State(state): State<Shared>) -> Json<Value> {
    Json(lock(&state).profile.clone())
}

async fn update_profile(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = lock(&state);
    merge(&mut state.profile, &body);
    Json(state.profile.clone())
}

// ============================================================================
// Admin lists
// ============================================================================

async fn stats(State(state): State<Shared>) -> Json<Value> {
    let state = lock(&state);
    Json(json!({
        "total_products": state.products.len(),
        "total_orders": state.orders.len(),
        "total_users": state.users.len(),
        "total_revenue": "0.00",
    }))
}

async fn list_products_admin(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).products.clone()))
}

async fn list_users(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).users.clone()))
}

async fn list_orders(State(state): State<Shared>) -> Json<Value> {
    // Paginated envelope, as the orders endpoint sends.
    let orders = lock(&state).orders.clone();
    Json(json!({"count": orders.len(), "results": orders}))
}

async fn list_wishlists(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).wishlists.clone()))
}

async fn list_categories(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).categories.clone()))
}

// ============================================================================
// Admin mutations
// ============================================================================

fn find_mut<'a>(rows: &'a mut [Value], id: i64) -> Option<&'a mut Value> {
    rows.iter_mut().find(|row| row["id"].as_i64() == Some(id))
}

/// Overwrite `target`'s fields with those present in `fields`.
fn merge(target: &mut Value, fields: &Value) {
    if let (Some(target), Some(fields)) = (target.as_object_mut(), fields.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn bad_request(body: Value) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": format!("{what} not found")}))).into_response()
}

async fn create_product(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let id = i64::try_from(state.products.len()).unwrap_or(0) + 100;
    let mut product = body;
    product["id"] = json!(id);
    product["slug"] = json!(format!("product-{id}"));
    product["available"] = json!(true);
    state.products.push(product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn update_product(State(state): State<Shared>, Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let Some(product) = find_mut(&mut state.products, id) else {
        return not_found("Product");
    };
    merge(product, &body);
    Json(product.clone()).into_response()
}

async fn toggle_product(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let Some(product) = find_mut(&mut state.products, id) else {
        return not_found("Product");
    };
    let available = !product["available"].as_bool().unwrap_or(true);
    product["available"] = json!(available);
    Json(json!({
        "id": id,
        "name": product["name"],
        "available": available,
        "message": format!("Product {} successfully", if available { "activated" } else { "deactivated" }),
    }))
    .into_response()
}

async fn delete_product(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    state.products.retain(|p| p["id"].as_i64() != Some(id));
    Json(json!({"message": "Product deleted successfully"})).into_response()
}

async fn create_category(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let id = i64::try_from(state.categories.len()).unwrap_or(0) + 1;
    let category = json!({"id": id, "name": body["name"], "slug": body["slug"]});
    state.categories.push(category.clone());
    (StatusCode::CREATED, Json(category)).into_response()
}

async fn delete_category(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    lock(&state).categories.retain(|c| c["id"].as_i64() != Some(id));
    Json(json!({"message": "Category deleted successfully"})).into_response()
}

async fn ban_user(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let Some(user) = find_mut(&mut state.users, id) else {
        return not_found("User");
    };
    user["is_active"] = json!(false);
    Json(json!({"message": "User banned successfully"})).into_response()
}

async fn delete_user(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    lock(&state).users.retain(|u| u["id"].as_i64() != Some(id));
    Json(json!({"message": "User deleted successfully"})).into_response()
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

async fn update_order(State(state): State<Shared>, Path(id): Path<i64>, Json(body): Json<StatusBody>) -> Response {
    let mut state = lock(&state);
    let Some(order) = find_mut(&mut state.orders, id) else {
        return not_found("Order");
    };
    order["status"] = json!(body.status);
    Json(json!({
        "message": "Order status updated successfully",
        "order_id": id,
        "new_status": body.status,
    }))
    .into_response()
}

async fn remove_wishlist(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    lock(&state).wishlists.retain(|w| w["id"].as_i64() != Some(id));
    Json(json!({"message": "Removed from wishlist"})).into_response()
}

// ============================================================================
// Storefront
// ============================================================================

#[derive(Deserialize)]
struct ProductsQuery {
    limit: Option<usize>,
}

async fn list_products(State(state): State<Shared>, Query(query): Query<ProductsQuery>) -> Json<Value> {
    let products = lock(&state).products.clone();
    let limit = query.limit.unwrap_or(products.len());
    Json(Value::Array(products.into_iter().take(limit).collect()))
}

async fn product_detail(State(state): State<Shared>, Path(slug): Path<String>) -> Response {
    let state = lock(&state);
    state
        .products
        .iter()
        .find(|p| p["slug"].as_str() == Some(slug.as_str()))
        .map_or_else(|| not_found("Product"), |p| Json(p.clone()).into_response())
}

async fn home_recommendations(State(state): State<Shared>) -> Response {
    lock(&state)
        .recommendations
        .clone()
        .map_or_else(|| not_found("Recommendations"), |body| Json(body).into_response())
}

async fn cart(State(state): State<Shared>) -> Json<Value> {
    let items = lock(&state).cart_items.clone();
    Json(json!({"id": 1, "items": items, "total_price": "0.00"}))
}

async fn add_to_cart(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let Some(product) = state.products.iter().find(|p| p["id"].as_i64() == Some(id)).cloned() else {
        return not_found("Product");
    };
    let line = i64::try_from(state.cart_items.len()).unwrap_or(0) + 1;
    state.cart_items.push(json!({"id": line, "product": product, "quantity": 1}));
    Json(json!({"message": "Product added to cart"})).into_response()
}

async fn product_reviews(State(state): State<Shared>, Path(_product): Path<i64>) -> Json<Value> {
    Json(Value::Array(lock(&state).reviews.clone()))
}

async fn add_review(State(state): State<Shared>, Path(_product): Path<i64>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let username = state.profile["username"].as_str().unwrap_or_default().to_owned();
    let id = next_id(&state.reviews);
    let rating = u8::try_from(body["rating"].as_u64().unwrap_or(0)).unwrap_or(0);
    let review = fixtures::review(id, &username, rating, body["comment"].as_str().unwrap_or_default());
    state.reviews.push(review.clone());
    (StatusCode::CREATED, Json(review)).into_response()
}

// ============================================================================
// Wishlist and compare
// ============================================================================

fn product_by_id(state: &MockState, id: i64) -> Option<Value> {
    state.products.iter().find(|p| p["id"].as_i64() == Some(id)).cloned()
}

fn holds_product(rows: &[Value], id: i64) -> bool {
    rows.iter().any(|r| r["product"]["id"].as_i64() == Some(id))
}

async fn my_wishlist(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).wishlist_items.clone()))
}

async fn add_to_wishlist(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let Some(product) = product_by_id(&state, id) else {
        return not_found("Product");
    };
    let name = product["name"].as_str().unwrap_or_default().to_owned();
    if holds_product(&state.wishlist_items, id) {
        return Json(json!({"message": format!("{name} already in wishlist!")})).into_response();
    }
    let row = fixtures::saved_item(next_id(&state.wishlist_items), "admin", &product);
    state.wishlist_items.push(row);
    Json(json!({"message": format!("{name} added to wishlist!")})).into_response()
}

async fn remove_from_wishlist(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    if !holds_product(&state.wishlist_items, id) {
        return not_found("Wishlist item");
    }
    state.wishlist_items.retain(|r| r["product"]["id"].as_i64() != Some(id));
    Json(json!({"message": "Removed from wishlist"})).into_response()
}

async fn my_compare(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).compare_items.clone()))
}

async fn add_to_compare(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let Some(product) = product_by_id(&state, id) else {
        return not_found("Product");
    };
    let name = product["name"].as_str().unwrap_or_default().to_owned();
    if holds_product(&state.compare_items, id) {
        return Json(json!({"message": format!("{name} already in compare list!")})).into_response();
    }
    if state.compare_items.len() >= 4 {
        return bad_request(json!({"error": "You can compare maximum 4 products at a time!"}));
    }
    let row = fixtures::saved_item(next_id(&state.compare_items), "admin", &product);
    state.compare_items.push(row);
    Json(json!({"message": format!("{name} added to compare!")})).into_response()
}

async fn remove_from_compare(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    if !holds_product(&state.compare_items, id) {
        return not_found("Compare item");
    }
    state.compare_items.retain(|r| r["product"]["id"].as_i64() != Some(id));
    Json(json!({"message": "Removed from compare"})).into_response()
}

async fn clear_compare(State(state): State<Shared>) -> Json<Value> {
    lock(&state).compare_items.clear();
    Json(json!({"message": "Compare list cleared"}))
}

async fn admin_compares(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).compare_items.clone()))
}

async fn admin_remove_compare(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    if find_mut(&mut state.compare_items, id).is_none() {
        return not_found("Compare item");
    }
    state.compare_items.retain(|r| r["id"].as_i64() != Some(id));
    Json(json!({"message": "Compare item removed"})).into_response()
}

async fn analytics(State(state): State<Shared>) -> Json<Value> {
    let state = lock(&state);
    let total = |status: Option<&str>| -> f64 {
        state
            .orders
            .iter()
            .filter(|o| status.is_none_or(|s| o["status"].as_str() == Some(s)))
            .map(|o| money(&o["final_amount"]))
            .sum()
    };
    let cancelled = state
        .orders
        .iter()
        .filter(|o| o["status"].as_str() == Some("cancelled"))
        .count();
    let refunds = total(Some("cancelled")) * 0.7;
    Json(json!({
        "total_revenue": total(None),
        "net_revenue": total(None) - refunds,
        "total_refunds": refunds,
        "today_sales": 0,
        "avg_daily_sales": 0,
        "completed_orders_count": state.orders.len() - cancelled,
        "cancelled_orders": cancelled,
    }))
}

// ============================================================================
// Checkout and orders
// ============================================================================

async fn checkout(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    if state.cart_items.is_empty() {
        return bad_request(json!({"error": "Cart is empty!"}));
    }
    let id = next_id(&state.orders);
    let username = state.profile["username"].as_str().unwrap_or_default().to_owned();
    let mut order = fixtures::order(id, "pending", &format!("{:.2}", state.cart_subtotal()), &username);
    order["items"] = state
        .cart_items
        .iter()
        .map(|line| json!({"product": line["product"], "quantity": line["quantity"], "price": line["product"]["price"]}))
        .collect();
    if let Some(method) = body["payment_method"].as_str() {
        order["payment_method"] = json!(method);
    }
    state.cart_items.clear();
    state.applied_offers.clear();
    state.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn my_orders(State(state): State<Shared>) -> Json<Value> {
    let mut orders = lock(&state).orders.clone();
    orders.reverse();
    Json(Value::Array(orders))
}

async fn order_detail(State(state): State<Shared>, Path(order_ref): Path<String>) -> Response {
    let state = lock(&state);
    state
        .orders
        .iter()
        .find(|o| o["order_id"].as_str() == Some(order_ref.as_str()))
        .map_or_else(|| not_found("Order"), |o| Json(o.clone()).into_response())
}

async fn cancel_order(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let Some(order) = find_mut(&mut state.orders, id) else {
        return not_found("Order");
    };
    if !matches!(order["status"].as_str(), Some("pending" | "confirmed")) {
        return bad_request(json!({"error": "Order cannot be cancelled"}));
    }
    order["status"] = json!("cancelled");
    let refund = money(&order["final_amount"]) * 0.7;
    Json(json!({"success": true, "message": "Order cancelled successfully", "refund_amount": refund})).into_response()
}

// ============================================================================
// Offers
// ============================================================================

fn offer_error(message: &str, code: &str) -> Response {
    bad_request(json!({"success": false, "error": message, "code": code}))
}

async fn active_offers(State(state): State<Shared>) -> Json<Value> {
    let state = lock(&state);
    Json(
        state
            .offers
            .iter()
            .filter(|o| o["is_active"].as_bool() == Some(true))
            .cloned()
            .collect(),
    )
}

async fn apply_offer(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    if state.cart_items.is_empty() {
        return offer_error("Cart is empty", "CART_EMPTY");
    }
    let code = body["offer_code"].as_str().map(str::to_uppercase);
    let Some(offer) = state
        .offers
        .iter()
        .find(|o| {
            o["is_active"].as_bool() == Some(true)
                && (body["offer_id"].as_i64().is_some_and(|id| o["id"].as_i64() == Some(id))
                    || code.as_deref().is_some_and(|c| o["code"].as_str() == Some(c)))
        })
        .cloned()
    else {
        return offer_error("Offer not found or inactive", "OFFER_NOT_FOUND");
    };
    let id = offer["id"].as_i64().unwrap_or_default();
    if state.applied_offers.contains(&id) {
        return offer_error("This offer is already applied", "OFFER_ALREADY_APPLIED");
    }
    let minimum = money(&offer["min_order_value"]);
    let subtotal = state.cart_subtotal();
    if subtotal < minimum {
        return bad_request(json!({
            "success": false,
            "error": format!("Minimum order value of ₹{minimum} required"),
            "code": "MINIMUM_ORDER_NOT_MET",
            "min_order_value": offer["min_order_value"],
        }));
    }

    let replaced = state.applied_offers.pop().and_then(|old| {
        state
            .offers
            .iter()
            .find(|o| o["id"].as_i64() == Some(old))
            .and_then(|o| o["name"].as_str().map(str::to_owned))
    });
    state.applied_offers.push(id);
    let discount = money(&offer["flat_discount"]) + subtotal * money(&offer["discount_percentage"]) / 100.0;
    let name = offer["name"].as_str().unwrap_or_default();
    Json(json!({
        "success": true,
        "message": format!("Offer \"{name}\" applied successfully!"),
        "offer_name": name,
        "discount_amount": discount,
        "replaced_offer": replaced,
    }))
    .into_response()
}

async fn remove_offer(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let id = body["offer_id"].as_i64().unwrap_or_default();
    if !state.applied_offers.contains(&id) {
        return not_found("Applied offer");
    }
    state.applied_offers.retain(|o| *o != id);
    Json(json!({"message": "Offer removed"})).into_response()
}

async fn combo_eligibility(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = lock(&state);
    let Some(offer) = state.offers.iter().find(|o| o["id"].as_i64() == Some(id)) else {
        return not_found("Offer");
    };
    let missing: Vec<Value> = offer["products"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|p| !p["id"].as_i64().is_some_and(|pid| holds_product(&state.cart_items, pid)))
        .cloned()
        .collect();
    Json(json!({"eligible": missing.is_empty(), "missing_products": missing})).into_response()
}

async fn admin_offers(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&state).offers.clone()))
}

async fn create_offer(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let code = body["code"].as_str().unwrap_or_default().to_uppercase();
    if state.offers.iter().any(|o| o["code"].as_str() == Some(code.as_str())) {
        return bad_request(json!({"code": ["offer with this code already exists."]}));
    }
    body["id"] = json!(next_id(&state.offers));
    body["code"] = json!(code);
    body["used_count"] = json!(0);
    state.offers.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_offer(State(state): State<Shared>, Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let Some(offer) = find_mut(&mut state.offers, id) else {
        return not_found("Offer");
    };
    merge(offer, &body);
    Json(offer.clone()).into_response()
}

async fn delete_offer(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    if find_mut(&mut state.offers, id).is_none() {
        return not_found("Offer");
    }
    state.offers.retain(|o| o["id"].as_i64() != Some(id));
    state.applied_offers.retain(|o| *o != id);
    Json(json!({"message": "Offer deleted"})).into_response()
}

async fn revoke_offer(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let Some(offer) = find_mut(&mut state.offers, id) else {
        return not_found("Offer");
    };
    offer["is_active"] = json!(false);
    let name = offer["name"].as_str().unwrap_or_default().to_owned();
    let carts = usize::from(state.applied_offers.contains(&id));
    state.applied_offers.retain(|o| *o != id);
    Json(json!({"message": format!("Offer \"{name}\" revoked and removed from {carts} cart(s)")})).into_response()
}

async fn offer_usage(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let order_ids: Vec<i64> = state
        .redemptions
        .iter()
        .filter(|(offer, _)| *offer == id)
        .map(|(_, order)| *order)
        .collect();
    let matching: Vec<Value> = state
        .orders
        .iter()
        .filter(|o| o["id"].as_i64().is_some_and(|oid| order_ids.contains(&oid)))
        .map(|o| json!({"order_id": o["order_id"], "created_at": o["created_at"], "user": o["user"]["username"]}))
        .collect();
    let total_orders_checked = state.orders.len();
    let Some(offer) = find_mut(&mut state.offers, id) else {
        return not_found("Offer");
    };
    let old_count = offer["used_count"].clone();
    offer["used_count"] = json!(matching.len());
    Json(json!({
        "offer_id": id,
        "offer_name": offer["name"],
        "old_count": old_count,
        "used_count": matching.len(),
        "matching_orders": matching,
        "total_orders_checked": total_orders_checked,
    }))
    .into_response()
}
