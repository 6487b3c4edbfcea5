//! JSON rows shaped like the backend's serializers.

use serde_json::{Value, json};

#[must_use]
pub fn category(id: i64, name: &str, slug: &str) -> Value {
    json!({"id": id, "name": name, "slug": slug, "icon": null})
}

#[must_use]
pub fn product(id: i64, name: &str, price: &str, stock: i64, available: bool, category_slug: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "description": format!("{name} description"),
        "brand": "Acme",
        "price": price,
        "actual_price": null,
        "discount_percentage": "0",
        "stock": stock,
        "available": available,
        "category": category_slug,
        "image_url": "",
        "created": "2025-01-15T10:00:00Z",
    })
}

#[must_use]
pub fn user(id: i64, username: &str, is_active: bool) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "first_name": username,
        "last_name": "",
        "is_active": is_active,
        "is_staff": id == 1,
        "date_joined": "2025-01-01T00:00:00Z",
    })
}

#[must_use]
pub fn order(id: i64, status: &str, amount: &str, username: &str) -> Value {
    json!({
        "id": id,
        "order_id": format!("ORD-{id:04}"),
        "user": {"username": username, "email": format!("{username}@example.com"), "first_name": username},
        "items": [],
        "status": status,
        "total_amount": amount,
        "final_amount": amount,
        "payment_method": "cod",
        "payment_status": "pending",
        "created_at": "2025-02-01T12:00:00Z",
    })
}

#[must_use]
pub fn wishlist(id: i64, username: &str, product_name: &str) -> Value {
    json!({
        "id": id,
        "user": {"username": username, "email": format!("{username}@example.com"), "first_name": username},
        "product": {"id": 1, "name": product_name, "slug": "", "price": "10.00"},
        "added_at": "2025-02-10T08:30:00Z",
    })
}

#[must_use]
pub fn categories() -> Vec<Value> {
    vec![category(1, "Cables", "cables"), category(2, "Audio", "audio")]
}

/// Four products: two active cables, one inactive, one sold out.
#[must_use]
pub fn products() -> Vec<Value> {
    vec![
        product(1, "USB C Cable", "299.00", 40, true, "cables"),
        product(2, "HDMI Cable", "499.00", 3, true, "cables"),
        product(3, "Old Headphones", "1999.00", 12, false, "audio"),
        product(4, "Wireless Earbuds", "2499.00", 0, true, "audio"),
    ]
}

#[must_use]
pub fn users() -> Vec<Value> {
    vec![user(1, "admin", true), user(2, "asha", true), user(3, "ravi", true)]
}

#[must_use]
pub fn orders() -> Vec<Value> {
    vec![
        order(1, "pending", "299.00", "asha"),
        order(2, "shipped", "2499.00", "ravi"),
        order(3, "cancelled", "499.00", "asha"),
    ]
}

#[must_use]
pub fn wishlists() -> Vec<Value> {
    vec![wishlist(1, "asha", "USB C Cable"), wishlist(2, "ravi", "HDMI Cable")]
}

#[must_use]
pub fn offer(id: i64, name: &str, code: &str, offer_type: &str, min_order_value: &str, used_count: u64) -> Value {
    json!({
        "id": id,
        "name": name,
        "code": code,
        "description": "",
        "offer_type": offer_type,
        "discount_percentage": if offer_type == "discount" { "10.00" } else { "0.00" },
        "flat_discount": if offer_type == "flat" { "500.00" } else { "0.00" },
        "min_order_value": min_order_value,
        "max_discount": null,
        "used_count": used_count,
        "start_date": "2025-01-01T00:00:00Z",
        "end_date": "2030-12-31T23:59:59Z",
        "is_active": true,
        "auto_apply": false,
        "first_time_only": false,
        "priority": "medium",
        "badge_text": null,
        "categories": [],
        "products": [],
    })
}

/// A 10% code with no minimum, a flat ₹500 off above ₹5000, and a combo
/// needing both cables.
#[must_use]
pub fn offers() -> Vec<Value> {
    let mut combo = offer(3, "Cable Combo", "CABLES", "combo", "0.00", 25);
    combo["products"] = json!([
        {"id": 1, "name": "USB C Cable", "slug": "usb-c-cable", "price": "299.00"},
        {"id": 2, "name": "HDMI Cable", "slug": "hdmi-cable", "price": "499.00"},
    ]);
    vec![
        offer(1, "Welcome Ten", "WELCOME10", "discount", "0.00", 4),
        offer(2, "Big Spender", "BIG500", "flat", "5000.00", 0),
        combo,
    ]
}

#[must_use]
pub fn review(id: i64, username: &str, rating: u8, comment: &str) -> Value {
    json!({
        "id": id,
        "user": {"username": username, "email": format!("{username}@example.com"), "first_name": username},
        "rating": rating,
        "comment": comment,
        "created_at": "2025-02-20T09:00:00Z",
    })
}

/// One saved product row, as the wishlist and compare endpoints send it.
#[must_use]
pub fn saved_item(id: i64, username: &str, product: &Value) -> Value {
    json!({
        "id": id,
        "user": {"username": username, "email": format!("{username}@example.com"), "first_name": username},
        "product": product,
        "added_at": "2025-02-10T08:30:00Z",
    })
}
