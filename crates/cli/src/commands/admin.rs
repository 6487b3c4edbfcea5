//! Admin dashboard, lists and CRUD commands.
//!
//! # Usage
//!
//! ```bash
//! emp dashboard --timeout 10
//! emp products list --search usb --category cables --price 100-500
//! emp products create --name "USB-C Cable" --price 299 --stock 40 --category cables
//! emp products toggle 12
//! emp orders list --status pending --sort amount_high
//! emp users ban 5
//! ```

use std::num::NonZeroUsize;
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Subcommand};
use emporium_admin::AppError;
use emporium_admin::services::{AdminConsole, DashboardSection, ServiceError};
use emporium_core::forms::{CategoryDraft, ProductDraft, UserDraft};
use emporium_core::query::{
    DateBucket, ListState, OrderQuery, OrderSort, OrderStatusFilter, Page, PriceRange, ProductQuery, ProductSort,
    ProductStatusFilter, UserQuery, UserSort, UserStatusFilter, WishlistQuery, WishlistSort,
};
use emporium_core::types::{
    CategoryId, CompareItemId, OrderId, OrderStatus, ProductId, UserId, WishlistItemId, format_currency, format_price,
};

use super::Context;
use super::account::log_order;

#[derive(Args)]
pub struct PageArgs {
    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub(crate) page: usize,

    #[arg(long, default_value = "12")]
    pub(crate) page_size: NonZeroUsize,
}

impl PageArgs {
    fn state<C: PartialEq>(&self, criteria: C) -> ListState<C> {
        let mut state = ListState::new(criteria, self.page_size);
        state.set_page(self.page);
        state
    }
}

/// Product form fields; unset fields keep their current value on update.
#[derive(Args)]
pub struct ProductFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    price: Option<String>,
    /// Price before discount
    #[arg(long)]
    actual_price: Option<String>,
    #[arg(long)]
    discount: Option<String>,
    #[arg(long)]
    offer_text: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    stock: Option<String>,
    /// Category slug
    #[arg(long)]
    category: Option<String>,
    /// Image URL; repeat for more (the first is the landing image)
    #[arg(long = "image")]
    images: Vec<String>,
}

impl ProductFields {
    fn apply_to(self, draft: &mut ProductDraft) {
        let set = |field: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *field = value;
            }
        };
        set(&mut draft.name, self.name);
        set(&mut draft.price, self.price);
        set(&mut draft.actual_price, self.actual_price);
        set(&mut draft.discount_percentage, self.discount);
        set(&mut draft.offer_text, self.offer_text);
        set(&mut draft.description, self.description);
        set(&mut draft.stock, self.stock);
        set(&mut draft.category, self.category);
        if !self.images.is_empty() {
            draft.image_urls = self.images;
        }
    }
}

#[derive(Subcommand)]
pub enum ProductAction {
    /// Filter, sort and page the product table
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// Category slug
        #[arg(long)]
        category: Option<String>,
        /// `MIN-MAX` or `MIN-max`
        #[arg(long)]
        price: Option<PriceRange>,
        /// all, active, inactive, `low_stock`
        #[arg(long, default_value = "all")]
        status: ProductStatusFilter,
        /// none, `price_low`, `price_high`, `name_asc`, newest, stock
        #[arg(long, default_value = "none")]
        sort: ProductSort,
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Create a product
    Create {
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Edit a product
    Update {
        id: ProductId,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product (asks first)
    Delete { id: ProductId },
    /// Flip a product between active and inactive
    Toggle { id: ProductId },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    List,
    /// Create a category; the slug defaults to one derived from the name
    Create {
        name: String,
        #[arg(long, default_value = "")]
        slug: String,
    },
    /// Rename a category
    Update {
        id: CategoryId,
        name: String,
        #[arg(long)]
        slug: Option<String>,
    },
    /// Delete a category (asks first)
    Delete { id: CategoryId },
}

#[derive(Subcommand)]
pub enum OrderAction {
    List {
        /// Order reference, customer name or email
        #[arg(long, default_value = "")]
        search: String,
        /// all, pending, confirmed, shipped, delivered, cancelled
        #[arg(long, default_value = "all")]
        status: OrderStatusFilter,
        /// recent, oldest, `amount_high`, `amount_low`
        #[arg(long, default_value = "recent")]
        sort: OrderSort,
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Set an order's status
    Status { id: OrderId, status: OrderStatus },
    /// The signed-in shopper's own orders
    Mine,
    /// Look an order up by its `ORD-...` reference
    Track { order_ref: String },
    /// Cancel one of your pending or confirmed orders (asks first)
    Cancel { id: OrderId },
}

#[derive(Subcommand)]
pub enum UserAction {
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// all, active, inactive, staff
        #[arg(long, default_value = "all")]
        status: UserStatusFilter,
        /// none, newest, username
        #[arg(long, default_value = "none")]
        sort: UserSort,
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Create a user, or edit one with `--id`
    Save {
        #[arg(long)]
        id: Option<UserId>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Required for new users; omit to keep the current one
        #[arg(long, env = "EMPORIUM_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Deactivate a user (asks first)
    Ban { id: UserId },
    /// Delete a user (asks first)
    Delete { id: UserId },
}

#[derive(Subcommand)]
pub enum CompareItemAction {
    List,
    /// Remove a compare entry (asks first)
    Remove { id: CompareItemId },
}

#[derive(Subcommand)]
pub enum WishlistAction {
    List {
        /// Customer name, email or product name
        #[arg(long, default_value = "")]
        search: String,
        /// all, today, week, month
        #[arg(long, default_value = "all")]
        added: DateBucket,
        /// recent, oldest, user, product
        #[arg(long, default_value = "recent")]
        sort: WishlistSort,
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Remove a wishlist entry (asks first)
    Remove { id: WishlistItemId },
}

/// Load the dashboard and log the stat cards.
pub async fn dashboard(ctx: &Context, timeout: Option<u64>) -> Result<(), AppError> {
    let mut console = ctx.console();
    let view = match timeout {
        Some(secs) => {
            console
                .refresh_until(tokio::time::sleep(Duration::from_secs(secs)))
                .await?
        }
        None => console.refresh().await?,
    };
    let summary = view.summary();

    tracing::info!(
        "Products: {}  Orders: {}  Users: {}  Revenue: {}",
        summary.total_products,
        summary.total_orders,
        summary.total_users,
        format_currency(summary.revenue)
    );
    for (status, count) in &summary.orders_by_status {
        tracing::info!("  {:<10} {count}", status.as_str());
    }
    tracing::info!(
        "Active users: {}  Low stock: {}  Inactive products: {}",
        summary.active_users,
        summary.low_stock_products,
        summary.unavailable_products
    );
    for section in DashboardSection::ALL {
        if view.section_failed(section) {
            tracing::warn!("Section {section} failed to load");
        }
    }
    Ok(())
}

pub async fn products(ctx: &Context, action: ProductAction) -> Result<(), AppError> {
    let mut console = ctx.console();
    match action {
        ProductAction::List {
            search,
            category,
            price,
            status,
            sort,
            paging,
        } => {
            let products = ctx.api.admin_products().await?;
            let state = paging.state(ProductQuery {
                search,
                category,
                price,
                status,
                sort,
            });
            log_page(&state.apply(&products), |p| {
                let price = p.display_price();
                let discount = if price.has_discount {
                    format!("  (was {}, -{}%)", format_price(price.original), price.discount_percentage)
                } else {
                    String::new()
                };
                format!(
                    "#{:<5} {:<32} {:>10}  stock {:<4} {}{discount}",
                    p.id.get(),
                    p.name,
                    format_price(price.current),
                    p.stock,
                    if p.available { "active" } else { "inactive" }
                )
            });
        }
        ProductAction::Create { fields } => {
            let mut draft = ProductDraft::default();
            fields.apply_to(&mut draft);
            let product = console.save_product(None, &draft).await?;
            tracing::info!("Created product #{} {}", product.id, product.name);
        }
        ProductAction::Update { id, fields } => {
            load(&mut console).await?;
            let current = console
                .view()
                .products
                .iter()
                .find(|p| p.id == id)
                .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))?;
            let mut draft = ProductDraft::from_product(current, &console.view().categories);
            fields.apply_to(&mut draft);
            console.save_product(Some(id), &draft).await?;
        }
        ProductAction::Delete { id } => {
            load(&mut console).await?;
            console.delete_product(id).await?;
        }
        ProductAction::Toggle { id } => {
            load(&mut console).await?;
            let available = console.toggle_product(id).await?;
            tracing::info!("Product #{id} is now {}", if available { "active" } else { "inactive" });
        }
    }
    Ok(())
}

pub async fn categories(ctx: &Context, action: CategoryAction) -> Result<(), AppError> {
    let mut console = ctx.console();
    match action {
        CategoryAction::List => {
            for category in ctx.api.categories().await? {
                tracing::info!("#{:<4} {:<24} {}", category.id.get(), category.name, category.slug);
            }
        }
        CategoryAction::Create { name, slug } => {
            let draft = CategoryDraft {
                editing: None,
                name,
                slug,
            };
            let category = console.save_category(&draft).await?;
            tracing::info!("Created category #{} ({})", category.id, category.slug);
        }
        CategoryAction::Update { id, name, slug } => {
            load(&mut console).await?;
            let current = console
                .view()
                .categories
                .iter()
                .find(|c| c.id == id)
                .ok_or_else(|| ServiceError::NotFound(format!("category {id}")))?;
            let mut draft = CategoryDraft::edit(current);
            draft.name = name;
            if let Some(slug) = slug {
                draft.slug = slug;
            }
            console.save_category(&draft).await?;
        }
        CategoryAction::Delete { id } => {
            load(&mut console).await?;
            console.delete_category(id).await?;
        }
    }
    Ok(())
}

pub async fn orders(ctx: &Context, action: OrderAction) -> Result<(), AppError> {
    match action {
        OrderAction::List {
            search,
            status,
            sort,
            paging,
        } => {
            let orders = ctx.api.admin_orders().await?;
            let state = paging.state(OrderQuery { search, status, sort });
            log_page(&state.apply(&orders), |o| {
                format!(
                    "{:<14} {:<10} {:>12}  {}",
                    o.order_id,
                    o.status.as_str(),
                    format_price(o.amount()),
                    o.user.as_ref().map_or("", |u| u.email())
                )
            });
        }
        OrderAction::Status { id, status } => {
            let mut console = ctx.console();
            load(&mut console).await?;
            let update = console.update_order_status(id, status).await?;
            tracing::info!("Order {} is now {}", update.order_id, update.new_status);
        }
        OrderAction::Mine => {
            let mut service = ctx.orders();
            let orders = service.refresh().await?;
            if orders.is_empty() {
                tracing::info!("No orders yet");
            }
            orders.iter().for_each(log_order);
        }
        OrderAction::Track { order_ref } => log_order(&ctx.orders().track(&order_ref).await?),
        OrderAction::Cancel { id } => {
            let mut service = ctx.orders();
            service.refresh().await?;
            let response = service.cancel(id).await?;
            tracing::info!("{}", response.message);
        }
    }
    Ok(())
}

pub async fn users(ctx: &Context, action: UserAction) -> Result<(), AppError> {
    let mut console = ctx.console();
    match action {
        UserAction::List {
            search,
            status,
            sort,
            paging,
        } => {
            let users = ctx.api.admin_users().await?;
            let state = paging.state(UserQuery { search, status, sort });
            log_page(&state.apply(&users), |u| {
                format!(
                    "#{:<5} {:<20} {:<28} {}{}",
                    u.id.get(),
                    u.username,
                    u.email,
                    if u.is_active { "active" } else { "banned" },
                    if u.is_staff { " staff" } else { "" }
                )
            });
        }
        UserAction::Save {
            id,
            username,
            email,
            first_name,
            last_name,
            password,
        } => {
            let mut draft = match id {
                Some(id) => {
                    load(&mut console).await?;
                    let current = console
                        .view()
                        .users
                        .iter()
                        .find(|u| u.id == id)
                        .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))?;
                    UserDraft::edit(current)
                }
                None => UserDraft::default(),
            };
            if let Some(username) = username {
                draft.username = username;
            }
            if let Some(email) = email {
                draft.email = email;
            }
            if let Some(first_name) = first_name {
                draft.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                draft.last_name = last_name;
            }
            if let Some(password) = password {
                draft.password = password;
            }
            console.save_user(&draft).await?;
        }
        UserAction::Ban { id } => {
            load(&mut console).await?;
            console.ban_user(id).await?;
        }
        UserAction::Delete { id } => {
            load(&mut console).await?;
            console.delete_user(id).await?;
        }
    }
    Ok(())
}

pub async fn wishlists(ctx: &Context, action: WishlistAction) -> Result<(), AppError> {
    match action {
        WishlistAction::List {
            search,
            added,
            sort,
            paging,
        } => {
            let items = ctx.api.admin_wishlists().await?;
            let state = paging.state(WishlistQuery {
                search,
                added,
                sort,
                ..WishlistQuery::new(Utc::now())
            });
            log_page(&state.apply(&items), |w| {
                format!(
                    "#{:<5} {:<28} {:<28} {}",
                    w.id.get(),
                    w.user.as_ref().map_or("", |u| u.email()),
                    w.product.name(),
                    w.added_at.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_default()
                )
            });
        }
        WishlistAction::Remove { id } => {
            let mut console = ctx.console();
            load(&mut console).await?;
            console.remove_wishlist_item(id).await?;
        }
    }
    Ok(())
}

pub async fn compares(ctx: &Context, action: CompareItemAction) -> Result<(), AppError> {
    let console = ctx.console();
    match action {
        CompareItemAction::List => {
            let items = console.compares().await?;
            if items.is_empty() {
                tracing::info!("No compare entries");
            }
            for item in items {
                tracing::info!(
                    "#{:<5} {:<28} {}",
                    item.id.get(),
                    item.user.as_ref().map_or("", |u| u.email()),
                    item.product.name()
                );
            }
        }
        CompareItemAction::Remove { id } => console.remove_compare_item(id).await?,
    }
    Ok(())
}

/// Revenue, refunds and order counts.
pub async fn analytics(ctx: &Context) -> Result<(), AppError> {
    let summary = ctx.console().analytics().await?;
    tracing::info!(
        "Revenue {}  Net {}  Refunds {}",
        format_currency(summary.total_revenue),
        format_currency(summary.net_revenue),
        format_currency(summary.total_refunds)
    );
    tracing::info!(
        "Today {}  Daily average {}",
        format_currency(summary.today_sales),
        format_currency(summary.avg_daily_sales)
    );
    tracing::info!(
        "Completed {}  Cancelled {}  Refund rate {}%",
        summary.completed_orders_count,
        summary.cancelled_orders,
        summary.refund_rate
    );
    Ok(())
}

/// Mutations look rows up in the loaded dashboard, so load it first.
async fn load(console: &mut AdminConsole) -> Result<(), AppError> {
    console.refresh().await?;
    Ok(())
}

pub(crate) fn log_page<T>(page: &Page<T>, row: impl Fn(&T) -> String) {
    if page.total == 0 {
        tracing::info!("No matches");
        return;
    }
    for item in &page.items {
        tracing::info!("{}", row(item));
    }
    tracing::info!("Page {} of {} ({} matches)", page.page, page.page_count, page.total);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_args_build_list_state() {
        let paging = PageArgs {
            page: 3,
            page_size: NonZeroUsize::new(5).unwrap_or(NonZeroUsize::MIN),
        };
        let state = paging.state(UserQuery::default());
        assert_eq!(state.page(), 3);
        assert_eq!(state.page_size().get(), 5);
    }
}
