//! The signed-in shopper: checkout, saved lists, reviews and the account.
//!
//! ```bash
//! emp checkout --payment "Cash on Delivery"
//! emp wishlist add usb-c-cable
//! emp compare add 2
//! emp reviews add 1 --rating 5 --comment "Solid"
//! emp register -u asha --email asha@shop.test
//! ```

use clap::Subcommand;
use emporium_admin::AppError;
use emporium_admin::api::{CheckoutRequest, NewReview, ProfileUpdate, RegisterRequest};
use emporium_core::models::{CompareItem, Order, User, WishlistItem};
use emporium_core::types::{ProductId, format_price};
use secrecy::SecretString;

use super::Context;

#[derive(Subcommand)]
pub enum SavedListAction {
    List,
    /// Add a product
    Add { product: String },
    /// Remove a product
    Remove { product: ProductId },
}

#[derive(Subcommand)]
pub enum CompareAction {
    List,
    /// Add a product (at most four)
    Add { product: ProductId },
    Remove { product: ProductId },
    /// Empty the compare list
    Clear,
}

#[derive(Subcommand)]
pub enum ReviewAction {
    List { product: ProductId },
    Add {
        product: ProductId,
        /// 1 to 5
        #[arg(long)]
        rating: u8,
        #[arg(long, default_value = "")]
        comment: String,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    Show,
    /// Change the given fields only
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
}

pub async fn checkout(ctx: &Context, address: Option<String>, payment_method: Option<String>) -> Result<(), AppError> {
    let request = CheckoutRequest {
        address,
        payment_method,
        payment_status: None,
    };
    let order = ctx.orders().checkout(&request).await?;
    log_order(&order);
    Ok(())
}

/// `wishlist add` takes a product slug, like `cart add`.
pub async fn wishlist(ctx: &Context, action: SavedListAction) -> Result<(), AppError> {
    let shopper = ctx.shopper();
    match action {
        SavedListAction::List => log_saved(&shopper.wishlist().await?),
        SavedListAction::Add { product } => shopper.add_to_wishlist(&product).await?,
        SavedListAction::Remove { product } => shopper.remove_from_wishlist(product).await?,
    }
    Ok(())
}

pub async fn compare(ctx: &Context, action: CompareAction) -> Result<(), AppError> {
    let shopper = ctx.shopper();
    match action {
        CompareAction::List => log_compare(&shopper.compare_list().await?),
        CompareAction::Add { product } => log_compare(&shopper.add_to_compare(product).await?),
        CompareAction::Remove { product } => shopper.remove_from_compare(product).await?,
        CompareAction::Clear => shopper.clear_compare().await?,
    }
    Ok(())
}

pub async fn reviews(ctx: &Context, action: ReviewAction) -> Result<(), AppError> {
    let shopper = ctx.shopper();
    match action {
        ReviewAction::List { product } => {
            let reviews = shopper.reviews(product).await?;
            if reviews.is_empty() {
                tracing::info!("No reviews yet");
            }
            for review in reviews {
                tracing::info!(
                    "{} {:<16} {}",
                    "*".repeat(usize::from(review.rating)),
                    review.user.as_ref().map_or("", |u| u.first_name()),
                    review.comment
                );
            }
        }
        ReviewAction::Add {
            product,
            rating,
            comment,
        } => {
            shopper.add_review(product, &NewReview { rating, comment }).await?;
        }
    }
    Ok(())
}

pub async fn register(ctx: &Context, request: RegisterFields) -> Result<(), AppError> {
    let request = RegisterRequest {
        username: request.username,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        password: SecretString::from(request.password),
        password_confirm: SecretString::from(request.password_confirm),
    };
    let user = ctx.shopper().register(&request).await?;
    log_user(&user);
    Ok(())
}

/// Registration form; both passwords come from the environment or flags.
#[derive(clap::Args)]
pub struct RegisterFields {
    #[arg(short, long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, env = "EMPORIUM_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, env = "EMPORIUM_PASSWORD_CONFIRM", hide_env_values = true)]
    password_confirm: String,
}

pub async fn profile(ctx: &Context, action: ProfileAction) -> Result<(), AppError> {
    let shopper = ctx.shopper();
    let user = match action {
        ProfileAction::Show => shopper.profile().await?,
        ProfileAction::Update {
            email,
            first_name,
            last_name,
        } => {
            shopper
                .update_profile(&ProfileUpdate {
                    email,
                    first_name,
                    last_name,
                })
                .await?
        }
    };
    log_user(&user);
    Ok(())
}

pub(crate) fn log_order(order: &Order) {
    tracing::info!(
        "{:<14} {:<10} {:>12}  {} items  {}",
        order.order_id,
        order.status.as_str(),
        format_price(order.amount()),
        order.item_count(),
        order.created_at.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_default()
    );
}

fn log_user(user: &User) {
    tracing::info!("{} <{}> {}", user.username, user.email, user.full_name());
}

fn log_saved(items: &[WishlistItem]) {
    if items.is_empty() {
        tracing::info!("Wishlist is empty");
    }
    for item in items {
        tracing::info!("#{:<5} {}", item.product.id().map_or(0, ProductId::get), item.product.name());
    }
}

fn log_compare(items: &[CompareItem]) {
    if items.is_empty() {
        tracing::info!("Nothing to compare");
    }
    for item in items {
        tracing::info!("#{:<5} {}", item.product.id().map_or(0, ProductId::get), item.product.name());
    }
}
