//! Storefront-side commands: cart, recommendations, search history.

use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use emporium_admin::AppError;
use emporium_admin::services::RecommendationSource;
use emporium_core::models::Cart;
use emporium_core::simulation::{AbVariant, InteractionKind, Recommendation};
use emporium_core::types::{CartItemId, ProductId, format_price};

use super::Context;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add { slug: String },
    /// Set a line's quantity (0 removes it)
    Update { item: CartItemId, quantity: u32 },
    /// Remove a line
    Remove { item: CartItemId },
}

#[derive(Subcommand)]
pub enum RecommendAction {
    /// The four home page shelves
    Home,
    /// Products similar to one product
    Similar { slug: String },
    /// Products not yet viewed from this machine
    Personal,
    /// Best picks as one A/B variant orders them
    Ab {
        #[arg(default_value = "A")]
        variant: AbVariant,
    },
    /// Record an interaction with a product
    Track { product: ProductId, action: Action },
    /// Click-through and conversion figures from the local log
    Metrics,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Action {
    View,
    Click,
    Purchase,
}

impl From<Action> for InteractionKind {
    fn from(action: Action) -> Self {
        match action {
            Action::View => Self::View,
            Action::Click => Self::Click,
            Action::Purchase => Self::Purchase,
        }
    }
}

#[derive(Subcommand)]
pub enum SearchAction {
    /// Show the recent searches menu
    List {
        /// Include entries beyond the first five
        #[arg(long)]
        all: bool,
    },
    /// Record a search
    Add { term: String },
    /// Forget every recent search
    Clear,
}

pub async fn cart(ctx: &Context, action: CartAction) -> Result<(), AppError> {
    let mut service = ctx.cart();
    let cart = match action {
        CartAction::Show => service.refresh().await?,
        CartAction::Add { slug } => service.add(&slug).await?,
        CartAction::Update { item, quantity } => service.update(item, quantity).await?,
        CartAction::Remove { item } => service.remove(item).await?,
    };
    log_cart(cart);
    Ok(())
}

fn log_cart(cart: &Cart) {
    if cart.items.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }
    for item in &cart.items {
        tracing::info!(
            "#{:<5} {:<32} x{:<3} {:>10}",
            item.id.get(),
            item.product.name,
            item.quantity,
            format_price(item.product.price)
        );
    }
    tracing::info!("{} items, total {}", cart.item_count(), format_price(cart.total_price));
}

pub async fn recommend(ctx: &Context, action: RecommendAction) -> Result<(), AppError> {
    let service = ctx.recommendations();
    let now = Utc::now();
    match action {
        RecommendAction::Home => {
            let recs = service.home(now).await?;
            if recs.source == RecommendationSource::Simulated {
                tracing::info!("(simulated shelves)");
            }
            log_shelf("Most ordered", &recs.shelves.most_ordered);
            log_shelf("Most popular", &recs.shelves.most_popular);
            log_shelf("Customers also viewed", &recs.shelves.knn_recommendations);
            log_shelf("Best picks", &recs.shelves.best_ml_recommendations);
        }
        RecommendAction::Similar { slug } => log_shelf("Similar", &service.similar(&slug, now).await?),
        RecommendAction::Personal => log_shelf("For you", &service.personalized(now).await?),
        RecommendAction::Ab { variant } => {
            log_shelf(&format!("Best picks ({variant})"), &service.ab_test(variant, now).await?);
        }
        RecommendAction::Track { product, action } => {
            ctx.history().track(product, action.into(), now)?;
        }
        RecommendAction::Metrics => {
            let metrics = ctx.history().metrics()?;
            tracing::info!(
                "{} interactions: {} views, {} clicks, {} purchases",
                metrics.total_interactions,
                metrics.total_views,
                metrics.total_clicks,
                metrics.total_purchases
            );
            tracing::info!(
                "Click-through {}%  Conversion {}%",
                metrics.click_through_rate,
                metrics.conversion_rate
            );
        }
    }
    Ok(())
}

fn log_shelf(title: &str, shelf: &[Recommendation]) {
    tracing::info!("{title}:");
    if shelf.is_empty() {
        tracing::info!("  (nothing yet)");
    }
    for rec in shelf {
        let score = rec
            .ml_score
            .map(|s| format!(" score {s}"))
            .or_else(|| rec.total_orders.map(|n| format!(" {n} orders")))
            .or_else(|| rec.review_count.map(|n| format!(" {n} reviews")))
            .unwrap_or_default();
        tracing::info!("  {:<32} {:>10}{score}", rec.product.name, format_price(rec.product.price));
    }
}

pub fn searches(ctx: &Context, action: SearchAction) -> Result<(), AppError> {
    let history = ctx.history();
    match action {
        SearchAction::List { all } => {
            let recent = history.recent_searches()?;
            let terms = if all { recent.terms() } else { recent.shown() };
            if terms.is_empty() {
                tracing::info!("No recent searches");
            }
            for term in terms {
                tracing::info!("{term}");
            }
        }
        SearchAction::Add { term } => {
            history.record_search(&term)?;
        }
        SearchAction::Clear => history.clear_searches()?,
    }
    Ok(())
}
