//! Offer commands: the shopper's apply/remove and the admin offer desk.
//!
//! ```bash
//! emp offers apply WELCOME10
//! emp offers list --type flat --usage unused
//! emp offers create --name "Festive" --code fest10 --type discount --discount 10 \
//!     --start 2025-10-01 --end 2025-10-31
//! emp offers usage --all
//! ```

use std::num::NonZeroUsize;

use clap::{Args, Subcommand};
use emporium_admin::AppError;
use emporium_admin::api::OfferSelector;
use emporium_admin::services::{OfferDesk, ServiceError};
use emporium_core::forms::OfferDraft;
use emporium_core::models::{OfferPriority, OfferType};
use emporium_core::query::{OfferQuery, OfferStatusFilter, UsageFilter};
use emporium_core::types::{CategoryId, OfferId, ProductId, format_currency, format_price};

use super::Context;
use super::admin::{PageArgs, log_page};

/// Offer form fields; unset fields keep their current value on update.
#[derive(Args)]
pub struct OfferFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    code: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// discount, flat, `category_offer`, `first_time`, combo
    #[arg(long = "type")]
    offer_type: Option<OfferType>,
    /// Percentage off
    #[arg(long)]
    discount: Option<String>,
    /// Amount off
    #[arg(long)]
    flat: Option<String>,
    #[arg(long)]
    buy: Option<String>,
    #[arg(long)]
    get: Option<String>,
    #[arg(long)]
    min_order: Option<String>,
    /// low, medium, high
    #[arg(long)]
    priority: Option<OfferPriority>,
    /// `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` or RFC 3339
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,
    #[arg(long)]
    active: Option<bool>,
    #[arg(long)]
    auto_apply: Option<bool>,
    #[arg(long)]
    first_time_only: Option<bool>,
    #[arg(long)]
    badge: Option<String>,
    /// Product id; repeat for more
    #[arg(long = "product")]
    products: Vec<ProductId>,
    /// Category id; repeat for more
    #[arg(long = "category")]
    categories: Vec<CategoryId>,
}

impl OfferFields {
    fn apply_to(self, draft: &mut OfferDraft) {
        let set = |field: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *field = value;
            }
        };
        set(&mut draft.name, self.name);
        set(&mut draft.code, self.code);
        set(&mut draft.description, self.description);
        set(&mut draft.discount_percentage, self.discount);
        set(&mut draft.flat_discount, self.flat);
        set(&mut draft.buy_quantity, self.buy);
        set(&mut draft.get_quantity, self.get);
        set(&mut draft.min_order_value, self.min_order);
        set(&mut draft.start_date, self.start);
        set(&mut draft.end_date, self.end);
        set(&mut draft.badge_text, self.badge);
        if let Some(offer_type) = self.offer_type {
            draft.offer_type = offer_type;
        }
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if let Some(active) = self.active {
            draft.is_active = active;
        }
        if let Some(auto_apply) = self.auto_apply {
            draft.auto_apply = auto_apply;
        }
        if let Some(first_time_only) = self.first_time_only {
            draft.first_time_only = first_time_only;
        }
        if !self.products.is_empty() {
            draft.product_ids = self.products;
        }
        if !self.categories.is_empty() {
            draft.category_ids = self.categories;
        }
    }
}

#[derive(Subcommand)]
pub enum OfferAction {
    /// Offers open to shoppers right now
    Active,
    /// Apply an offer to the cart by code, or by id with `--id`
    Apply {
        #[arg(required_unless_present = "id")]
        code: Option<String>,
        #[arg(long, conflicts_with = "code")]
        id: Option<OfferId>,
    },
    /// Take an applied offer off the cart
    Remove { id: OfferId },
    /// Which products a combo offer still needs in the cart
    Combo { id: OfferId },
    /// Filter and page the admin offer table
    List {
        /// Name or code
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long = "type")]
        offer_type: Option<OfferType>,
        /// all, active, inactive
        #[arg(long, default_value = "all")]
        status: OfferStatusFilter,
        /// all, high, low, unused
        #[arg(long, default_value = "all")]
        usage: UsageFilter,
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Create an offer
    Create {
        #[command(flatten)]
        fields: OfferFields,
    },
    /// Edit an offer
    Update {
        id: OfferId,
        #[command(flatten)]
        fields: OfferFields,
    },
    /// Flip an offer between active and inactive
    Toggle { id: OfferId },
    /// Delete an offer (asks first)
    Delete { id: OfferId },
    /// Deactivate an offer and remove it from every cart (asks first)
    Revoke { id: OfferId },
    /// Recount redemptions from order history
    Usage {
        #[arg(required_unless_present = "all")]
        id: Option<OfferId>,
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
}

pub async fn offers(ctx: &Context, action: OfferAction) -> Result<(), AppError> {
    match action {
        OfferAction::Active => {
            for offer in ctx.offers().active().await? {
                tracing::info!("#{:<4} {:<12} {:<28} {}", offer.id.get(), offer.code, offer.name, offer.summary());
            }
        }
        OfferAction::Apply { code, id } => {
            let selector = match (id, code) {
                (Some(id), _) => OfferSelector::Id(id),
                (None, Some(code)) => OfferSelector::Code(code.trim().to_uppercase()),
                (None, None) => return Err(ServiceError::NotFound("offer code".to_owned()).into()),
            };
            let applied = ctx.offers().apply(&selector).await?;
            tracing::info!("{} saves {}", applied.offer_name, format_currency(applied.discount_amount));
        }
        OfferAction::Remove { id } => ctx.offers().remove(id).await?,
        OfferAction::Combo { id } => {
            let eligibility = ctx.offers().combo_eligibility(id).await;
            if eligibility.eligible {
                tracing::info!("Cart qualifies for offer #{id}");
            }
            for product in &eligibility.missing_products {
                tracing::info!("  missing {} {}", product.name, product.price.map(format_price).unwrap_or_default());
            }
        }
        OfferAction::List {
            search,
            offer_type,
            status,
            usage,
            paging,
        } => {
            let mut desk = ctx.offer_desk(paging.page_size);
            desk.load().await?;
            desk.list_mut().set_criteria(OfferQuery {
                search,
                offer_type,
                status,
                usage,
            });
            desk.list_mut().set_page(paging.page);
            log_page(&desk.page(), |o| {
                format!(
                    "#{:<4} {:<12} {:<28} {:<18} used {:<5} {}",
                    o.id.get(),
                    o.code,
                    o.name,
                    o.summary(),
                    o.used_count,
                    if o.is_active { "active" } else { "inactive" }
                )
            });
        }
        OfferAction::Create { fields } => {
            let mut draft = OfferDraft::new();
            fields.apply_to(&mut draft);
            let offer = ctx.offer_desk(PAGE_SIZE).save(&draft).await?;
            tracing::info!("Created offer #{} {}", offer.id, offer.code);
        }
        OfferAction::Update { id, fields } => {
            let mut desk = loaded_desk(ctx).await?;
            let current = desk
                .offers()
                .iter()
                .find(|o| o.id == id)
                .ok_or_else(|| ServiceError::NotFound(format!("offer {id}")))?;
            let mut draft = OfferDraft::edit(current);
            fields.apply_to(&mut draft);
            desk.save(&draft).await?;
        }
        OfferAction::Toggle { id } => {
            let active = loaded_desk(ctx).await?.toggle(id).await?;
            tracing::info!("Offer #{id} is now {}", if active { "active" } else { "inactive" });
        }
        OfferAction::Delete { id } => loaded_desk(ctx).await?.delete(id).await?,
        OfferAction::Revoke { id } => loaded_desk(ctx).await?.revoke(id).await?,
        OfferAction::Usage { id, all } => {
            let mut desk = loaded_desk(ctx).await?;
            match id {
                Some(id) if !all => {
                    let usage = desk.refresh_usage(id).await?;
                    tracing::info!(
                        "{}: {} -> {} redemptions ({} orders checked)",
                        usage.offer_name,
                        usage.old_count,
                        usage.used_count,
                        usage.total_orders_checked
                    );
                    for redemption in &usage.matching_orders {
                        tracing::info!(
                            "  {:<14} {} {}",
                            redemption.order_id,
                            redemption.created_at.format("%Y-%m-%d"),
                            redemption.user
                        );
                    }
                }
                _ => {
                    let updated = desk.refresh_all_usage().await;
                    tracing::info!("Recounted {updated} of {} offers", desk.offers().len());
                }
            }
        }
    }
    Ok(())
}

/// Page size for commands that never print a page.
const PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(12) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

async fn loaded_desk(ctx: &Context) -> Result<OfferDesk, AppError> {
    let mut desk = ctx.offer_desk(PAGE_SIZE);
    desk.load().await?;
    Ok(desk)
}
