//! Emporium CLI - storefront admin from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (tokens are kept in EMPORIUM_STATE_FILE)
//! emp login -u admin --password "$EMPORIUM_PASSWORD"
//!
//! # Dashboard overview
//! emp dashboard
//!
//! # Low-stock products, cheapest first, second page
//! emp products list --status low_stock --sort price_low --page 2
//!
//! # Move an order along
//! emp orders status 42 shipped
//!
//! # Delete without the confirmation prompt
//! emp --yes products delete 7
//!
//! # Apply an offer code, then check out
//! emp offers apply WELCOME10
//! emp checkout --payment "Cash on Delivery"
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `dashboard` - Stats and per-section load status
//! - `products`, `categories`, `orders`, `users`, `wishlists` - Admin lists and CRUD
//! - `recommend` - Recommendation shelves (simulated when the backend has none)
//! - `searches` - Recent search history
//! - `cart` - Shopping cart
//! - `offers` - Apply offers, and the admin offer table
//! - `checkout`, `orders mine|track|cancel` - The shopper's orders
//! - `wishlist`, `compare`, `reviews` - The shopper's saved lists and reviews
//! - `register` / `profile` - Account
//! - `compares` / `analytics` - Admin compare entries and revenue figures

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use emporium_admin::ClientConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod prompt;

use commands::account::{CompareAction, ProfileAction, RegisterFields, ReviewAction, SavedListAction};
use commands::admin::{CategoryAction, CompareItemAction, OrderAction, ProductAction, UserAction, WishlistAction};
use commands::offers::OfferAction;
use commands::shop::{CartAction, RecommendAction, SearchAction};

#[derive(Parser)]
#[command(name = "emp")]
#[command(author, version, about = "Emporium storefront admin CLI")]
struct Cli {
    /// Backend base URL (overrides `EMPORIUM_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Username or email
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "EMPORIUM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Load every dashboard section
    Dashboard {
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage wishlists
    Wishlists {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Recommendation shelves
    Recommend {
        #[command(subcommand)]
        action: RecommendAction,
    },
    /// Recent searches
    Searches {
        #[command(subcommand)]
        action: SearchAction,
    },
    /// Shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Offers and promotions
    Offers {
        #[command(subcommand)]
        action: OfferAction,
    },
    /// Place an order for the cart
    Checkout {
        #[arg(long)]
        address: Option<String>,
        #[arg(long = "payment")]
        payment_method: Option<String>,
    },
    /// Your wishlist
    Wishlist {
        #[command(subcommand)]
        action: SavedListAction,
    },
    /// Your compare list
    Compare {
        #[command(subcommand)]
        action: CompareAction,
    },
    /// Product reviews
    Reviews {
        #[command(subcommand)]
        action: ReviewAction,
    },
    /// Create an account and sign in as it
    Register {
        #[command(flatten)]
        fields: RegisterFields,
    },
    /// Your account details
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Every shopper's compare entries
    Compares {
        #[command(subcommand)]
        action: CompareItemAction,
    },
    /// Revenue and refund figures
    Analytics,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &ClientConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "emp=info,emporium_admin=info,notice=info".into());

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(|| tracing_subscriber::fmt::layer().without_time().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet: fall back to a plain one so the error is seen.
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry first, so the tracing layer has a client to report to
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = match cli.api_url.as_deref() {
        Some(raw) => config.with_api_url(emporium_admin::config::parse_base_url(raw)?),
        None => config,
    };
    let ctx = commands::Context::open(config, cli.yes)?;

    match cli.command {
        Commands::Login { username, password } => commands::session::login(&ctx, username, password).await?,
        Commands::Logout => commands::session::logout(&ctx)?,
        Commands::Whoami => commands::session::whoami(&ctx)?,
        Commands::Dashboard { timeout } => commands::admin::dashboard(&ctx, timeout).await?,
        Commands::Products { action } => commands::admin::products(&ctx, action).await?,
        Commands::Categories { action } => commands::admin::categories(&ctx, action).await?,
        Commands::Orders { action } => commands::admin::orders(&ctx, action).await?,
        Commands::Users { action } => commands::admin::users(&ctx, action).await?,
        Commands::Wishlists { action } => commands::admin::wishlists(&ctx, action).await?,
        Commands::Recommend { action } => commands::shop::recommend(&ctx, action).await?,
        Commands::Searches { action } => commands::shop::searches(&ctx, action)?,
        Commands::Cart { action } => commands::shop::cart(&ctx, action).await?,
        Commands::Offers { action } => commands::offers::offers(&ctx, action).await?,
        Commands::Checkout {
            address,
            payment_method,
        } => commands::account::checkout(&ctx, address, payment_method).await?,
        Commands::Wishlist { action } => commands::account::wishlist(&ctx, action).await?,
        Commands::Compare { action } => commands::account::compare(&ctx, action).await?,
        Commands::Reviews { action } => commands::account::reviews(&ctx, action).await?,
        Commands::Register { fields } => commands::account::register(&ctx, fields).await?,
        Commands::Profile { action } => commands::account::profile(&ctx, action).await?,
        Commands::Compares { action } => commands::admin::compares(&ctx, action).await?,
        Commands::Analytics => commands::admin::analytics(&ctx).await?,
    }
    Ok(())
}
