//! Seller Console CLI - order operations from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List unshipped orders with status, profit and totals
//! sc-cli fetch
//!
//! # Pull orders created since a date into the history feed
//! sc-cli --feed history sync-orders --date 2024-05-01
//!
//! # Set the cost of one order
//! sc-cli patch --id 108829953234001 --field cost --value 250
//!
//! # Send the shipment email
//! sc-cli send-email --id 108829953234001 --kind shipment
//!
//! # Quote an order with ShipGlobal, then book it as a draft
//! sc-cli shipglobal --id 108829953234001
//! sc-cli shipglobal --id 108829953234001 --shipper sgx --draft
//!
//! # Courier performance for May
//! sc-cli courier-performance --start 2024-05-01 --end 2024-05-31
//! ```
//!
//! # Commands
//!
//! - `fetch` - Load a feed and list it
//! - `pending-emails` - List orders that still owe a status email
//! - `sync-shipping-price` - Fetch shipping prices for shipped orders
//! - `sync-orders` - Pull new marketplace orders since a date
//! - `update-status` - Transition a status bucket
//! - `patch` - Change one field of one order
//! - `send-email` - Compose and send a customer email
//! - `shipment-status` - Refresh carrier status for one order
//! - `submit-shipment` - Create or amend the carrier order
//! - `ship-in-walmart` - Confirm shipment to the marketplace
//! - `shipglobal` - Validate, quote and book an order with ShipGlobal
//! - `courier-performance` / `courier-details` - Courier analytics
//! - `geography` / `problem-areas` - Pincode, city and state analytics

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use seller_console::analytics::{DEFAULT_MIN_ORDERS, DEFAULT_PINCODE_LIMIT};
use seller_console::{DateRange, OrderFeed, ShipmentMode, StatusBucket};
use seller_console_core::EmailKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "sc-cli")]
#[command(author, version, about = "Seller console order tools")]
struct Cli {
    /// Feed to load before running the command
    #[arg(short, long, value_enum, global = true, default_value = "unshipped")]
    feed: FeedArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the feed and list its orders
    Fetch,
    /// List orders whose shipment or delivery email has not been sent
    PendingEmails,
    /// Fetch shipping prices for orders that have none
    SyncShippingPrice,
    /// Pull marketplace orders created since a date
    SyncOrders {
        /// First day to include (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,
    },
    /// Transition every order in a status bucket
    UpdateStatus {
        #[arg(value_enum)]
        bucket: BucketArg,
    },
    /// Change one field of one order
    Patch {
        /// Purchase order id
        #[arg(short, long)]
        id: String,

        /// Wire field name, e.g. `cost` or `trackingNumber`
        #[arg(long)]
        field: String,

        /// New value; parsed as JSON, otherwise sent as a string
        #[arg(long)]
        value: String,
    },
    /// Compose and send a customer email
    SendEmail {
        /// Purchase order id
        #[arg(short, long)]
        id: String,

        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Override the recipient
        #[arg(long)]
        to: Option<String>,

        /// Override the subject
        #[arg(long)]
        subject: Option<String>,

        /// Override the HTML body
        #[arg(long)]
        body: Option<String>,

        /// Tracking id for the order tracking template
        #[arg(long)]
        tracking_id: Option<String>,
    },
    /// Refresh carrier status and tracking for one order
    ShipmentStatus {
        #[arg(short, long)]
        customer_order_id: String,
    },
    /// Create or amend the carrier order for one order
    SubmitShipment {
        /// Purchase order id
        #[arg(short, long)]
        id: String,

        #[arg(short, long, value_enum, default_value = "create")]
        mode: ModeArg,
    },
    /// Confirm shipment of one order to the marketplace
    ShipInWalmart {
        /// Purchase order id
        #[arg(short, long)]
        id: String,
    },
    /// Validate and quote one order with ShipGlobal; book it when a shipper is given
    Shipglobal {
        /// Purchase order id
        #[arg(short, long)]
        id: String,

        /// Pickup address id; defaults to the account's default address
        #[arg(long)]
        pickup: Option<String>,

        /// Provider code of the rate to book
        #[arg(long)]
        shipper: Option<String>,

        /// Park the booked order as a draft
        #[arg(long)]
        draft: bool,
    },
    /// Delivery and RTO metrics per courier
    CourierPerformance {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Metrics for one courier
    CourierDetails {
        /// Courier name as reported by the backend
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        range: RangeArgs,
    },
    /// Pincode, city and state performance
    Geography {
        #[command(flatten)]
        range: RangeArgs,

        /// Maximum pincodes to fetch
        #[arg(long, default_value_t = DEFAULT_PINCODE_LIMIT)]
        limit: u32,
    },
    /// Pincodes with high RTO or slow delivery
    ProblemAreas {
        #[command(flatten)]
        range: RangeArgs,

        /// Ignore pincodes with fewer orders
        #[arg(long, default_value_t = DEFAULT_MIN_ORDERS)]
        min_orders: u32,
    },
}

#[derive(clap::Args)]
struct RangeArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,
}

impl RangeArgs {
    fn range(&self) -> Result<DateRange, commands::CommandError> {
        Ok(DateRange::new(self.start, self.end)?)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedArg {
    Unshipped,
    History,
    Promotion,
}

impl From<FeedArg> for OrderFeed {
    fn from(arg: FeedArg) -> Self {
        match arg {
            FeedArg::Unshipped => Self::Unshipped,
            FeedArg::History => Self::History,
            FeedArg::Promotion => Self::Promotion,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BucketArg {
    Created,
    Shipped,
}

impl From<BucketArg> for StatusBucket {
    fn from(arg: BucketArg) -> Self {
        match arg {
            BucketArg::Created => Self::CreatedOrder,
            BucketArg::Shipped => Self::ShippedOrder,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Shipment,
    Delivered,
    Promotional,
    OrderTracking,
}

impl From<KindArg> for EmailKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Shipment => Self::Shipment,
            KindArg::Delivered => Self::Delivered,
            KindArg::Promotional => Self::Promotional,
            KindArg::OrderTracking => Self::OrderTracking,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Create,
    Update,
}

impl From<ModeArg> for ShipmentMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Create => Self::Create,
            ModeArg::Update => Self::Update,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env before the filter is built so RUST_LOG can live there too
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        if e.is_unauthenticated() {
            tracing::error!("Session rejected by the backend, log in again and retry");
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "seller_console=info,sc_cli=info".into());

    // JSON lines when asked for, text otherwise
    let json = std::env::var("SELLER_CONSOLE_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    // Analytics reads backend aggregates and needs no feed
    match &cli.command {
        Commands::CourierPerformance { range } => {
            return commands::analytics::courier_performance(range.range()?).await;
        }
        Commands::CourierDetails { name, range } => {
            return commands::analytics::courier_details(name, range.range()?).await;
        }
        Commands::Geography { range, limit } => {
            return commands::analytics::geography(range.range()?, *limit).await;
        }
        Commands::ProblemAreas { range, min_orders } => {
            return commands::analytics::problem_areas(range.range()?, *min_orders).await;
        }
        _ => {}
    }

    let console = commands::Console::connect(cli.feed.into()).await?;

    match cli.command {
        Commands::Fetch => console.list().await,
        Commands::PendingEmails => console.list_pending_emails().await,
        Commands::SyncShippingPrice => commands::sync::shipping_price(&console).await?,
        Commands::SyncOrders { date } => commands::sync::orders_since(&console, date).await?,
        Commands::UpdateStatus { bucket } => {
            commands::sync::update_status(&console, bucket.into()).await?;
        }
        Commands::Patch { id, field, value } => {
            commands::order::patch(&console, &id, &field, &value).await?;
        }
        Commands::SendEmail {
            id,
            kind,
            to,
            subject,
            body,
            tracking_id,
        } => {
            let overrides = commands::order::EmailOverrides {
                to,
                subject,
                body,
                tracking_id,
            };
            commands::order::email(&console, &id, kind.into(), overrides).await?;
        }
        Commands::ShipmentStatus { customer_order_id } => {
            commands::order::shipment_status(&console, &customer_order_id).await?;
        }
        Commands::SubmitShipment { id, mode } => {
            commands::order::submit_shipment(&console, &id, mode.into()).await?;
        }
        Commands::ShipInWalmart { id } => commands::order::ship(&console, &id).await?,
        Commands::Shipglobal {
            id,
            pickup,
            shipper,
            draft,
        } => {
            let options = commands::shipglobal::BookingOptions {
                pickup,
                shipper,
                draft,
            };
            commands::shipglobal::book(&console, &id, options).await?;
        }
        Commands::CourierPerformance { .. }
        | Commands::CourierDetails { .. }
        | Commands::Geography { .. }
        | Commands::ProblemAreas { .. } => {}
    }
    Ok(())
}
