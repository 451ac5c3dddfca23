//! Command implementations.
//!
//! Every command runs against a [`Console`]: configuration from the
//! environment, an HTTP backend and one loaded [`OrderView`].
//!
//! # Environment Variables
//!
//! - `SELLER_CONSOLE_API_BASE_URL` - Base URL of the order backend
//! - `SELLER_CONSOLE_API_TOKEN` - Bearer token for backend requests

pub mod analytics;
pub mod order;
pub mod shipglobal;
pub mod sync;

use rust_decimal::Decimal;
use seller_console::{
    AnalyticsError, ConfigError, ConsoleConfig, EmailError, FetchError, HttpBackend, OrderFeed,
    OrderView, ShipGlobal, ShipGlobalError, StaticToken, SyncError,
};
use seller_console_core::{
    Order, OrderKey, OrderStats, ProfitConfig, PurchaseOrderId, ValidationError,
    compute_aggregate_profit, compute_order_profit, present_optional_status,
};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] FetchError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    ShipGlobal(#[from] ShipGlobalError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No pickup address given and none is marked default")]
    NoPickupAddress,

    #[error("Order not found in the loaded feed: {0}")]
    UnknownOrder(String),
}

impl CommandError {
    /// Whether the backend rejected the session.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        match self {
            Self::Backend(err) => err.is_unauthenticated(),
            Self::Sync(err) => err.is_unauthenticated(),
            Self::ShipGlobal(err) => err.is_unauthenticated(),
            Self::Analytics(err) => err.is_unauthenticated(),
            _ => false,
        }
    }
}

/// Configuration plus a backend and credential built from it.
pub struct Connection {
    pub config: ConsoleConfig,
    pub backend: HttpBackend,
    pub auth: StaticToken,
}

impl Connection {
    /// Load configuration from the environment and build the backend.
    pub fn from_env() -> Result<Self, CommandError> {
        let config = ConsoleConfig::from_env()?;
        tracing::debug!(?config, "configuration loaded");

        let backend = HttpBackend::new(&config)?;
        let auth = StaticToken::from(config.api_token.clone());
        Ok(Self {
            config,
            backend,
            auth,
        })
    }
}

/// A loaded view plus the settings needed to report on it.
pub struct Console {
    pub view: OrderView<HttpBackend, StaticToken>,
    pub shipglobal: ShipGlobal<HttpBackend, StaticToken>,
    pub profit: ProfitConfig,
}

impl Console {
    /// Load configuration, build the backend and fetch `feed`.
    pub async fn connect(feed: OrderFeed) -> Result<Self, CommandError> {
        let Connection {
            config,
            backend,
            auth,
        } = Connection::from_env()?;
        let shipglobal = ShipGlobal::new(backend.clone(), auth.clone());
        let view = OrderView::new(feed, backend, auth);

        let summary = view.fetch_orders().await?;
        tracing::info!(
            feed = ?feed,
            loaded = summary.loaded,
            skipped = summary.duplicates + summary.decode_failures,
            "Feed loaded"
        );

        Ok(Self {
            view,
            shipglobal,
            profit: config.profit,
        })
    }

    /// Look up a loaded order by purchase order id.
    pub async fn require(&self, id: &str) -> Result<(OrderKey, Order), CommandError> {
        let key = OrderKey::Purchase(PurchaseOrderId::new(id));
        let order = self
            .view
            .order(&key)
            .await
            .ok_or_else(|| CommandError::UnknownOrder(id.to_owned()))?;
        Ok((key, order))
    }

    /// Log every order, then the totals.
    pub async fn list(&self) {
        let orders = self.view.snapshot().await;
        for order in &orders {
            self.log_order(order);
        }
        self.log_totals(&orders);
    }

    /// Log orders that still owe a shipment or delivery email.
    pub async fn list_pending_emails(&self) {
        let orders = self.view.snapshot().await;
        let mut pending = 0_usize;
        for order in &orders {
            if let Some(kind) = order.pending_email() {
                pending += 1;
                tracing::info!(order = %identity(order), email = %kind, "Email pending");
            }
        }
        tracing::info!(pending, "Pending emails");
    }

    pub fn log_order(&self, order: &Order) {
        let status = present_optional_status(order.status.as_deref());
        let shipment = present_optional_status(order.shipment_status.as_deref());
        tracing::info!(
            order = %identity(order),
            status = status.label,
            shipment = shipment.label,
            profit = %compute_order_profit(order, &self.profit),
            "Order"
        );
    }

    pub fn log_totals(&self, orders: &[Order]) {
        let stats = OrderStats::from_orders(orders);
        let profit: Decimal = compute_aggregate_profit(orders, &self.profit);
        tracing::info!(
            total = stats.total,
            created = stats.count("created"),
            shipped = stats.count("shipped"),
            delivered = stats.count("delivered"),
            profit = %profit,
            "Totals"
        );
    }
}

fn identity(order: &Order) -> String {
    order
        .key()
        .map_or_else(|| "(no id)".to_string(), |key| key.to_string())
}
