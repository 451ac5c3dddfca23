//! Seller Console - backend sync for order views.
//!
//! This crate connects the pure order logic in `seller-console-core` to the
//! order backend:
//! - [`sync`] - `OrderView` and the operations that fetch, patch and merge
//! - [`backend`] - the `Backend` transport trait and its reqwest implementation
//! - [`auth`] - bearer token injection
//! - [`email`] - customer email templates
//! - [`shipglobal`] - cross-border booking through ShipGlobal
//! - [`analytics`] - courier and geography delivery performance
//! - [`config`] - environment configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use seller_console::{ConsoleConfig, HttpBackend, OrderFeed, OrderView, StaticToken};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConsoleConfig::from_env()?;
//! let backend = HttpBackend::new(&config)?;
//! let auth = StaticToken::from(config.api_token.clone());
//!
//! let view = Arc::new(OrderView::new(OrderFeed::Unshipped, backend, auth));
//! view.fetch_orders().await?;
//! view.sync_shipping_price().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod auth;
pub mod backend;
pub mod config;
pub mod email;
pub mod error;
pub mod shipglobal;
pub mod sync;

pub use analytics::{
    Analytics, AnalyticsError, AreaMetrics, CityPerformance, CourierMetrics, CourierPerformance,
    DateRange, PincodePerformance, ProblemAreas, StatePerformance,
};
pub use auth::{AuthProvider, StaticToken};
pub use backend::{Backend, BackendRequest, HttpBackend};
pub use config::{ConfigError, ConsoleConfig};
pub use email::{EmailDraft, EmailError, OrderEmail, TRACKING_ID_PLACEHOLDER, compose_email};
pub use error::{FetchError, SyncError};
pub use shipglobal::{
    PickupAddress, PickupAddressId, ShipGlobal, ShipGlobalError, ShipGlobalOrder,
    ShipGlobalOrderId, ShipperRate, validate_for_shipglobal,
};
pub use sync::{
    FetchSummary, MergeSummary, Operation, OrderFeed, OrderView, PrependSummary, ShipmentMode,
    StatusBucket, shipping_price_candidates,
};
