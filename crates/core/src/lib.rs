//! Seller Console Core - order model and reconciliation logic.
//!
//! This crate holds everything about orders that does not talk to the
//! network:
//! - [`order`] - the `Order` entity, its lines and editable-field bags
//! - [`codec`] - decoding raw backend records, including string-encoded fields,
//!   and encoding them back in the shape they arrived in
//! - [`store`] - `OrderStore`, the canonical order sequence of one view
//! - [`profit`] - per-order and aggregate profit
//! - [`stats`] - order counts per status
//! - [`types`] - identifiers, loosely typed amounts and status presentation
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! client, no async runtime. The `seller-console` crate wires it to the
//! backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod error;
pub mod notification;
pub mod order;
pub mod profit;
pub mod stats;
pub mod store;
pub mod types;

pub use codec::{DecodeFailure, DecodedBatch, decode, decode_batch, encode, patch_order};
pub use error::{DecodeError, ValidationError};
pub use notification::EmailKind;
pub use order::{
    ExplicitNulls, Order, OrderEditableFields, OrderKey, OrderLine, PostalAddress,
    ProductEditableFields, TrackingInfo, WireNames,
};
pub use profit::{
    ProfitBreakdown, ProfitConfig, compute_aggregate_profit, compute_order_profit,
    profit_breakdown,
};
pub use stats::OrderStats;
pub use store::{MergeReport, OrderStore};
pub use types::*;
