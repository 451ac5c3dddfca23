//! Core value types for the seller console.
//!
//! This module provides type-safe wrappers for identifiers, loosely typed
//! amounts and status values.

pub mod amount;
pub mod id;
pub mod status;

pub use amount::{RawAmount, amount_or_zero, whole_units_or_zero};
pub use id::*;
pub use status::*;
