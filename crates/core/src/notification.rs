//! Customer notification kinds and which one an order is due.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::order::Order;

/// Customer email templates known to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailKind {
    #[serde(rename = "shipmentEmail")]
    Shipment,
    #[serde(rename = "deliveredEmail")]
    Delivered,
    #[serde(rename = "promotionalEmail")]
    Promotional,
    #[serde(rename = "orderTrackingEmail")]
    OrderTracking,
}

impl EmailKind {
    pub const ALL: [Self; 4] = [
        Self::Shipment,
        Self::Delivered,
        Self::Promotional,
        Self::OrderTracking,
    ];

    /// Wire value sent as the email `type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipment => "shipmentEmail",
            Self::Delivered => "deliveredEmail",
            Self::Promotional => "promotionalEmail",
            Self::OrderTracking => "orderTrackingEmail",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Order {
    /// The status notification this order still owes the customer.
    ///
    /// Matches the status exactly: `SHIPPED` without a sent shipment email,
    /// `DELIVERED` without a sent delivery email.
    #[must_use]
    pub fn pending_email(&self) -> Option<EmailKind> {
        match self.status.as_deref()? {
            "SHIPPED" if self.shipment_email != Some(true) => Some(EmailKind::Shipment),
            "DELIVERED" if self.delivered_email != Some(true) => Some(EmailKind::Delivered),
            _ => None,
        }
    }
}
