//! Order and shipment status presentation.
//!
//! Two tables feed the status badges:
//!
//! - the channel-qualified shipment table (`NOT_CREATED`, `CREATED`,
//!   `SHIPPED_IN_WALMART`, `SHIPPED_IN_SHIP_ROCKET`), matched exactly;
//! - the generic order table (`shipped`, `created`, `canceled`,
//!   `delivered`), matched after lower-casing.
//!
//! The exact-match table is consulted first, so `"CREATED"` renders as the
//! channel badge while `"Created"` and `"created"` render as the generic one.
//! Anything else, including the empty string, renders as `NOT_CREATED`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Badge color for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// Theme primary color.
    Primary,
    /// Theme warning color.
    Warning,
    /// Theme error color.
    Error,
    /// Theme success color.
    Success,
    /// Fixed background color (`#RRGGBB`).
    Hex(&'static str),
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
            Self::Success => f.write_str("success"),
            Self::Hex(hex) => f.write_str(hex),
        }
    }
}

/// Display label and color for a status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusPresentation {
    /// Human-readable label.
    pub label: &'static str,
    /// Badge color.
    pub color: Color,
}

/// Channel-qualified shipment statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// No carrier shipment exists yet.
    #[default]
    NotCreated,
    /// A carrier shipment was created.
    Created,
    /// Shipment confirmed to Walmart.
    ShippedInWalmart,
    /// Shipment handed to Shiprocket.
    ShippedInShipRocket,
}

impl ShipmentStatus {
    /// All channel statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::NotCreated,
        Self::Created,
        Self::ShippedInWalmart,
        Self::ShippedInShipRocket,
    ];

    /// Wire value of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotCreated => "NOT_CREATED",
            Self::Created => "CREATED",
            Self::ShippedInWalmart => "SHIPPED_IN_WALMART",
            Self::ShippedInShipRocket => "SHIPPED_IN_SHIP_ROCKET",
        }
    }

    /// Exact (case-sensitive) lookup of a wire value.
    #[must_use]
    pub fn from_exact(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    /// Badge for this status.
    #[must_use]
    pub const fn presentation(self) -> StatusPresentation {
        match self {
            Self::NotCreated => StatusPresentation {
                label: "Not Created",
                color: Color::Hex("#FFCDD2"),
            },
            Self::Created => StatusPresentation {
                label: "Created",
                color: Color::Hex("#FFF9C4"),
            },
            Self::ShippedInWalmart => StatusPresentation {
                label: "Shipped in Walmart",
                color: Color::Hex("#BBDEFB"),
            },
            Self::ShippedInShipRocket => StatusPresentation {
                label: "Shipped in ShipRocket",
                color: Color::Hex("#C8E6C9"),
            },
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generic order statuses reported by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Case-insensitive lookup of a status value.
    #[must_use]
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "created" => Some(Self::Created),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Lower-case wire value of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }

    /// Badge for this status.
    #[must_use]
    pub const fn presentation(self) -> StatusPresentation {
        match self {
            Self::Created => StatusPresentation {
                label: "Created",
                color: Color::Warning,
            },
            Self::Shipped => StatusPresentation {
                label: "Shipped",
                color: Color::Primary,
            },
            Self::Delivered => StatusPresentation {
                label: "Delivered",
                color: Color::Success,
            },
            Self::Canceled => StatusPresentation {
                label: "Canceled",
                color: Color::Error,
            },
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map any status string to its badge.
///
/// Never fails: unrecognized input gets the `NOT_CREATED` badge.
#[must_use]
pub fn present_status(status: &str) -> StatusPresentation {
    if let Some(shipment) = ShipmentStatus::from_exact(status) {
        return shipment.presentation();
    }
    OrderStatus::parse_loose(status).map_or_else(
        || ShipmentStatus::NotCreated.presentation(),
        OrderStatus::presentation,
    )
}

/// Map an optional status to its badge; absent statuses get `NOT_CREATED`.
#[must_use]
pub fn present_optional_status(status: Option<&str>) -> StatusPresentation {
    status.map_or_else(|| ShipmentStatus::NotCreated.presentation(), present_status)
}
