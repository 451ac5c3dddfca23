//! Order counts for the dashboard summary.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::order::Order;

/// Total orders and orders per lower-cased status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    /// Orders without a status are counted in `total` only.
    pub by_status: BTreeMap<String, usize>,
}

impl OrderStats {
    #[must_use]
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut stats = Self::default();
        for order in orders {
            stats.total += 1;
            if let Some(status) = order.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                *stats.by_status.entry(status.to_lowercase()).or_default() += 1;
            }
        }
        stats
    }

    /// Orders with `status`, ignoring case.
    #[must_use]
    pub fn count(&self, status: &str) -> usize {
        self.by_status
            .get(&status.trim().to_lowercase())
            .copied()
            .unwrap_or_default()
    }
}
