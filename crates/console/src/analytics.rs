//! Delivery analytics: courier and geography performance.
//!
//! The backend computes every metric; this module fetches them for a date
//! range and adds the rankings and totals the console shows alongside.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use seller_console_core::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;

use crate::auth::AuthProvider;
use crate::backend::{Backend, BackendRequest, send_authorized};
use crate::error::FetchError;

const ANALYTICS_BASE: &str = "/shopify/orders/analytics";

/// Pincodes returned by [`Analytics::pincode_performance`] unless asked
/// otherwise.
pub const DEFAULT_PINCODE_LIMIT: u32 = 50;

/// Order floor for [`Analytics::problem_areas`] unless asked otherwise.
pub const DEFAULT_MIN_ORDERS: u32 = 10;

/// Errors that can occur while fetching analytics.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid analytics response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// Whether the caller should send the user back to login.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Fetch(err) if err.is_unauthenticated())
    }
}

/// An inclusive range of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] naming `endDate` when the
    /// range ends before it starts.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::MissingField("endDate"));
        }
        Ok(Self { start, end })
    }

    fn apply(self, request: BackendRequest) -> BackendRequest {
        request
            .query("startDate", self.start.format("%Y-%m-%d").to_string())
            .query("endDate", self.end.format("%Y-%m-%d").to_string())
    }
}

// =============================================================================
// Courier performance
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryMetrics {
    pub total_orders: u64,
    pub delivered_orders: u64,
    /// Percentage, 0 to 100.
    pub success_rate: f64,
    pub avg_delivery_days: f64,
}

/// Return-to-origin counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RtoMetrics {
    #[serde(rename = "rtoCount")]
    pub rto_count: u64,
    #[serde(rename = "rtoRate")]
    pub rto_rate: f64,
    #[serde(rename = "avgRTODays")]
    pub avg_rto_days: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialMetrics {
    #[serde(rename = "totalShippingCharges")]
    pub total_shipping_charges: f64,
    #[serde(rename = "totalRTOCharges")]
    pub total_rto_charges: f64,
}

/// One courier's numbers for the range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourierMetrics {
    pub courier_name: String,
    pub delivery_metrics: DeliveryMetrics,
    pub rto_metrics: RtoMetrics,
    pub financial_metrics: FinancialMetrics,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallSummary {
    #[serde(rename = "totalOrders")]
    pub total_orders: u64,
    #[serde(rename = "totalDelivered")]
    pub total_delivered: u64,
    #[serde(rename = "totalRTO")]
    pub total_rto: u64,
    #[serde(rename = "avgSuccessRate")]
    pub avg_success_rate: f64,
    #[serde(rename = "avgDeliveryDays")]
    pub avg_delivery_days: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourierPerformance {
    pub courier_metrics: Vec<CourierMetrics>,
    pub overall_summary: OverallSummary,
}

impl CourierPerformance {
    /// Couriers ordered by delivery success rate, best first.
    #[must_use]
    pub fn ranked_by_success(&self) -> Vec<&CourierMetrics> {
        let mut couriers: Vec<_> = self.courier_metrics.iter().collect();
        couriers.sort_by(|a, b| {
            b.delivery_metrics
                .success_rate
                .total_cmp(&a.delivery_metrics.success_rate)
        });
        couriers
    }

    /// Shipping plus RTO charges across every courier.
    #[must_use]
    pub fn total_charges(&self) -> f64 {
        self.courier_metrics
            .iter()
            .map(|c| c.financial_metrics.total_shipping_charges + c.financial_metrics.total_rto_charges)
            .sum()
    }
}

// =============================================================================
// Geography
// =============================================================================

/// Delivery numbers for one pincode, city or state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AreaMetrics {
    pub pincode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub total_orders: u64,
    pub delivered_orders: u64,
    pub rto_orders: u64,
    /// Percentage, 0 to 100.
    pub delivery_success_rate: f64,
    pub rto_rate: f64,
    pub avg_delivery_days: f64,
    /// `Fast`, `Average`, `Slow` or `High Risk`.
    pub performance_category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PincodePerformance {
    pub pincode_metrics: Vec<AreaMetrics>,
}

/// Totals over a set of areas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AreaTotals {
    pub total_orders: u64,
    pub delivered_orders: u64,
    pub rto_orders: u64,
    /// Unweighted mean over areas; `None` for no areas.
    pub avg_delivery_days: Option<f64>,
    pub avg_success_rate: Option<f64>,
}

impl PincodePerformance {
    /// Up to `n` pincodes with the lowest average delivery time.
    #[must_use]
    pub fn fastest(&self, n: usize) -> Vec<&AreaMetrics> {
        let mut areas: Vec<_> = self.pincode_metrics.iter().collect();
        areas.sort_by(|a, b| a.avg_delivery_days.total_cmp(&b.avg_delivery_days));
        areas.truncate(n);
        areas
    }

    /// Up to `n` pincodes with the highest average delivery time.
    #[must_use]
    pub fn slowest(&self, n: usize) -> Vec<&AreaMetrics> {
        let mut areas: Vec<_> = self.pincode_metrics.iter().collect();
        areas.sort_by(|a, b| b.avg_delivery_days.total_cmp(&a.avg_delivery_days));
        areas.truncate(n);
        areas
    }

    /// Number of pincodes per performance category. Pincodes without one
    /// are counted under `Unknown`.
    #[must_use]
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for area in &self.pincode_metrics {
            let category = area.performance_category.as_deref().unwrap_or("Unknown");
            *counts.entry(category.to_owned()).or_insert(0) += 1;
        }
        counts
    }

    #[must_use]
    pub fn totals(&self) -> AreaTotals {
        let areas = &self.pincode_metrics;
        // Area counts stay far below f64's exact integer range
        #[allow(clippy::cast_precision_loss)]
        let mean = |f: fn(&AreaMetrics) -> f64| {
            (!areas.is_empty()).then(|| areas.iter().map(f).sum::<f64>() / areas.len() as f64)
        };
        AreaTotals {
            total_orders: areas.iter().map(|a| a.total_orders).sum(),
            delivered_orders: areas.iter().map(|a| a.delivered_orders).sum(),
            rto_orders: areas.iter().map(|a| a.rto_orders).sum(),
            avg_delivery_days: mean(|a| a.avg_delivery_days),
            avg_success_rate: mean(|a| a.delivery_success_rate),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CityPerformance {
    pub city_metrics: Vec<AreaMetrics>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatePerformance {
    pub state_metrics: Vec<AreaMetrics>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pincodes that need attention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemAreas {
    #[serde(rename = "highRTOPincodes")]
    pub high_rto_pincodes: Vec<AreaMetrics>,
    #[serde(rename = "slowDeliveryPincodes")]
    pub slow_delivery_pincodes: Vec<AreaMetrics>,
}

impl ProblemAreas {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.high_rto_pincodes.is_empty() && self.slow_delivery_pincodes.is_empty()
    }
}

// =============================================================================
// Client
// =============================================================================

/// Analytics calls against the order backend.
pub struct Analytics<B, A> {
    backend: B,
    auth: A,
}

impl<B, A> std::fmt::Debug for Analytics<B, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analytics").finish_non_exhaustive()
    }
}

impl<B: Backend, A: AuthProvider> Analytics<B, A> {
    #[must_use]
    pub const fn new(backend: B, auth: A) -> Self {
        Self { backend, auth }
    }

    async fn get<T: serde::de::DeserializeOwned + Default>(
        &self,
        request: BackendRequest,
    ) -> Result<T, AnalyticsError> {
        let response = send_authorized(&self.backend, &self.auth, request).await?;
        if response.is_null() {
            return Ok(T::default());
        }
        Ok(serde_json::from_value(response)?)
    }

    /// Per-courier delivery, RTO and charge metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn courier_performance(
        &self,
        range: DateRange,
    ) -> Result<CourierPerformance, AnalyticsError> {
        self.get(range.apply(BackendRequest::get(format!("{ANALYTICS_BASE}/courier/performance"))))
            .await
    }

    /// Metrics for one courier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for a blank name, otherwise
    /// an error if the call fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn courier_details(
        &self,
        courier_name: &str,
        range: DateRange,
    ) -> Result<CourierMetrics, AnalyticsError> {
        let courier_name = courier_name.trim();
        if courier_name.is_empty() {
            return Err(ValidationError::MissingField("courierName").into());
        }
        let path = format!(
            "{ANALYTICS_BASE}/courier/{}/details",
            path_segment(courier_name)
        );
        self.get(range.apply(BackendRequest::get(path))).await
    }

    /// Per-pincode metrics, at most `limit` pincodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn pincode_performance(
        &self,
        range: DateRange,
        limit: u32,
    ) -> Result<PincodePerformance, AnalyticsError> {
        let request = range
            .apply(BackendRequest::get(format!("{ANALYTICS_BASE}/geography/pincode")))
            .query("limit", limit.to_string());
        self.get(request).await
    }

    /// Per-city metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn city_performance(&self, range: DateRange) -> Result<CityPerformance, AnalyticsError> {
        self.get(range.apply(BackendRequest::get(format!("{ANALYTICS_BASE}/geography/city"))))
            .await
    }

    /// Per-state metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn state_performance(
        &self,
        range: DateRange,
    ) -> Result<StatePerformance, AnalyticsError> {
        self.get(range.apply(BackendRequest::get(format!("{ANALYTICS_BASE}/geography/state"))))
            .await
    }

    /// Pincodes with high RTO or slow delivery among those with at least
    /// `min_orders` orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn problem_areas(
        &self,
        range: DateRange,
        min_orders: u32,
    ) -> Result<ProblemAreas, AnalyticsError> {
        let request = range
            .apply(BackendRequest::get(format!("{ANALYTICS_BASE}/geography/problem-areas")))
            .query("minOrders", min_orders.to_string());
        self.get(request).await
    }
}

/// Escape the characters that would end a path segment early.
fn path_segment(raw: &str) -> String {
    let mut segment = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => segment.push_str("%25"),
            '/' => segment.push_str("%2F"),
            '?' => segment.push_str("%3F"),
            '#' => segment.push_str("%23"),
            _ => segment.push(c),
        }
    }
    segment
}
