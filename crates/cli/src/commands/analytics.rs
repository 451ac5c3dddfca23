//! Delivery analytics reports.

use seller_console::{Analytics, DateRange, HttpBackend, StaticToken};

use super::{CommandError, Connection};

/// Pincodes shown in the fastest and slowest lists.
const RANKED: usize = 10;

fn client() -> Result<Analytics<HttpBackend, StaticToken>, CommandError> {
    let connection = Connection::from_env()?;
    Ok(Analytics::new(connection.backend, connection.auth))
}

/// Log per-courier performance, best success rate first.
pub async fn courier_performance(range: DateRange) -> Result<(), CommandError> {
    let performance = client()?.courier_performance(range).await?;
    for courier in performance.ranked_by_success() {
        tracing::info!(
            courier = %courier.courier_name,
            orders = courier.delivery_metrics.total_orders,
            success_rate = courier.delivery_metrics.success_rate,
            avg_days = courier.delivery_metrics.avg_delivery_days,
            rto = courier.rto_metrics.rto_count,
            "Courier"
        );
    }
    let summary = &performance.overall_summary;
    tracing::info!(
        orders = summary.total_orders,
        delivered = summary.total_delivered,
        rto = summary.total_rto,
        success_rate = summary.avg_success_rate,
        charges = performance.total_charges(),
        "Overall"
    );
    Ok(())
}

/// Log one courier's metrics.
pub async fn courier_details(name: &str, range: DateRange) -> Result<(), CommandError> {
    let courier = client()?.courier_details(name, range).await?;
    tracing::info!(
        courier = name,
        orders = courier.delivery_metrics.total_orders,
        delivered = courier.delivery_metrics.delivered_orders,
        success_rate = courier.delivery_metrics.success_rate,
        rto_rate = courier.rto_metrics.rto_rate,
        avg_rto_days = courier.rto_metrics.avg_rto_days,
        shipping_charges = courier.financial_metrics.total_shipping_charges,
        rto_charges = courier.financial_metrics.total_rto_charges,
        "Courier details"
    );
    Ok(())
}

/// Log pincode rankings, category counts and the city and state breakdown.
pub async fn geography(range: DateRange, limit: u32) -> Result<(), CommandError> {
    let client = client()?;
    let pincodes = client.pincode_performance(range, limit).await?;
    let totals = pincodes.totals();
    tracing::info!(
        pincodes = pincodes.pincode_metrics.len(),
        orders = totals.total_orders,
        delivered = totals.delivered_orders,
        rto = totals.rto_orders,
        avg_days = ?totals.avg_delivery_days,
        avg_success_rate = ?totals.avg_success_rate,
        "Pincode totals"
    );
    for (category, count) in pincodes.category_counts() {
        tracing::info!(%category, count, "Category");
    }
    for area in pincodes.fastest(RANKED) {
        tracing::info!(pincode = ?area.pincode, avg_days = area.avg_delivery_days, "Fastest");
    }
    for area in pincodes.slowest(RANKED) {
        tracing::info!(pincode = ?area.pincode, avg_days = area.avg_delivery_days, "Slowest");
    }

    let cities = client.city_performance(range).await?;
    for city in &cities.city_metrics {
        tracing::info!(city = ?city.city, orders = city.total_orders, rto_rate = city.rto_rate, "City");
    }
    let states = client.state_performance(range).await?;
    for state in &states.state_metrics {
        tracing::info!(state = ?state.state, orders = state.total_orders, rto_rate = state.rto_rate, "State");
    }
    Ok(())
}

/// Log pincodes with high RTO or slow delivery.
pub async fn problem_areas(range: DateRange, min_orders: u32) -> Result<(), CommandError> {
    let areas = client()?.problem_areas(range, min_orders).await?;
    if areas.is_empty() {
        tracing::info!(min_orders, "No problem areas");
    }
    for area in &areas.high_rto_pincodes {
        tracing::info!(pincode = ?area.pincode, city = ?area.city, rto_rate = area.rto_rate, "High RTO");
    }
    for area in &areas.slow_delivery_pincodes {
        tracing::info!(
            pincode = ?area.pincode,
            city = ?area.city,
            avg_days = area.avg_delivery_days,
            "Slow delivery"
        );
    }
    Ok(())
}
