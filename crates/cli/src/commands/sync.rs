//! Bulk sync commands: shipping prices, new orders and status buckets.

use chrono::NaiveDate;
use seller_console::StatusBucket;

use super::{CommandError, Console};

/// Fetch shipping prices for orders that have none.
pub async fn shipping_price(console: &Console) -> Result<(), CommandError> {
    let summary = console.view.sync_shipping_price().await?;
    tracing::info!(
        updated = summary.merge.matched,
        not_in_view = summary.merge.unmatched.len(),
        "Shipping prices synced"
    );
    console.log_totals(&console.view.snapshot().await);
    Ok(())
}

/// Pull marketplace orders created since `date`.
pub async fn orders_since(console: &Console, date: NaiveDate) -> Result<(), CommandError> {
    let summary = console.view.sync_orders_since(date).await?;
    tracing::info!(
        added = summary.added,
        already_present = summary.already_present,
        "Orders synced"
    );

    let orders = console.view.snapshot().await;
    for order in orders.iter().take(summary.added) {
        console.log_order(order);
    }
    console.log_totals(&orders);
    Ok(())
}

/// Transition every order in `bucket`.
pub async fn update_status(console: &Console, bucket: StatusBucket) -> Result<(), CommandError> {
    let summary = console.view.bulk_update_status(bucket).await?;
    tracing::info!(
        bucket = %bucket,
        updated = summary.merge.matched,
        "Status bucket updated"
    );
    console.log_totals(&console.view.snapshot().await);
    Ok(())
}
