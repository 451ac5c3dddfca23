//! Single-order commands.

use seller_console::{OrderEmail, ShipmentMode, compose_email};
use seller_console_core::{CustomerOrderId, EmailKind, OrderKey, PurchaseOrderId};
use serde_json::Value;

use super::{CommandError, Console};

/// Operator edits applied to a composed email before sending.
#[derive(Debug, Default)]
pub struct EmailOverrides {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub tracking_id: Option<String>,
}

/// Change one field of one order.
pub async fn patch(
    console: &Console,
    id: &str,
    field: &str,
    value: &str,
) -> Result<(), CommandError> {
    let (key, _) = console.require(id).await?;
    let patched = console
        .view
        .patch_order_field(&key, field, parse_value(value))
        .await?;
    tracing::info!(order = %key, field, patched, "Field updated");
    log_current(console, &key).await;
    Ok(())
}

/// Compose the `kind` email for one order and send it.
pub async fn email(
    console: &Console,
    id: &str,
    kind: EmailKind,
    overrides: EmailOverrides,
) -> Result<(), CommandError> {
    let (key, order) = console.require(id).await?;
    let mut draft = compose_email(&order, kind)?;
    if kind == EmailKind::OrderTracking {
        draft = draft.with_tracking_id(overrides.tracking_id.as_deref().unwrap_or_default());
    }
    if let Some(to) = overrides.to {
        draft.to = to;
    }
    if let Some(subject) = overrides.subject {
        draft.subject = subject;
    }
    if let Some(body) = overrides.body {
        draft.body = body;
    }

    let merged = console
        .view
        .send_order_email(OrderEmail::from_draft(&order, draft))
        .await?;
    tracing::info!(order = %key, email = %kind, merged, "Email sent");
    log_current(console, &key).await;
    Ok(())
}

/// Refresh carrier status for one order.
pub async fn shipment_status(console: &Console, customer_order_id: &str) -> Result<(), CommandError> {
    let id = CustomerOrderId::new(customer_order_id);
    let merged = console.view.refresh_shipment_status(&id).await?;
    tracing::info!(customer_order_id, merged, "Shipment status refreshed");
    log_current(console, &OrderKey::Customer(id)).await;
    Ok(())
}

/// Create or amend the carrier order for one order.
pub async fn submit_shipment(
    console: &Console,
    id: &str,
    mode: ShipmentMode,
) -> Result<(), CommandError> {
    let (key, _) = console.require(id).await?;
    let merged = console.view.submit_shipment(&key, mode).await?;
    tracing::info!(order = %key, ?mode, merged, "Shipment submitted");
    log_current(console, &key).await;
    Ok(())
}

/// Confirm shipment of one order to the marketplace.
pub async fn ship(console: &Console, id: &str) -> Result<(), CommandError> {
    let purchase_order_id = PurchaseOrderId::new(id);
    let merged = console.view.ship_in_walmart(&purchase_order_id).await?;
    tracing::info!(order = %purchase_order_id, merged, "Shipment confirmed");
    log_current(console, &OrderKey::Purchase(purchase_order_id)).await;
    Ok(())
}

async fn log_current(console: &Console, key: &OrderKey) {
    if let Some(order) = console.view.order(key).await {
        console.log_order(&order);
    }
}

/// JSON when the text parses as JSON, a plain string otherwise.
fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}
