//! Customer email drafts.
//!
//! [`compose_email`] fills a template from an order; the operator may edit
//! the draft before it is sent with
//! [`OrderView::send_order_email`](crate::sync::OrderView::send_order_email).

use askama::Template;
use serde::Serialize;
use seller_console_core::{EmailKind, Order, PurchaseOrderId, ValidationError};
use thiserror::Error;

/// Placeholder replaced by [`EmailDraft::with_tracking_id`].
pub const TRACKING_ID_PLACEHOLDER: &str = "{{TRACKING_ID}}";

/// Shown in place of a tracking id that is not known yet.
const TRACKING_ID_FALLBACK: &str = "TBA";

/// An email ready for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    pub kind: EmailKind,
    pub to: String,
    pub subject: String,
    /// HTML body.
    pub body: String,
}

impl EmailDraft {
    /// Replace every tracking id placeholder; a blank id becomes `TBA`.
    #[must_use]
    pub fn with_tracking_id(mut self, tracking_id: &str) -> Self {
        let tracking_id = tracking_id.trim();
        let value = if tracking_id.is_empty() {
            TRACKING_ID_FALLBACK
        } else {
            tracking_id
        };
        self.subject = self.subject.replace(TRACKING_ID_PLACEHOLDER, value);
        self.body = self.body.replace(TRACKING_ID_PLACEHOLDER, value);
        self
    }
}

/// The payload posted to the backend's send-email endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEmail {
    pub purchase_order_id: Option<PurchaseOrderId>,
    #[serde(rename = "type")]
    pub kind: EmailKind,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OrderEmail {
    /// Address a draft to an order.
    #[must_use]
    pub fn from_draft(order: &Order, draft: EmailDraft) -> Self {
        Self {
            purchase_order_id: order.purchase_order_id.clone(),
            kind: draft.kind,
            to: draft.to,
            subject: draft.subject,
            body: draft.body,
        }
    }

    /// Check that every field the backend needs is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] naming the first empty field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("to", &self.to),
            ("subject", &self.subject),
            ("body", &self.body),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
        }
        if self.purchase_order_id.is_none() {
            return Err(ValidationError::MissingField("purchaseOrderId"));
        }
        Ok(())
    }
}

/// Errors that can occur when composing an email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// The order lacks the purchase order id, shipping address or lines the
    /// template needs.
    #[error("Cannot compose {0}: order is missing its id, shipping address or lines")]
    Incomplete(EmailKind),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// HTML body of the shipment email.
#[derive(Template)]
#[template(path = "email/shipment.html")]
struct ShipmentEmailHtml<'a> {
    customer_name: &'a str,
    purchase_order_id: &'a str,
    products: &'a str,
    tracking_number: Option<&'a str>,
    tracking_url: Option<&'a str>,
}

/// HTML body of the delivery email.
#[derive(Template)]
#[template(path = "email/delivered.html")]
struct DeliveredEmailHtml<'a> {
    customer_name: &'a str,
    purchase_order_id: &'a str,
}

/// HTML body of the promotional email.
#[derive(Template)]
#[template(path = "email/promotional.html")]
struct PromotionalEmailHtml<'a> {
    first_name: &'a str,
    product: &'a str,
}

/// HTML body of the re-shipment tracking email.
#[derive(Template)]
#[template(path = "email/order_tracking.html")]
struct OrderTrackingEmailHtml<'a> {
    first_name: &'a str,
    product: &'a str,
    tracking_id: &'a str,
}

/// Fill the `kind` template from `order`.
///
/// Customer text is HTML-escaped by the templates.
///
/// # Errors
///
/// Returns [`EmailError::Incomplete`] when the order lacks what the template
/// needs: shipment, delivery and promotional emails need a purchase order
/// id, a shipping address and order lines. Returns [`EmailError::Template`]
/// if rendering fails.
pub fn compose_email(order: &Order, kind: EmailKind) -> Result<EmailDraft, EmailError> {
    let to = order.customer_email.clone().unwrap_or_default();
    let (subject, body) = match kind {
        EmailKind::Shipment => shipment_email(order)?,
        EmailKind::Delivered => delivered_email(order)?,
        EmailKind::Promotional => promotional_email(order)?,
        EmailKind::OrderTracking => order_tracking_email(order)?,
    };
    Ok(EmailDraft {
        kind,
        to,
        subject,
        body,
    })
}

struct Required<'a> {
    purchase_order_id: &'a PurchaseOrderId,
    customer_name: &'a str,
}

fn required(order: &Order, kind: EmailKind) -> Result<Required<'_>, EmailError> {
    let incomplete = || EmailError::Incomplete(kind);
    let purchase_order_id = order.purchase_order_id.as_ref().ok_or_else(incomplete)?;
    let address = order.shipping_address.as_ref().ok_or_else(incomplete)?;
    order.order_lines.as_ref().ok_or_else(incomplete)?;
    Ok(Required {
        purchase_order_id,
        customer_name: address.name.as_deref().unwrap_or("Customer"),
    })
}

fn first_product(order: &Order) -> Option<&str> {
    order
        .lines()
        .first()
        .and_then(|line| line.product_name.as_deref())
}

fn first_name(order: &Order) -> &str {
    order
        .shipping_address
        .as_ref()
        .and_then(|address| address.first_name())
        .unwrap_or("Customer")
}

fn shipment_email(order: &Order) -> Result<(String, String), EmailError> {
    let Required {
        purchase_order_id,
        customer_name,
    } = required(order, EmailKind::Shipment)?;
    let products = order
        .lines()
        .iter()
        .filter_map(|line| line.product_name.as_deref())
        .collect::<Vec<_>>()
        .join(", ");
    let tracking = order
        .lines()
        .first()
        .and_then(|line| line.tracking_info.as_ref());

    let body = ShipmentEmailHtml {
        customer_name,
        purchase_order_id: purchase_order_id.as_str(),
        products: &products,
        tracking_number: tracking.and_then(|t| t.tracking_number.as_deref()),
        tracking_url: tracking.and_then(|t| t.tracking_url.as_deref()),
    }
    .render()?;

    Ok((format!("Order #{purchase_order_id} has shipped"), body))
}

fn delivered_email(order: &Order) -> Result<(String, String), EmailError> {
    let Required {
        purchase_order_id,
        customer_name,
    } = required(order, EmailKind::Delivered)?;
    let body = DeliveredEmailHtml {
        customer_name,
        purchase_order_id: purchase_order_id.as_str(),
    }
    .render()?;
    Ok((format!("Order #{purchase_order_id} has been delivered"), body))
}

fn promotional_email(order: &Order) -> Result<(String, String), EmailError> {
    required(order, EmailKind::Promotional)?;
    let product = first_product(order);
    let body = PromotionalEmailHtml {
        first_name: first_name(order),
        product: product.unwrap_or("our product"),
    }
    .render()?;
    Ok((
        format!(
            "Thanks for your {} purchase - see what else we make",
            product.unwrap_or("recent")
        ),
        body,
    ))
}

fn order_tracking_email(order: &Order) -> Result<(String, String), EmailError> {
    let product = first_product(order);
    let body = OrderTrackingEmailHtml {
        first_name: first_name(order),
        product: product.unwrap_or("from our store"),
        tracking_id: TRACKING_ID_PLACEHOLDER,
    }
    .render()?;
    Ok((
        format!(
            "New tracking details for your {}",
            product.unwrap_or("order")
        ),
        body,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seller_console_core::decode;
    use serde_json::json;

    fn shipped_order() -> Order {
        decode(json!({
            "purchaseOrderId": "108829953234001",
            "customerEmailId": "asha@example.com",
            "status": "SHIPPED",
            "shippingAddress": {"name": "Asha Rao", "city": "Pune"},
            "orderLines": [{
                "lineNumber": 1,
                "productName": "Rose Face Serum",
                "trackingInfo": {"trackingNumber": "SR123", "trackingURL": "https://track.example/SR123"}
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_shipment_email() {
        let draft = compose_email(&shipped_order(), EmailKind::Shipment).unwrap();
        assert_eq!(draft.to, "asha@example.com");
        assert_eq!(draft.subject, "Order #108829953234001 has shipped");
        assert!(draft.body.contains("Asha Rao"));
        assert!(draft.body.contains("Rose Face Serum"));
        assert!(draft.body.contains("SR123"));
        assert!(draft.body.contains("https://track.example/SR123"));
    }

    #[test]
    fn test_templates_need_order_data() {
        let mut order = shipped_order();
        order.shipping_address = None;
        for kind in [EmailKind::Shipment, EmailKind::Delivered, EmailKind::Promotional] {
            assert!(matches!(
                compose_email(&order, kind),
                Err(EmailError::Incomplete(k)) if k == kind
            ));
        }
        assert!(compose_email(&order, EmailKind::OrderTracking).is_ok());
    }

    #[test]
    fn test_promotional_uses_first_name() {
        let draft = compose_email(&shipped_order(), EmailKind::Promotional).unwrap();
        assert!(draft.body.contains("<strong>Asha</strong>"));
        assert!(draft.subject.contains("Rose Face Serum"));
    }

    #[test]
    fn test_tracking_placeholder() {
        let draft = compose_email(&shipped_order(), EmailKind::OrderTracking).unwrap();
        assert!(draft.body.contains(TRACKING_ID_PLACEHOLDER));

        let filled = draft.clone().with_tracking_id("SG998877");
        assert!(filled.body.contains("SG998877"));
        assert!(!filled.body.contains(TRACKING_ID_PLACEHOLDER));

        let blank = draft.with_tracking_id("  ");
        assert!(blank.body.contains("TBA"));
    }

    #[test]
    fn test_escapes_customer_text() {
        let mut order = shipped_order();
        order.shipping_address.as_mut().unwrap().name = Some("<script>".to_string());
        let draft = compose_email(&order, EmailKind::Delivered).unwrap();
        assert!(draft.body.contains("&lt;script&gt;"));
        assert!(!draft.body.contains("<script>"));
    }

    #[test]
    fn test_shipment_email_without_tracking_omits_tracking_items() {
        let mut order = shipped_order();
        if let Some(lines) = order.order_lines.as_mut() {
            lines[0].tracking_info = None;
        }
        let draft = compose_email(&order, EmailKind::Shipment).unwrap();
        assert!(!draft.body.contains("Tracking number"));
        assert!(!draft.body.contains("Track your package"));
        assert!(draft.body.contains("Rose Face Serum"));
    }

    #[test]
    fn test_validate_order_email() {
        let order = shipped_order();
        let draft = compose_email(&order, EmailKind::Shipment).unwrap();
        let email = OrderEmail::from_draft(&order, draft);
        assert!(email.validate().is_ok());

        let mut missing_to = email.clone();
        missing_to.to = String::new();
        assert_eq!(
            missing_to.validate(),
            Err(ValidationError::MissingField("to"))
        );

        let mut blank_body = email.clone();
        blank_body.body = "   ".to_string();
        assert_eq!(
            blank_body.validate(),
            Err(ValidationError::MissingField("body"))
        );

        let mut no_id = email;
        no_id.purchase_order_id = None;
        assert_eq!(
            no_id.validate(),
            Err(ValidationError::MissingField("purchaseOrderId"))
        );
    }

    #[test]
    fn test_order_email_wire_shape() {
        let order = shipped_order();
        let email =
            OrderEmail::from_draft(&order, compose_email(&order, EmailKind::Delivered).unwrap());
        let value = serde_json::to_value(&email).unwrap();
        assert_eq!(value["type"], "deliveredEmail");
        assert_eq!(value["purchaseOrderId"], "108829953234001");
        assert_eq!(value["to"], "asha@example.com");
    }
}
