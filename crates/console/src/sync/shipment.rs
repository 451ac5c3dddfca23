//! Carrier and marketplace shipment payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use seller_console_core::{CustomerOrderId, ExplicitNulls, Order, ValidationError};

/// Carrier that physically ships orders confirmed to Walmart.
const WALMART_CARRIER: &str = "Shiprocket";

/// Whether a carrier order is created or an existing one amended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipmentMode {
    Create,
    Update,
}

impl ShipmentMode {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Create => "/shiprocket/createOrder",
            Self::Update => "/shiprocket/updateOrder",
        }
    }
}

/// Check that an order carries everything a carrier order needs.
///
/// # Errors
///
/// [`ValidationError::NoOrderLines`] for an order without lines, otherwise
/// [`ValidationError::IncompleteEditableFields`] listing every missing field.
pub fn validate_for_carrier(order: &Order) -> Result<(), ValidationError> {
    if order.lines().is_empty() {
        return Err(ValidationError::NoOrderLines);
    }
    let missing = order.missing_shipment_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::IncompleteEditableFields(missing))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalmartShipment {
    pub shipments: Vec<ShipmentGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentGroup {
    pub shipment_lines: Vec<ShipmentLine>,
    pub tracking_number: String,
    pub carrier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentLine {
    pub prime_line_no: String,
    pub shipment_line_no: String,
    pub quantity: ShipmentQuantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentQuantity {
    pub unit_of_measurement: String,
    pub amount: String,
}

impl WalmartShipment {
    /// Build the shipment confirmation for `order`: one shipment line per
    /// order line, all under the order's tracking number.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the purchase order id, the order
    /// lines, a line number or the tracking number is missing.
    pub fn for_order(order: &Order) -> Result<Self, ValidationError> {
        if order.purchase_order_id.is_none() {
            return Err(ValidationError::MissingField("purchaseOrderId"));
        }
        if order.lines().is_empty() {
            return Err(ValidationError::NoOrderLines);
        }
        let tracking_number = order
            .tracking_number
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingField("trackingNumber"))?;

        let shipment_lines = order
            .lines()
            .iter()
            .map(|line| {
                let number = line
                    .line_number
                    .as_ref()
                    .ok_or(ValidationError::MissingField("lineNumber"))?;
                Ok(ShipmentLine {
                    prime_line_no: number.to_string(),
                    shipment_line_no: number.to_string(),
                    quantity: ShipmentQuantity {
                        unit_of_measurement: line
                            .unit_of_measurement
                            .clone()
                            .filter(|u| !u.trim().is_empty())
                            .unwrap_or_else(|| "EACH".to_string()),
                        amount: line
                            .quantity
                            .as_ref()
                            .filter(|q| q.is_set())
                            .map_or_else(|| "1".to_string(), ToString::to_string),
                    },
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(Self {
            shipments: vec![ShipmentGroup {
                shipment_lines,
                tracking_number: tracking_number.to_owned(),
                carrier: WALMART_CARRIER.to_owned(),
            }],
        })
    }
}

/// Body of the shipment status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentStatusUpdate {
    #[serde(default, alias = "shipmentStatus")]
    pub status: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default, alias = "trackingURL")]
    pub tracking_url: Option<String>,
    /// Response fields that were `null`.
    #[serde(skip)]
    pub nulls: ExplicitNulls,
}

impl ShipmentStatusUpdate {
    /// Parse the endpoint body, remembering which fields came back `null`.
    ///
    /// # Errors
    ///
    /// Returns the serde error if a field has the wrong type.
    pub fn from_object(object: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let nulls = ExplicitNulls::from_object(&object);
        let mut update: Self = serde_json::from_value(Value::Object(object))?;
        update.nulls = nulls;
        Ok(update)
    }

    /// The partial order to merge, keyed by customer order id.
    ///
    /// A field the endpoint returned as `null` is cleared on merge.
    #[must_use]
    pub fn into_order(self, customer_order_id: CustomerOrderId) -> Order {
        let mut nulls = ExplicitNulls::default();
        for (names, field) in [
            (&["status", "shipmentStatus"][..], "shipmentStatus"),
            (&["trackingNumber"][..], "trackingNumber"),
            (&["trackingUrl", "trackingURL"][..], "trackingUrl"),
        ] {
            if self.nulls.contains_any(names) {
                nulls.insert(field);
            }
        }
        Order {
            customer_order_id: Some(customer_order_id),
            shipment_status: self.status,
            tracking_number: self.tracking_number,
            tracking_url: self.tracking_url,
            nulls,
            ..Order::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seller_console_core::decode;
    use serde_json::json;

    fn complete_order() -> Order {
        decode(json!({
            "purchaseOrderId": "P1",
            "trackingNumber": "SR123",
            "orderEditableFields": {
                "deadWeight": "0.4", "length": 10, "height": 5, "width": 5,
                "billingAddress": {
                    "name": "Asha", "address1": "1 MG Road", "city": "Pune",
                    "state": "MH", "postalCode": "411001", "country": "IN"
                }
            },
            "orderInfo": [
                {"lineNumber": 1, "qtyAmount": "2", "unitOfMeasurement": "EACH",
                 "productEditableFields": {"hsn": "3304", "unitPrice": 300}},
                {"lineNumber": "2",
                 "productEditableFields": {"hsn": "3305", "unitPrice": "120"}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_for_carrier() {
        assert!(validate_for_carrier(&complete_order()).is_ok());

        let mut order = complete_order();
        order.order_editable_fields.width = None;
        assert_eq!(
            validate_for_carrier(&order),
            Err(ValidationError::IncompleteEditableFields(vec!["width".to_string()]))
        );

        order.order_lines = Some(Vec::new());
        assert_eq!(validate_for_carrier(&order), Err(ValidationError::NoOrderLines));
    }

    #[test]
    fn test_walmart_payload() {
        let payload = serde_json::to_value(WalmartShipment::for_order(&complete_order()).unwrap())
            .unwrap();
        assert_eq!(
            payload,
            json!({"shipments": [{
                "shipmentLines": [
                    {"primeLineNo": "1", "shipmentLineNo": "1",
                     "quantity": {"unitOfMeasurement": "EACH", "amount": "2"}},
                    {"primeLineNo": "2", "shipmentLineNo": "2",
                     "quantity": {"unitOfMeasurement": "EACH", "amount": "1"}}
                ],
                "trackingNumber": "SR123",
                "carrier": "Shiprocket"
            }]})
        );
    }

    #[test]
    fn test_walmart_payload_requires_tracking_number() {
        let mut order = complete_order();
        order.tracking_number = Some(" ".to_string());
        assert_eq!(
            WalmartShipment::for_order(&order),
            Err(ValidationError::MissingField("trackingNumber"))
        );
    }

    #[test]
    fn test_status_update_into_order() {
        let update: ShipmentStatusUpdate = serde_json::from_value(json!({
            "status": "SHIPPED_IN_SHIP_ROCKET",
            "trackingNumber": "SR123",
            "trackingUrl": "https://track.example/SR123"
        }))
        .unwrap();
        let order = update.into_order(CustomerOrderId::new("C1"));
        assert_eq!(order.shipment_status.as_deref(), Some("SHIPPED_IN_SHIP_ROCKET"));
        assert_eq!(order.customer_order_id, Some(CustomerOrderId::new("C1")));
        assert!(order.purchase_order_id.is_none());
    }

    #[test]
    fn test_status_update_null_tracking_is_cleared() {
        let Value::Object(body) = json!({"status": "CANCELED", "trackingNumber": null}) else {
            unreachable!()
        };
        let update = ShipmentStatusUpdate::from_object(body).unwrap();

        let mut current = Order {
            customer_order_id: Some(CustomerOrderId::new("C1")),
            tracking_number: Some("SR123".to_string()),
            ..Order::default()
        };
        current.overlay(update.into_order(CustomerOrderId::new("C1")));

        assert_eq!(current.shipment_status.as_deref(), Some("CANCELED"));
        assert_eq!(current.tracking_number, None);
    }

    #[test]
    fn test_shipment_mode_paths() {
        assert_eq!(ShipmentMode::Create.path(), "/shiprocket/createOrder");
        assert_eq!(ShipmentMode::Update.path(), "/shiprocket/updateOrder");
    }
}
