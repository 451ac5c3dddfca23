//! ShipGlobal cross-border booking.
//!
//! Booking an order with ShipGlobal takes four backend calls, made in order:
//! validate the invoice, fetch shipper rates, add the order with the chosen
//! shipper and pickup address, then park it as a draft for payment. The
//! booking form is prefilled from the console's order with
//! [`ShipGlobalOrder::from_order`] and may be edited before the first call.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use seller_console_core::{Order, RawAmount, ValidationError, define_id};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{info, instrument};

use crate::auth::AuthProvider;
use crate::backend::{Backend, BackendRequest, send_authorized};
use crate::error::FetchError;

define_id!(PickupAddressId);
define_id!(ShipGlobalOrderId);

/// Message the backend returns when an invoice passes validation.
const INVOICE_VALIDATED: &str = "Item invoice validated successfully";

/// HSN code used for every prefilled item.
pub const DEFAULT_HSN: &str = "33049990";

/// Errors that can occur while booking with ShipGlobal.
#[derive(Debug, Error)]
pub enum ShipGlobalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The backend answered but did not accept the step.
    #[error("ShipGlobal rejected the request: {0}")]
    Rejected(&'static str),

    /// A response body did not have the expected shape.
    #[error("Invalid ShipGlobal response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl ShipGlobalError {
    /// Whether the caller should send the user back to login.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Fetch(err) if err.is_unauthenticated())
    }
}

/// A warehouse ShipGlobal can collect from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupAddress {
    pub address_id: PickupAddressId,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    /// `"1"` on the account's default address.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PickupAddress {
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.default.as_deref() == Some("1")
    }

    /// One-line label: `address city, state - postcode`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} {}, {} - {}",
            self.address.as_deref().unwrap_or_default(),
            self.city.as_deref().unwrap_or_default(),
            self.state_name.as_deref().unwrap_or_default(),
            self.postcode.as_deref().unwrap_or_default()
        )
    }
}

/// The account's default pickup address, if one is marked.
#[must_use]
pub fn default_pickup(addresses: &[PickupAddress]) -> Option<&PickupAddress> {
    addresses.iter().find(|address| address.is_default())
}

/// A shipping option quoted for a parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipperRate {
    /// Code passed back as `shipper` when adding the order.
    pub provider_code: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub transit_time: Option<String>,
    #[serde(default)]
    pub helper_text: Option<String>,
    #[serde(default)]
    pub rate: Option<RawAmount>,
    #[serde(default)]
    pub bill_weight_kg: Option<RawAmount>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The cheapest quote with a parseable rate.
#[must_use]
pub fn cheapest_rate(rates: &[ShipperRate]) -> Option<&ShipperRate> {
    rates
        .iter()
        .filter_map(|rate| Some((rate.rate.as_ref()?.to_decimal()?, rate)))
        .min_by_key(|(rate, _)| *rate)
        .map(|(_, rate)| rate)
}

/// One invoice item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipGlobalItem {
    pub vendor_order_item_id: String,
    pub vendor_order_item_name: String,
    pub vendor_order_item_sku: String,
    pub vendor_order_item_quantity: u32,
    pub vendor_order_item_unit_price: f64,
    pub vendor_order_item_hsn: String,
    pub vendor_order_item_tax_rate: f64,
}

/// The booking form sent to ShipGlobal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipGlobalOrder {
    pub customer_shipping_firstname: String,
    pub customer_shipping_lastname: String,
    pub customer_shipping_mobile: String,
    pub customer_shipping_alternate_mobile: String,
    pub customer_shipping_email: String,
    pub customer_shipping_country_code: String,
    pub customer_shipping_address: String,
    pub customer_shipping_address_2: String,
    pub customer_shipping_address_3: String,
    pub customer_shipping_postcode: String,
    pub customer_shipping_city: String,
    pub customer_shipping_state_id: String,
    pub customer_shipping_company: String,
    pub customer_billing_firstname: String,
    pub customer_billing_lastname: String,
    pub customer_billing_mobile: String,
    pub customer_billing_country_code: String,
    pub customer_billing_address: String,
    pub customer_billing_address_2: String,
    pub customer_billing_address_3: String,
    pub customer_billing_postcode: String,
    pub customer_billing_city: String,
    pub customer_billing_state_id: String,
    pub vendor_invoice_no: String,
    pub vendor_order_date: NaiveDate,
    pub order_reference: String,
    pub vendor_reference_order_id: String,
    pub package_weight: f64,
    pub package_length: f64,
    pub package_breadth: f64,
    pub package_height: f64,
    pub currency_code: String,
    pub csb5_status: String,
    pub customer_shipping_billing_same: String,
    pub ioss_number: String,
    pub vendor_order_item: Vec<ShipGlobalItem>,
}

impl ShipGlobalOrder {
    /// Prefill the form from a console order.
    ///
    /// The shipping name splits at the first space into first and last
    /// name; billing copies shipping. Quantities that do not parse become 1
    /// and prices that do not parse become 0.
    #[must_use]
    pub fn from_order(order: &Order, order_date: NaiveDate) -> Self {
        let address = order.shipping_address.clone().unwrap_or_default();
        let full_name = address.name.unwrap_or_default();
        let (first_name, last_name) = full_name
            .split_once(' ')
            .map_or((full_name.as_str(), ""), |(first, rest)| (first, rest.trim()));
        let text = |value: Option<String>| value.unwrap_or_default();
        let mobile = text(order.phone.clone());
        let street = text(address.address1);
        let street_2 = text(address.address2);
        let postcode = text(address.postal_code);
        let city = text(address.city);
        let state = text(address.state);

        let purchase_order_id = order
            .purchase_order_id
            .as_ref()
            .map(|id| id.as_str().to_owned())
            .unwrap_or_default();
        let customer_order_id = order
            .customer_order_id
            .as_ref()
            .map(|id| id.as_str().to_owned())
            .unwrap_or_default();
        let invoice_ref = if customer_order_id.is_empty() {
            &purchase_order_id
        } else {
            &customer_order_id
        };

        let items = order
            .lines()
            .iter()
            .enumerate()
            .map(|(index, line)| ShipGlobalItem {
                vendor_order_item_id: format!("id-{purchase_order_id}-{index}"),
                vendor_order_item_name: line.product_name.clone().unwrap_or_default(),
                vendor_order_item_sku: format!("sku-{index}"),
                vendor_order_item_quantity: line
                    .quantity
                    .as_ref()
                    .and_then(RawAmount::whole_units)
                    .and_then(|q| q.to_u32())
                    .filter(|q| *q > 0)
                    .unwrap_or(1),
                vendor_order_item_unit_price: line
                    .price
                    .as_ref()
                    .and_then(RawAmount::to_decimal)
                    .and_then(|p| p.to_f64())
                    .unwrap_or(0.0),
                vendor_order_item_hsn: DEFAULT_HSN.to_owned(),
                vendor_order_item_tax_rate: 0.0,
            })
            .collect();

        Self {
            customer_shipping_firstname: first_name.to_owned(),
            customer_shipping_lastname: last_name.to_owned(),
            customer_shipping_mobile: mobile.clone(),
            customer_shipping_alternate_mobile: mobile.clone(),
            customer_shipping_email: text(order.customer_email.clone()),
            customer_shipping_country_code: "US".to_owned(),
            customer_shipping_address: street.clone(),
            customer_shipping_address_2: street_2.clone(),
            customer_shipping_address_3: String::new(),
            customer_shipping_postcode: postcode.clone(),
            customer_shipping_city: city.clone(),
            customer_shipping_state_id: state.clone(),
            customer_shipping_company: String::new(),
            customer_billing_firstname: first_name.to_owned(),
            customer_billing_lastname: last_name.to_owned(),
            customer_billing_mobile: mobile,
            customer_billing_country_code: "US".to_owned(),
            customer_billing_address: street,
            customer_billing_address_2: street_2,
            customer_billing_address_3: String::new(),
            customer_billing_postcode: postcode,
            customer_billing_city: city,
            customer_billing_state_id: state,
            vendor_invoice_no: if invoice_ref.is_empty() {
                String::new()
            } else {
                format!("INV-{invoice_ref}")
            },
            vendor_order_date: order_date,
            order_reference: customer_order_id.clone(),
            vendor_reference_order_id: purchase_order_id.clone(),
            package_weight: 0.1,
            package_length: 1.0,
            package_breadth: 1.0,
            package_height: 1.0,
            currency_code: "INR".to_owned(),
            csb5_status: "0".to_owned(),
            customer_shipping_billing_same: "1".to_owned(),
            ioss_number: String::new(),
            vendor_order_item: items,
        }
    }

    /// Fields ShipGlobal needs that are missing or blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing: Vec<String> = [
            ("customer_shipping_firstname", &self.customer_shipping_firstname),
            ("customer_shipping_mobile", &self.customer_shipping_mobile),
            ("customer_shipping_address", &self.customer_shipping_address),
            ("customer_shipping_postcode", &self.customer_shipping_postcode),
            ("customer_shipping_city", &self.customer_shipping_city),
            ("customer_shipping_state_id", &self.customer_shipping_state_id),
            ("customer_shipping_country_code", &self.customer_shipping_country_code),
            ("vendor_invoice_no", &self.vendor_invoice_no),
            ("currency_code", &self.currency_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_owned())
        .collect();

        for (name, value) in [
            ("package_weight", self.package_weight),
            ("package_length", self.package_length),
            ("package_breadth", self.package_breadth),
            ("package_height", self.package_height),
        ] {
            if value <= 0.0 {
                missing.push(name.to_owned());
            }
        }

        for (index, item) in self.vendor_order_item.iter().enumerate() {
            if item.vendor_order_item_name.trim().is_empty() {
                missing.push(format!("vendor_order_item[{index}].vendor_order_item_name"));
            }
            if item.vendor_order_item_quantity == 0 {
                missing.push(format!("vendor_order_item[{index}].vendor_order_item_quantity"));
            }
            if item.vendor_order_item_hsn.trim().is_empty() {
                missing.push(format!("vendor_order_item[{index}].vendor_order_item_hsn"));
            }
        }
        missing
    }

    fn invoice_payload(&self) -> Value {
        json!({
            "csbv": 0,
            "currency_code": self.currency_code,
            "package_weight": self.package_weight,
            "package_height": self.package_height,
            "package_length": self.package_length,
            "package_breadth": self.package_breadth,
            "country_code": self.customer_shipping_country_code,
            "vendor_order_item": self.vendor_order_item,
        })
    }

    fn rates_payload(&self) -> Value {
        json!({
            "customer_shipping_postcode": self.customer_shipping_postcode,
            "customer_shipping_country_code": self.customer_shipping_country_code,
            "package_weight": self.package_weight,
            "package_length": self.package_length,
            "package_breadth": self.package_breadth,
            "package_height": self.package_height,
            "csbv": 0,
        })
    }
}

/// Check that a booking form can be sent.
///
/// # Errors
///
/// [`ValidationError::NoOrderLines`] for a form without items, otherwise
/// [`ValidationError::IncompleteEditableFields`] listing every missing field.
pub fn validate_for_shipglobal(form: &ShipGlobalOrder) -> Result<(), ValidationError> {
    if form.vendor_order_item.is_empty() {
        return Err(ValidationError::NoOrderLines);
    }
    let missing = form.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::IncompleteEditableFields(missing))
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct RatesData {
    rate: Option<Vec<ShipperRate>>,
}

#[derive(Deserialize)]
struct AddedOrder {
    order_id: Option<ShipGlobalOrderId>,
}

/// ShipGlobal calls, routed through the order backend.
pub struct ShipGlobal<B, A> {
    backend: B,
    auth: A,
}

impl<B, A> std::fmt::Debug for ShipGlobal<B, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipGlobal").finish_non_exhaustive()
    }
}

impl<B: Backend, A: AuthProvider> ShipGlobal<B, A> {
    #[must_use]
    pub const fn new(backend: B, auth: A) -> Self {
        Self { backend, auth }
    }

    async fn call(&self, request: BackendRequest) -> Result<Value, FetchError> {
        send_authorized(&self.backend, &self.auth, request).await
    }

    /// The account's pickup addresses; empty when the backend has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the list does not decode.
    #[instrument(skip(self))]
    pub async fn pickup_addresses(&self) -> Result<Vec<PickupAddress>, ShipGlobalError> {
        let response = self
            .call(BackendRequest::get("/shipglobal/pickup/get-pickup-address"))
            .await?;
        if response.is_null() {
            return Ok(Vec::new());
        }
        let envelope: Envelope<Vec<PickupAddress>> = serde_json::from_value(response)?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Check the invoice items and package with ShipGlobal.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] before any call when the form is
    /// incomplete, and [`ShipGlobalError::Rejected`] when the backend does
    /// not confirm the invoice.
    #[instrument(skip_all, fields(invoice = %form.vendor_invoice_no))]
    pub async fn validate_invoice(&self, form: &ShipGlobalOrder) -> Result<Value, ShipGlobalError> {
        validate_for_shipglobal(form)?;
        let request = BackendRequest::post("/shipglobal/orders/validate-order-invoice")
            .json(form.invoice_payload());
        let response = self.call(request).await?;
        let envelope: Envelope<Value> = serde_json::from_value(response.clone())?;
        if envelope.message.as_deref() != Some(INVOICE_VALIDATED) {
            return Err(ShipGlobalError::Rejected("order validation failed"));
        }
        Ok(response)
    }

    /// Quotes for shipping the form's package to its postcode.
    ///
    /// # Errors
    ///
    /// Returns [`ShipGlobalError::Rejected`] when no rates come back.
    #[instrument(skip_all, fields(postcode = %form.customer_shipping_postcode))]
    pub async fn shipper_rates(
        &self,
        form: &ShipGlobalOrder,
    ) -> Result<Vec<ShipperRate>, ShipGlobalError> {
        let request =
            BackendRequest::post("/shipglobal/orders/get-shipper-rates").json(form.rates_payload());
        let response = self.call(request).await?;
        let envelope: Envelope<RatesData> = serde_json::from_value(response)?;
        envelope
            .data
            .and_then(|data| data.rate)
            .ok_or(ShipGlobalError::Rejected("no shipping rates found"))
    }

    /// Create the ShipGlobal order with the chosen shipper and pickup.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the form is incomplete or no
    /// shipper is chosen, and [`ShipGlobalError::Rejected`] when the backend
    /// returns no order id.
    #[instrument(skip(self, form), fields(invoice = %form.vendor_invoice_no))]
    pub async fn add_order(
        &self,
        form: &ShipGlobalOrder,
        pickup_address_id: &PickupAddressId,
        shipper: &str,
    ) -> Result<ShipGlobalOrderId, ShipGlobalError> {
        validate_for_shipglobal(form)?;
        if shipper.trim().is_empty() {
            return Err(ValidationError::MissingField("shipper").into());
        }
        let mut body = serde_json::to_value(form)?;
        if let Value::Object(map) = &mut body {
            map.insert("pickup_address_id".to_owned(), json!(pickup_address_id));
            map.insert("shipper".to_owned(), json!(shipper));
        }

        let response = self
            .call(BackendRequest::post("/shipglobal/orders/add-order").json(body))
            .await?;
        let envelope: Envelope<AddedOrder> = serde_json::from_value(response)?;
        let order_id = envelope
            .data
            .and_then(|data| data.order_id)
            .ok_or(ShipGlobalError::Rejected("failed to create order"))?;
        info!(order_id = %order_id, "ShipGlobal order created");
        Ok(order_id)
    }

    /// Park a created order as a draft awaiting payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn create_draft(&self, order_id: &ShipGlobalOrderId) -> Result<Value, ShipGlobalError> {
        let response = self
            .call(
                BackendRequest::post("/shipglobal/orders/pay-order")
                    .json(json!({"order_id": order_id, "add_to_draft": true})),
            )
            .await?;
        info!(order_id = %order_id, "ShipGlobal draft created");
        Ok(response)
    }
}
