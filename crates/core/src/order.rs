//! The order entity and its seller-supplied shipment metadata.
//!
//! Field names follow the backend's camelCase wire format. Every known
//! field is optional because different endpoints return different subsets
//! of the record; fields the console does not model are kept verbatim in
//! `extra` so that nothing is lost when a record is merged or re-sent.
//!
//! The two editable-field bags are not optional: a missing or `null` bag
//! decodes to the empty template, so readers never have to guard against an
//! absent bag.
//!
//! Typed fields cannot tell an explicit `null` from an absent field, and
//! serde aliases forget which spelling a record used. [`decode`] records both
//! facts on the decoded record: [`ExplicitNulls`] drive overlays and
//! [`WireNames`] drive [`encode`].
//!
//! [`decode`]: crate::codec::decode
//! [`encode`]: crate::codec::encode

use core::fmt;
use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{CustomerOrderId, LineNumber, PurchaseOrderId, RawAmount, amount_or_zero};

/// Identity used to find an order inside a view.
///
/// The purchase order id is primary; the customer order id is used only
/// when a record carries no purchase order id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderKey {
    Purchase(PurchaseOrderId),
    Customer(CustomerOrderId),
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchase(id) => write!(f, "purchase order {id}"),
            Self::Customer(id) => write!(f, "customer order {id}"),
        }
    }
}

impl From<PurchaseOrderId> for OrderKey {
    fn from(id: PurchaseOrderId) -> Self {
        Self::Purchase(id)
    }
}

impl From<CustomerOrderId> for OrderKey {
    fn from(id: CustomerOrderId) -> Self {
        Self::Customer(id)
    }
}

/// Alternate top-level spellings, as `(alias, name)`.
pub const ORDER_FIELD_ALIASES: [(&str, &str); 2] =
    [("orderInfo", "orderLines"), ("trackingURL", "trackingUrl")];

/// Alternate order line spellings, as `(alias, name)`.
pub const LINE_FIELD_ALIASES: [(&str, &str); 2] =
    [("qtyAmount", "quantity"), ("chargeAmount", "price")];

/// Wire fields a record carried as an explicit `null`.
///
/// An overlay clears exactly these fields; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitNulls(BTreeSet<String>);

impl ExplicitNulls {
    /// Collect the keys of `object` whose value is `null`.
    #[must_use]
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self(
            object
                .iter()
                .filter(|(_, value)| value.is_null())
                .map(|(key, _)| key.clone())
                .collect(),
        )
    }

    pub fn insert(&mut self, field: impl Into<String>) {
        self.0.insert(field.into());
    }

    /// Whether any of the given spellings of one field was `null`.
    #[must_use]
    pub fn contains_any(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.0.contains(*name))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Alternate spellings a record arrived with, from [`ORDER_FIELD_ALIASES`]
/// and [`LINE_FIELD_ALIASES`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireNames(BTreeSet<&'static str>);

impl WireNames {
    pub fn insert(&mut self, alias: &'static str) {
        self.0.insert(alias);
    }

    #[must_use]
    pub fn uses(&self, alias: &str) -> bool {
        self.0.contains(alias)
    }

    /// Take the spelling `other` used for each of `aliases`.
    fn adopt(&mut self, other: &Self, aliases: &[&'static str]) {
        for alias in aliases {
            if other.uses(alias) {
                self.0.insert(alias);
            } else {
                self.0.remove(alias);
            }
        }
    }
}

/// A marketplace order as held by the console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_order_id: Option<PurchaseOrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_order_id: Option<CustomerOrderId>,
    /// Customer contact email.
    #[serde(
        default,
        rename = "customerEmailId",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_email: Option<String>,
    /// Free-form marketplace status (`created`, `SHIPPED`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Channel shipment status (`NOT_CREATED`, `SHIPPED_IN_WALMART`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<PostalAddress>,
    #[serde(default, alias = "orderInfo", skip_serializing_if = "Option::is_none")]
    pub order_lines: Option<Vec<OrderLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, alias = "trackingURL", skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    /// Product cost in whole rupees; absent until the seller enters it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<RawAmount>,
    /// Carrier charge in whole rupees; absent until synced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_price: Option<RawAmount>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_editable_fields: OrderEditableFields,
    /// Whether the shipment notification was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_email: Option<bool>,
    /// Whether the delivery notification was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_email: Option<bool>,
    /// Backend fields the console does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Fields the record carried as `null`.
    #[serde(skip)]
    pub nulls: ExplicitNulls,
    /// Alternate spellings the record arrived with.
    #[serde(skip)]
    pub wire_names: WireNames,
}

impl Order {
    /// Identity of this order, if it carries one.
    #[must_use]
    pub fn key(&self) -> Option<OrderKey> {
        self.purchase_order_id
            .clone()
            .map(OrderKey::Purchase)
            .or_else(|| self.customer_order_id.clone().map(OrderKey::Customer))
    }

    /// Whether this order is identified by `key`.
    #[must_use]
    pub fn matches(&self, key: &OrderKey) -> bool {
        match key {
            OrderKey::Purchase(id) => self.purchase_order_id.as_ref() == Some(id),
            OrderKey::Customer(id) => self.customer_order_id.as_ref() == Some(id),
        }
    }

    /// Order lines, or an empty slice when the record carries none.
    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        self.order_lines.as_deref().unwrap_or_default()
    }

    /// Sum of line prices in the marketplace currency.
    #[must_use]
    pub fn line_price_sum(&self) -> rust_decimal::Decimal {
        self.lines()
            .iter()
            .map(|line| amount_or_zero(line.price.as_ref()))
            .sum()
    }

    /// Whether the marketplace status is `shipped`, ignoring case.
    #[must_use]
    pub fn is_shipped(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.to_lowercase() == "shipped")
    }

    /// Shallow-overlay `update` onto this record.
    ///
    /// Fields present on `update` replace the current value, fields it
    /// carried as `null` are cleared and absent fields are kept.
    /// Editable-field bags are overlaid field by field under the same rule.
    pub fn overlay(&mut self, update: Self) {
        let Self {
            purchase_order_id,
            customer_order_id,
            customer_email,
            status,
            shipment_status,
            phone,
            shipping_address,
            order_lines,
            tracking_number,
            tracking_url,
            cost,
            shipping_price,
            order_editable_fields,
            shipment_email,
            delivered_email,
            extra,
            nulls,
            wire_names,
        } = update;

        let lines_cleared = nulls.contains_any(&["orderLines", "orderInfo"]);
        if order_lines.is_some() || lines_cleared {
            self.wire_names
                .adopt(&wire_names, &["orderInfo", "qtyAmount", "chargeAmount"]);
        }
        if tracking_url.is_some() || nulls.contains_any(&["trackingUrl", "trackingURL"]) {
            self.wire_names.adopt(&wire_names, &["trackingURL"]);
        }

        overlay_field(&mut self.purchase_order_id, purchase_order_id, &nulls, &["purchaseOrderId"]);
        overlay_field(&mut self.customer_order_id, customer_order_id, &nulls, &["customerOrderId"]);
        overlay_field(&mut self.customer_email, customer_email, &nulls, &["customerEmailId"]);
        overlay_field(&mut self.status, status, &nulls, &["status"]);
        overlay_field(&mut self.shipment_status, shipment_status, &nulls, &["shipmentStatus"]);
        overlay_field(&mut self.phone, phone, &nulls, &["phone"]);
        overlay_field(&mut self.shipping_address, shipping_address, &nulls, &["shippingAddress"]);
        overlay_field(&mut self.order_lines, order_lines, &nulls, &["orderLines", "orderInfo"]);
        overlay_field(&mut self.tracking_number, tracking_number, &nulls, &["trackingNumber"]);
        overlay_field(
            &mut self.tracking_url,
            tracking_url,
            &nulls,
            &["trackingUrl", "trackingURL"],
        );
        overlay_field(&mut self.cost, cost, &nulls, &["cost"]);
        overlay_field(&mut self.shipping_price, shipping_price, &nulls, &["shippingPrice"]);
        if nulls.contains_any(&["orderEditableFields"]) {
            self.order_editable_fields = OrderEditableFields::default();
        } else {
            self.order_editable_fields.overlay(order_editable_fields);
        }
        overlay_field(&mut self.shipment_email, shipment_email, &nulls, &["shipmentEmail"]);
        overlay_field(&mut self.delivered_email, delivered_email, &nulls, &["deliveredEmail"]);
        self.extra.extend(extra);
    }

    /// Overlay product metadata onto the line with the given number.
    ///
    /// Returns `false` when the order has no such line.
    pub fn patch_line_fields(&mut self, line: &LineNumber, update: ProductEditableFields) -> bool {
        let Some(target) = self
            .order_lines
            .as_mut()
            .and_then(|lines| lines.iter_mut().find(|l| l.line_number.as_ref() == Some(line)))
        else {
            return false;
        };
        target.product_editable_fields.overlay(update);
        true
    }

    /// Use the shipping address as the billing address.
    pub fn billing_from_shipping(&mut self) {
        self.order_editable_fields.billing_address =
            self.shipping_address.clone().unwrap_or_default();
    }

    /// Reset the billing address to the empty template.
    pub fn clear_billing(&mut self) {
        self.order_editable_fields.billing_address = PostalAddress::default();
    }

    /// Every shipment field still missing before a carrier order can be
    /// created, as wire paths (`deadWeight`, `orderLines[2].hsn`, ...).
    #[must_use]
    pub fn missing_shipment_fields(&self) -> Vec<String> {
        let mut missing = self.order_editable_fields.missing_fields();

        for (index, line) in self.lines().iter().enumerate() {
            let label = line
                .line_number
                .as_ref()
                .map_or_else(|| (index + 1).to_string(), ToString::to_string);
            missing.extend(
                line.product_editable_fields
                    .missing_fields()
                    .into_iter()
                    .map(|field| format!("orderLines[{label}].{field}")),
            );
        }
        missing
    }
}

/// A single product line of an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Stable within the order; used to address line-level edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<LineNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, alias = "qtyAmount", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    /// Line charge in the marketplace currency.
    #[serde(default, alias = "chargeAmount", skip_serializing_if = "Option::is_none")]
    pub price: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_info: Option<TrackingInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_editable_fields: ProductEditableFields,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Carrier tracking for a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(
        default,
        rename = "trackingURL",
        alias = "trackingUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub tracking_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub nulls: ExplicitNulls,
}

impl PostalAddress {
    /// First word of the recipient name, if any.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.split_whitespace().next())
    }

    /// Required address parts that are missing or blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("address1", &self.address1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank_text(value.as_deref()))
        .map(|(name, _)| name)
        .collect()
    }

    fn overlay(&mut self, update: Self) {
        let nulls = &update.nulls;
        overlay_field(&mut self.name, update.name, nulls, &["name"]);
        overlay_field(&mut self.address1, update.address1, nulls, &["address1"]);
        overlay_field(&mut self.address2, update.address2, nulls, &["address2"]);
        overlay_field(&mut self.city, update.city, nulls, &["city"]);
        overlay_field(&mut self.state, update.state, nulls, &["state"]);
        overlay_field(&mut self.postal_code, update.postal_code, nulls, &["postalCode"]);
        overlay_field(&mut self.country, update.country, nulls, &["country"]);
        self.extra.extend(update.extra);
    }
}

/// Order-level shipment metadata entered by the seller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEditableFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_weight: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<RawAmount>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub billing_address: PostalAddress,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub nulls: ExplicitNulls,
}

impl OrderEditableFields {
    /// Overlay the fields present on `update` and clear its `null` fields.
    pub fn overlay(&mut self, update: Self) {
        let nulls = &update.nulls;
        overlay_field(&mut self.dead_weight, update.dead_weight, nulls, &["deadWeight"]);
        overlay_field(&mut self.length, update.length, nulls, &["length"]);
        overlay_field(&mut self.height, update.height, nulls, &["height"]);
        overlay_field(&mut self.width, update.width, nulls, &["width"]);
        if nulls.contains_any(&["billingAddress"]) {
            self.billing_address = PostalAddress::default();
        } else {
            self.billing_address.overlay(update.billing_address);
        }
        self.extra.extend(update.extra);
    }

    /// Fields that must be filled before a carrier order is created.
    ///
    /// Dimensions count as missing when absent, blank or zero.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing: Vec<String> = [
            ("deadWeight", &self.dead_weight),
            ("length", &self.length),
            ("height", &self.height),
            ("width", &self.width),
        ]
        .into_iter()
        .filter(|(_, value)| !value.as_ref().is_some_and(RawAmount::is_set))
        .map(|(name, _)| name.to_owned())
        .collect();

        missing.extend(
            self.billing_address
                .missing_fields()
                .into_iter()
                .map(|field| format!("billingAddress.{field}")),
        );
        missing
    }
}

/// Line-level shipment metadata entered by the seller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEditableFields {
    /// Product name to print on the carrier label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name_for_shiprocket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_weight: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<RawAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<RawAmount>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Fields to clear on overlay.
    #[serde(skip)]
    pub nulls: ExplicitNulls,
}

impl ProductEditableFields {
    /// Overlay the fields present on `update` and clear the ones named in
    /// its `nulls`.
    pub fn overlay(&mut self, update: Self) {
        let nulls = &update.nulls;
        overlay_field(
            &mut self.product_name_for_shiprocket,
            update.product_name_for_shiprocket,
            nulls,
            &["productNameForShiprocket"],
        );
        overlay_field(&mut self.hsn, update.hsn, nulls, &["hsn"]);
        overlay_field(&mut self.unit_price, update.unit_price, nulls, &["unitPrice"]);
        overlay_field(&mut self.dead_weight, update.dead_weight, nulls, &["deadWeight"]);
        overlay_field(&mut self.length, update.length, nulls, &["length"]);
        overlay_field(&mut self.height, update.height, nulls, &["height"]);
        overlay_field(&mut self.width, update.width, nulls, &["width"]);
        self.extra.extend(update.extra);
    }

    /// HSN and unit price are always required; any other field that was
    /// entered must not be blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if is_blank_text(self.hsn.as_deref()) {
            missing.push("hsn".to_owned());
        }
        if self.unit_price.as_ref().is_none_or(is_blank_amount) {
            missing.push("unitPrice".to_owned());
        }
        if self
            .product_name_for_shiprocket
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            missing.push("productNameForShiprocket".to_owned());
        }
        for (name, value) in [
            ("deadWeight", &self.dead_weight),
            ("length", &self.length),
            ("height", &self.height),
            ("width", &self.width),
        ] {
            if value.as_ref().is_some_and(is_blank_amount) {
                missing.push(name.to_owned());
            }
        }
        missing.extend(
            self.extra
                .iter()
                .filter(|(_, value)| {
                    value.is_null() || value.as_str().is_some_and(|s| s.trim().is_empty())
                })
                .map(|(name, _)| name.clone()),
        );
        missing
    }
}

fn is_blank_amount(amount: &RawAmount) -> bool {
    matches!(amount, RawAmount::Text(s) if s.trim().is_empty())
}

fn is_blank_text(value: Option<&str>) -> bool {
    value.is_none_or(|s| s.trim().is_empty())
}

fn overlay_field<T>(
    current: &mut Option<T>,
    update: Option<T>,
    nulls: &ExplicitNulls,
    names: &[&str],
) {
    if update.is_some() || nulls.contains_any(names) {
        *current = update;
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
