//! Converting between raw backend records and [`Order`]s.
//!
//! Some endpoints persist `orderLines` (or its `orderInfo` alias) and
//! `shippingAddress` as JSON-encoded strings, others return them as nested
//! structures. [`decode`] accepts both. Decoding is idempotent: a record that
//! is already structured passes through unchanged.
//!
//! [`encode`] is the write-back direction. It restores the spellings the
//! record arrived with, so an endpoint that sent `orderInfo` lines with
//! `qtyAmount` gets them back under those names.

use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::order::{
    ExplicitNulls, LINE_FIELD_ALIASES, ORDER_FIELD_ALIASES, Order, OrderKey, WireNames,
};
use crate::types::{CustomerOrderId, PurchaseOrderId};

/// Fields that may arrive as JSON-encoded strings.
const STRING_ENCODED_FIELDS: [&str; 3] = ["orderLines", "orderInfo", "shippingAddress"];

/// Decode one raw record.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedField`] if a string-encoded field does
/// not hold valid JSON, [`DecodeError::NotAnObject`] if the record is not
/// an object and [`DecodeError::Shape`] if the record does not have the
/// order shape.
pub fn decode(raw: Value) -> Result<Order, DecodeError> {
    let map = into_object(raw)?;
    let map = expand_string_fields(map)?;

    let wire_names = wire_names(&map);
    let nulls = ExplicitNulls::from_object(&map);
    let bag = map.get("orderEditableFields").and_then(Value::as_object);
    let bag_nulls = bag.map(ExplicitNulls::from_object).unwrap_or_default();
    let billing_nulls = bag
        .and_then(|bag| bag.get("billingAddress"))
        .and_then(Value::as_object)
        .map(ExplicitNulls::from_object)
        .unwrap_or_default();

    let mut order: Order = serde_json::from_value(Value::Object(map))?;
    order.wire_names = wire_names;
    order.nulls = nulls;
    order.order_editable_fields.nulls = bag_nulls;
    order.order_editable_fields.billing_address.nulls = billing_nulls;
    Ok(order)
}

/// Serialize `order` for sending back to the backend.
///
/// Fields use the spellings the record was decoded with.
///
/// # Errors
///
/// Returns [`DecodeError::Shape`] if the order cannot be serialized.
pub fn encode(order: &Order) -> Result<Value, DecodeError> {
    let mut value = serde_json::to_value(order)?;
    let Some(map) = value.as_object_mut() else {
        return Ok(value);
    };

    for (alias, name) in ORDER_FIELD_ALIASES {
        if order.wire_names.uses(alias) {
            rename_key(map, name, alias);
        }
    }
    let lines_key = if order.wire_names.uses("orderInfo") {
        "orderInfo"
    } else {
        "orderLines"
    };
    if let Some(Value::Array(lines)) = map.get_mut(lines_key) {
        for line in lines.iter_mut().filter_map(Value::as_object_mut) {
            for (alias, name) in LINE_FIELD_ALIASES {
                if order.wire_names.uses(alias) {
                    rename_key(line, name, alias);
                }
            }
        }
    }
    Ok(value)
}

/// A record that failed to decode inside a batch.
#[derive(Debug)]
pub struct DecodeFailure {
    /// Position of the record in the batch.
    pub index: usize,
    /// Identity read from the raw record, when it had one.
    pub key: Option<OrderKey>,
    pub error: DecodeError,
}

/// Result of decoding a batch: the good records plus one failure entry per
/// bad record.
#[derive(Debug, Default)]
pub struct DecodedBatch {
    pub orders: Vec<Order>,
    pub failures: Vec<DecodeFailure>,
}

impl DecodedBatch {
    /// Whether every record decoded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Decode every record independently; a bad record never aborts the batch.
#[must_use]
pub fn decode_batch(raws: impl IntoIterator<Item = Value>) -> DecodedBatch {
    let mut batch = DecodedBatch::default();
    for (index, raw) in raws.into_iter().enumerate() {
        let key = raw_key(&raw);
        match decode(raw) {
            Ok(order) => batch.orders.push(order),
            Err(error) => batch.failures.push(DecodeFailure { index, key, error }),
        }
    }
    batch
}

/// Return a copy of `order` with one wire field set to `value`.
///
/// The field is addressed by its wire name (`shippingPrice`, `cost`,
/// `orderLines`, ...). Unknown names land in the order's extra fields.
/// Either spelling of an aliased field is accepted and the order keeps the
/// spelling it already uses. String-encoded fields are accepted in either
/// form, and `null` clears an optional field.
///
/// # Errors
///
/// Returns [`DecodeError::FieldValue`] when `value` has the wrong type for
/// the field.
pub fn patch_order(order: &Order, field: &str, value: Value) -> Result<Order, DecodeError> {
    let field_error = |source| DecodeError::FieldValue {
        field: field.to_owned(),
        source,
    };

    let Value::Object(mut map) = encode(order)? else {
        return Err(DecodeError::NotAnObject("non-object order"));
    };
    let target = ORDER_FIELD_ALIASES
        .iter()
        .find_map(|&(alias, name)| match field {
            f if f == alias && map.contains_key(name) => Some(name),
            f if f == name && map.contains_key(alias) => Some(alias),
            _ => None,
        })
        .unwrap_or(field);
    map.insert(target.to_owned(), value);

    decode(Value::Object(map)).map_err(|err| match err {
        DecodeError::MalformedField { source, .. } | DecodeError::Shape(source) => {
            field_error(source)
        }
        other => other,
    })
}

fn into_object(raw: Value) -> Result<Map<String, Value>, DecodeError> {
    match raw {
        Value::Object(map) => Ok(map),
        Value::Null => Err(DecodeError::NotAnObject("null")),
        Value::Bool(_) => Err(DecodeError::NotAnObject("boolean")),
        Value::Number(_) => Err(DecodeError::NotAnObject("number")),
        Value::String(_) => Err(DecodeError::NotAnObject("string")),
        Value::Array(_) => Err(DecodeError::NotAnObject("array")),
    }
}

fn expand_string_fields(mut map: Map<String, Value>) -> Result<Map<String, Value>, DecodeError> {
    for field in STRING_ENCODED_FIELDS {
        if let Some(Value::String(encoded)) = map.get(field) {
            let parsed: Value = serde_json::from_str(encoded)
                .map_err(|source| DecodeError::MalformedField { field, source })?;
            map.insert(field.to_owned(), parsed);
        }
    }
    Ok(map)
}

fn wire_names(map: &Map<String, Value>) -> WireNames {
    let mut names = WireNames::default();
    for (alias, _) in ORDER_FIELD_ALIASES {
        if map.contains_key(alias) {
            names.insert(alias);
        }
    }
    let lines = map
        .get("orderInfo")
        .or_else(|| map.get("orderLines"))
        .and_then(Value::as_array);
    for (alias, _) in LINE_FIELD_ALIASES {
        if lines.is_some_and(|lines| lines.iter().any(|line| line.get(alias).is_some())) {
            names.insert(alias);
        }
    }
    names
}

fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = map.remove(from) {
        map.insert(to.to_owned(), value);
    }
}

fn raw_key(raw: &Value) -> Option<OrderKey> {
    let text = |field: &str| match raw.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    text("purchaseOrderId")
        .map(|id| OrderKey::Purchase(PurchaseOrderId::new(id)))
        .or_else(|| text("customerOrderId").map(|id| OrderKey::Customer(CustomerOrderId::new(id))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::RawAmount;
    use serde_json::json;

    #[test]
    fn test_decode_string_encoded_fields() {
        let order = decode(json!({
            "purchaseOrderId": "P1",
            "orderLines": "[{\"lineNumber\":\"1\",\"price\":10.5}]",
            "shippingAddress": "{\"name\":\"Asha Rao\",\"city\":\"Pune\"}"
        }))
        .unwrap();

        assert_eq!(order.lines().len(), 1);
        assert_eq!(
            order.lines()[0].price.as_ref().and_then(RawAmount::to_decimal),
            Some(rust_decimal::Decimal::new(105, 1))
        );
        assert_eq!(
            order.shipping_address.unwrap().city.as_deref(),
            Some("Pune")
        );
    }

    #[test]
    fn test_decode_structured_fields_pass_through() {
        let raw = json!({
            "purchaseOrderId": "P1",
            "orderLines": [{"lineNumber": 1, "price": 10}],
            "shippingAddress": {"name": "Asha"}
        });
        let once = decode(raw.clone()).unwrap();
        let twice = decode(serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_decode_string_then_structured_is_idempotent() {
        let once = decode(json!({
            "customerOrderId": "C1",
            "orderInfo": "[{\"lineNumber\":1}]",
            "shippingAddress": "{\"city\":\"Pune\"}"
        }))
        .unwrap();
        let twice = decode(encode(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_encode_restores_arrival_spellings() {
        let order = decode(json!({
            "purchaseOrderId": "P1",
            "trackingURL": "https://track.example/SR1",
            "orderInfo": [{"lineNumber": 1, "qtyAmount": "2", "chargeAmount": "12.50"}]
        }))
        .unwrap();

        let body = encode(&order).unwrap();

        assert_eq!(body["trackingURL"], "https://track.example/SR1");
        assert!(body.get("trackingUrl").is_none());
        assert!(body.get("orderLines").is_none());
        let line = &body["orderInfo"][0];
        assert_eq!(line["qtyAmount"], "2");
        assert_eq!(line["chargeAmount"], "12.50");
        assert!(line.get("quantity").is_none());
        assert!(line.get("price").is_none());
    }

    #[test]
    fn test_encode_canonical_record_is_plain_serialization() {
        let order = decode(json!({
            "purchaseOrderId": "P1",
            "orderLines": [{"lineNumber": 1, "quantity": "2"}]
        }))
        .unwrap();
        assert_eq!(encode(&order).unwrap(), serde_json::to_value(&order).unwrap());
    }

    #[test]
    fn test_decode_records_explicit_nulls() {
        let order = decode(json!({
            "purchaseOrderId": "P1",
            "trackingNumber": null,
            "orderEditableFields": {"width": null, "billingAddress": {"city": null}}
        }))
        .unwrap();

        assert!(order.nulls.contains_any(&["trackingNumber"]));
        assert!(!order.nulls.contains_any(&["purchaseOrderId"]));
        assert!(order.order_editable_fields.nulls.contains_any(&["width"]));
        assert!(
            order
                .order_editable_fields
                .billing_address
                .nulls
                .contains_any(&["city"])
        );
    }

    #[test]
    fn test_decode_malformed_string_field() {
        let err = decode(json!({"purchaseOrderId": "P1", "shippingAddress": "{not json"}))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedField { field: "shippingAddress", .. }
        ));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(
            decode(json!([1, 2])),
            Err(DecodeError::NotAnObject("array"))
        ));
        assert!(matches!(
            decode(Value::Null),
            Err(DecodeError::NotAnObject("null"))
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = decode(json!({"purchaseOrderId": "P1", "orderLines": 7})).unwrap_err();
        assert!(matches!(err, DecodeError::Shape(_)));
    }

    #[test]
    fn test_batch_isolates_bad_records() {
        let batch = decode_batch(vec![
            json!({"purchaseOrderId": "A"}),
            json!({"purchaseOrderId": "B", "shippingAddress": "{oops"}),
            json!({"purchaseOrderId": "C"}),
        ]);

        assert_eq!(batch.orders.len(), 2);
        assert_eq!(batch.failures.len(), 1);
        let failure = &batch.failures[0];
        assert_eq!(failure.index, 1);
        assert_eq!(
            failure.key,
            Some(OrderKey::Purchase(PurchaseOrderId::new("B")))
        );
        assert!(!batch.is_clean());
    }

    #[test]
    fn test_patch_order_sets_and_clears() {
        let order = decode(json!({"purchaseOrderId": "P1", "shippingPrice": 20})).unwrap();

        let patched = patch_order(&order, "cost", json!("50")).unwrap();
        assert_eq!(patched.cost, Some(RawAmount::from("50")));
        assert_eq!(patched.shipping_price, Some(RawAmount::from(20)));

        let cleared = patch_order(&patched, "shippingPrice", Value::Null).unwrap();
        assert_eq!(cleared.shipping_price, None);
    }

    #[test]
    fn test_patch_order_unknown_field_goes_to_extra() {
        let order = decode(json!({"purchaseOrderId": "P1"})).unwrap();
        let patched = patch_order(&order, "note", json!("fragile")).unwrap();
        assert_eq!(patched.extra.get("note"), Some(&json!("fragile")));
    }

    #[test]
    fn test_patch_order_accepts_alias_and_string_encoding() {
        let order = decode(json!({"purchaseOrderId": "P1", "orderLines": [{"lineNumber": 1}]}))
            .unwrap();
        let patched = patch_order(&order, "orderInfo", json!("[{\"lineNumber\":2}]")).unwrap();
        assert_eq!(patched.lines().len(), 1);
        assert_eq!(
            patched.lines()[0].line_number.as_ref().map(|n| n.as_str()),
            Some("2")
        );
    }

    #[test]
    fn test_patch_order_keeps_arrival_spelling() {
        let order = decode(json!({
            "purchaseOrderId": "P1",
            "orderInfo": [{"lineNumber": 1, "qtyAmount": "2"}]
        }))
        .unwrap();

        let patched = patch_order(&order, "orderLines", json!([{"lineNumber": 1, "qtyAmount": "3"}]))
            .unwrap();

        assert_eq!(patched.lines()[0].quantity, Some(RawAmount::from("3")));
        let body = encode(&patched).unwrap();
        assert_eq!(body["orderInfo"][0]["qtyAmount"], "3");
        assert!(body.get("orderLines").is_none());
    }

    #[test]
    fn test_patch_order_rejects_wrong_type() {
        let order = decode(json!({"purchaseOrderId": "P1"})).unwrap();
        let err = patch_order(&order, "shipmentEmail", json!("yes")).unwrap_err();
        assert!(matches!(err, DecodeError::FieldValue { .. }));
    }
}
