//! The canonical order sequence of one view.
//!
//! [`OrderStore`] is the only place an order collection is mutated. All
//! operations are synchronous and never touch the network. Merges that find
//! no target are silent no-ops; [`MergeReport`] lists them so callers can log
//! them.
//!
//! Identity is the purchase order id when a record carries one, otherwise the
//! customer order id. Every keyed order in the store has a distinct identity.

use serde_json::Value;

use crate::codec::patch_order;
use crate::error::DecodeError;
use crate::order::{Order, OrderEditableFields, OrderKey, ProductEditableFields};
use crate::types::LineNumber;

/// Outcome of [`OrderStore::merge_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Updates that found their target.
    pub matched: usize,
    /// Identities of updates that found no target.
    pub unmatched: Vec<OrderKey>,
    /// Updates that carried no identity at all.
    pub keyless: usize,
}

impl MergeReport {
    /// Whether any update was dropped.
    #[must_use]
    pub fn has_unmatched(&self) -> bool {
        !self.unmatched.is_empty() || self.keyless > 0
    }
}

/// An ordered collection of orders with identity-based merges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderStore {
    orders: Vec<Order>,
}

impl OrderStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { orders: Vec::new() }
    }

    /// Discard the current contents and load `orders`.
    ///
    /// Later records that repeat an identity already loaded are dropped so
    /// identities stay unique. Returns how many were dropped.
    pub fn replace_all(&mut self, orders: Vec<Order>) -> usize {
        let incoming = orders.len();
        self.orders = Vec::with_capacity(incoming);
        for order in orders {
            if order.key().is_some_and(|key| self.contains(&key)) {
                continue;
            }
            self.orders.push(order);
        }
        incoming - self.orders.len()
    }

    /// Overlay `update` onto the order with the same identity.
    ///
    /// Returns `false`, leaving the store untouched, when no order matches.
    pub fn merge_one(&mut self, update: Order) -> bool {
        let Some(index) = self.position_of(&update) else {
            return false;
        };
        if let Some(existing) = self.orders.get_mut(index) {
            existing.overlay(update);
        }
        true
    }

    /// Apply [`merge_one`](Self::merge_one) to each update independently.
    pub fn merge_many(&mut self, updates: impl IntoIterator<Item = Order>) -> MergeReport {
        let mut report = MergeReport::default();
        for update in updates {
            let key = update.key();
            if self.merge_one(update) {
                report.matched += 1;
            } else if let Some(key) = key {
                report.unmatched.push(key);
            } else {
                report.keyless += 1;
            }
        }
        report
    }

    /// Put orders not yet in the store at the front, newest first.
    ///
    /// Orders whose identity is already present keep their current position
    /// and contents. Keyless orders and repeats within `new_orders` are
    /// skipped. Returns how many orders were added.
    pub fn prepend_new(&mut self, new_orders: impl IntoIterator<Item = Order>) -> usize {
        let mut fresh: Vec<Order> = Vec::new();
        for order in new_orders {
            let Some(key) = order.key() else {
                continue;
            };
            if self.contains(&key) || fresh.iter().any(|o| o.matches(&key)) {
                continue;
            }
            fresh.push(order);
        }
        let added = fresh.len();
        fresh.append(&mut self.orders);
        self.orders = fresh;
        added
    }

    /// Set one wire field on the order identified by `key`.
    ///
    /// Returns `Ok(false)` when no order matches, or when the patch would
    /// give the order the identity of another order in the store.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::FieldValue`] if `value` does not fit the field;
    /// the order is left unchanged.
    pub fn patch_field(
        &mut self,
        key: &OrderKey,
        field: &str,
        value: Value,
    ) -> Result<bool, DecodeError> {
        let Some(index) = self.orders.iter().position(|o| o.matches(key)) else {
            return Ok(false);
        };
        let Some(existing) = self.orders.get(index) else {
            return Ok(false);
        };
        let patched = patch_order(existing, field, value)?;

        let collides = patched.key().is_some_and(|new_key| {
            self.orders
                .iter()
                .enumerate()
                .any(|(i, o)| i != index && o.matches(&new_key))
        });
        if collides {
            return Ok(false);
        }

        if let Some(slot) = self.orders.get_mut(index) {
            *slot = patched;
        }
        Ok(true)
    }

    /// Overlay order-level shipment metadata onto one order.
    ///
    /// Returns `false` when no order matches.
    pub fn patch_editable_fields(&mut self, key: &OrderKey, fields: OrderEditableFields) -> bool {
        let Some(order) = self.orders.iter_mut().find(|o| o.matches(key)) else {
            return false;
        };
        order.order_editable_fields.overlay(fields);
        true
    }

    /// Overlay product metadata onto one line of one order.
    ///
    /// Returns `false` when either the order or the line is missing.
    pub fn patch_line(
        &mut self,
        key: &OrderKey,
        line: &LineNumber,
        fields: ProductEditableFields,
    ) -> bool {
        self.orders
            .iter_mut()
            .find(|o| o.matches(key))
            .is_some_and(|order| order.patch_line_fields(line, fields))
    }

    #[must_use]
    pub fn get(&self, key: &OrderKey) -> Option<&Order> {
        self.orders.iter().find(|o| o.matches(key))
    }

    #[must_use]
    pub fn contains(&self, key: &OrderKey) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Order] {
        &self.orders
    }

    /// A copy of the current sequence for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Order> {
        self.orders.clone()
    }

    // Purchase order id first. The customer order id only matches when one
    // side has no purchase order id, so a merge never rewrites an identity.
    fn position_of(&self, update: &Order) -> Option<usize> {
        let by_purchase = update.purchase_order_id.as_ref().and_then(|id| {
            self.orders
                .iter()
                .position(|o| o.purchase_order_id.as_ref() == Some(id))
        });
        by_purchase.or_else(|| {
            let id = update.customer_order_id.as_ref()?;
            self.orders.iter().position(|o| {
                o.customer_order_id.as_ref() == Some(id)
                    && (update.purchase_order_id.is_none() || o.purchase_order_id.is_none())
            })
        })
    }
}

impl From<Vec<Order>> for OrderStore {
    fn from(orders: Vec<Order>) -> Self {
        let mut store = Self::new();
        store.replace_all(orders);
        store
    }
}

impl<'a> IntoIterator for &'a OrderStore {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::types::{CustomerOrderId, PurchaseOrderId, RawAmount};
    use serde_json::json;

    fn order(value: Value) -> Order {
        decode(value).unwrap()
    }

    fn keyed(id: &str) -> Order {
        order(json!({"purchaseOrderId": id}))
    }

    fn purchase(id: &str) -> OrderKey {
        OrderKey::Purchase(PurchaseOrderId::new(id))
    }

    fn ids(store: &OrderStore) -> Vec<String> {
        store
            .iter()
            .map(|o| o.purchase_order_id.clone().unwrap().into_inner())
            .collect()
    }

    #[test]
    fn test_replace_all_discards_previous_contents() {
        let mut store = OrderStore::from(vec![keyed("A"), keyed("B")]);
        let dropped = store.replace_all(vec![keyed("C")]);
        assert_eq!(dropped, 0);
        assert_eq!(ids(&store), vec!["C"]);
    }

    #[test]
    fn test_replace_all_keeps_identities_unique() {
        let mut store = OrderStore::new();
        let mut first = keyed("A");
        first.status = Some("created".to_string());
        let dropped = store.replace_all(vec![first, keyed("B"), keyed("A")]);
        assert_eq!(dropped, 1);
        assert_eq!(ids(&store), vec!["A", "B"]);
        assert_eq!(store.get(&purchase("A")).unwrap().status.as_deref(), Some("created"));
    }

    #[test]
    fn test_merge_one_preserves_untouched_fields() {
        let mut store = OrderStore::from(vec![order(json!({
            "purchaseOrderId": "A",
            "status": "Created",
            "cost": 50,
            "phone": "98200",
            "orderEditableFields": {"deadWeight": "0.5"}
        }))]);

        let matched = store.merge_one(order(json!({
            "purchaseOrderId": "A",
            "status": "Shipped",
            "shippingPrice": 20
        })));

        assert!(matched);
        let merged = store.get(&purchase("A")).unwrap();
        assert_eq!(merged.status.as_deref(), Some("Shipped"));
        assert_eq!(merged.shipping_price, Some(RawAmount::from(20)));
        assert_eq!(merged.cost, Some(RawAmount::from(50)));
        assert_eq!(merged.phone.as_deref(), Some("98200"));
        assert_eq!(
            merged.order_editable_fields.dead_weight,
            Some(RawAmount::from("0.5"))
        );
    }

    #[test]
    fn test_merge_one_explicit_null_clears_field() {
        let mut store = OrderStore::from(vec![order(json!({
            "purchaseOrderId": "A",
            "trackingNumber": "OLD",
            "trackingUrl": "https://track.example/OLD"
        }))]);

        assert!(store.merge_one(order(json!({"purchaseOrderId": "A", "trackingNumber": null}))));

        let merged = store.get(&purchase("A")).unwrap();
        assert_eq!(merged.tracking_number, None);
        assert_eq!(
            merged.tracking_url.as_deref(),
            Some("https://track.example/OLD")
        );
    }

    #[test]
    fn test_merge_one_absent_identity_is_noop() {
        let mut store = OrderStore::from(vec![keyed("A"), keyed("B")]);
        let before = store.clone();

        assert!(!store.merge_one(order(json!({"purchaseOrderId": "Z", "status": "Shipped"}))));
        assert!(!store.merge_one(order(json!({"status": "Shipped"}))));
        assert_eq!(store, before);
    }

    #[test]
    fn test_merge_by_customer_order_id() {
        let mut store = OrderStore::from(vec![order(json!({
            "purchaseOrderId": "P1",
            "customerOrderId": "C1"
        }))]);
        assert!(store.merge_one(order(json!({
            "customerOrderId": "C1",
            "shipmentStatus": "CREATED"
        }))));
        let merged = store
            .get(&OrderKey::Customer(CustomerOrderId::new("C1")))
            .unwrap();
        assert_eq!(merged.shipment_status.as_deref(), Some("CREATED"));
        assert_eq!(merged.purchase_order_id, Some(PurchaseOrderId::new("P1")));

        // A different purchase order id never matches through the customer id.
        assert!(!store.merge_one(order(json!({
            "purchaseOrderId": "P2",
            "customerOrderId": "C1"
        }))));
    }

    #[test]
    fn test_merge_many_reports_unmatched() {
        let mut store = OrderStore::from(vec![keyed("A"), keyed("B")]);
        let report = store.merge_many(vec![
            order(json!({"purchaseOrderId": "A", "shippingPrice": 40})),
            order(json!({"purchaseOrderId": "X", "shippingPrice": 10})),
            order(json!({"shippingPrice": 10})),
        ]);

        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched, vec![purchase("X")]);
        assert_eq!(report.keyless, 1);
        assert!(report.has_unmatched());
        assert_eq!(ids(&store), vec!["A", "B"]);
    }

    #[test]
    fn test_merge_keeps_editable_bags_object_shaped() {
        let mut store = OrderStore::from(vec![keyed("A")]);
        store.merge_one(order(json!({"purchaseOrderId": "A", "orderEditableFields": null})));
        assert_eq!(
            store.get(&purchase("A")).unwrap().order_editable_fields,
            OrderEditableFields::default()
        );
    }

    #[test]
    fn test_prepend_new_deduplicates() {
        let mut store = OrderStore::from(vec![
            keyed("A"),
            order(json!({"purchaseOrderId": "B", "status": "Created"})),
        ]);

        let added = store.prepend_new(vec![
            order(json!({"purchaseOrderId": "B", "status": "Shipped"})),
            keyed("C"),
        ]);

        assert_eq!(added, 1);
        assert_eq!(ids(&store), vec!["C", "A", "B"]);
        assert_eq!(
            store.get(&purchase("B")).unwrap().status.as_deref(),
            Some("Created")
        );
    }

    #[test]
    fn test_prepend_new_skips_batch_repeats_and_keyless() {
        let mut store = OrderStore::from(vec![keyed("A")]);
        let added = store.prepend_new(vec![
            keyed("D"),
            keyed("C"),
            keyed("D"),
            order(json!({"status": "Created"})),
        ]);
        assert_eq!(added, 2);
        assert_eq!(ids(&store), vec!["D", "C", "A"]);
    }

    #[test]
    fn test_patch_field() {
        let mut store = OrderStore::from(vec![keyed("A"), keyed("B")]);

        assert!(store.patch_field(&purchase("A"), "shippingPrice", json!(35)).unwrap());
        assert_eq!(
            store.get(&purchase("A")).unwrap().shipping_price,
            Some(RawAmount::from(35))
        );
        assert!(!store.patch_field(&purchase("Z"), "cost", json!(1)).unwrap());
    }

    #[test]
    fn test_patch_field_failure_leaves_order_unchanged() {
        let mut store = OrderStore::from(vec![keyed("A")]);
        let before = store.clone();
        assert!(store.patch_field(&purchase("A"), "deliveredEmail", json!([1])).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_patch_field_rejects_identity_collision() {
        let mut store = OrderStore::from(vec![keyed("A"), keyed("B")]);
        assert!(!store
            .patch_field(&purchase("A"), "purchaseOrderId", json!("B"))
            .unwrap());
        assert_eq!(ids(&store), vec!["A", "B"]);
    }

    #[test]
    fn test_patch_line() {
        let mut store = OrderStore::from(vec![order(json!({
            "purchaseOrderId": "A",
            "orderLines": [{"lineNumber": "1"}]
        }))]);
        let fields = ProductEditableFields {
            hsn: Some("3304".to_string()),
            ..Default::default()
        };

        assert!(store.patch_line(&purchase("A"), &LineNumber::new("1"), fields.clone()));
        assert!(!store.patch_line(&purchase("B"), &LineNumber::new("1"), fields));
        assert_eq!(
            store.get(&purchase("A")).unwrap().lines()[0]
                .product_editable_fields
                .hsn
                .as_deref(),
            Some("3304")
        );
    }

    #[test]
    fn test_patch_editable_fields() {
        let mut store = OrderStore::from(vec![order(json!({
            "purchaseOrderId": "A",
            "orderEditableFields": {"deadWeight": "0.5"}
        }))]);
        let fields = OrderEditableFields {
            length: Some(RawAmount::from(12)),
            ..Default::default()
        };

        assert!(store.patch_editable_fields(&purchase("A"), fields.clone()));
        assert!(!store.patch_editable_fields(&purchase("B"), fields));
        let bag = &store.get(&purchase("A")).unwrap().order_editable_fields;
        assert_eq!(bag.dead_weight, Some(RawAmount::from("0.5")));
        assert_eq!(bag.length, Some(RawAmount::from(12)));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = OrderStore::from(vec![keyed("A")]);
        let snapshot = store.snapshot();
        store.replace_all(Vec::new());
        assert_eq!(snapshot.len(), 1);
        assert!(store.is_empty());
    }
}
