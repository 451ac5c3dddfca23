//! Sync operations: backend calls whose results are merged into a view.
//!
//! An [`OrderView`] binds one feed, one [`OrderStore`], one backend and one
//! credential source. Each operation:
//!
//! 1. validates its input, failing before any request is made;
//! 2. claims its in-flight flag, so a second submission of the same
//!    operation is rejected while the first is running;
//! 3. calls the backend with the current bearer token;
//! 4. decodes the response record by record and merges it into the store.
//!
//! The store is locked only for step 4. Two different operations may
//! therefore be in flight at once and merge in order of completion; merges
//! overlay field by field, so the last response to arrive wins per field.
//! A failed call merges nothing.

mod guard;
mod shipment;

pub use shipment::{
    ShipmentGroup, ShipmentLine, ShipmentMode, ShipmentQuantity, ShipmentStatusUpdate,
    WalmartShipment, validate_for_carrier,
};

use core::fmt;

use chrono::NaiveDate;
use seller_console_core::{
    CustomerOrderId, DecodeError, DecodedBatch, LineNumber, MergeReport, Order,
    OrderEditableFields, OrderKey, OrderStore, ProductEditableFields, PurchaseOrderId, RawAmount,
    ValidationError, decode, decode_batch, encode, patch_order,
};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use self::guard::{InFlight, InFlightGuard};
use crate::auth::AuthProvider;
use crate::backend::{Backend, BackendRequest, send_authorized};
use crate::email::OrderEmail;
use crate::error::{FetchError, SyncError};

/// Which backend list a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderFeed {
    /// Orders still waiting to ship.
    Unshipped,
    /// Full order history, for order management.
    History,
    /// Order history oldest first, for promotional outreach.
    Promotion,
}

impl OrderFeed {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Unshipped => "/walmart/unshipped/orders",
            Self::History => "/walmart/getAllOrderHistory",
            Self::Promotion => "/walmart/getAllOrderHistoryByAsc",
        }
    }
}

/// The operations a view can run; each has its own in-flight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchOrders,
    SyncShippingPrice,
    SyncOrders,
    UpdateStatus,
    PatchField,
    SendEmail,
    RefreshShipmentStatus,
    SubmitShipment,
    ShipInWalmart,
}

impl Operation {
    pub const ALL: [Self; 9] = [
        Self::FetchOrders,
        Self::SyncShippingPrice,
        Self::SyncOrders,
        Self::UpdateStatus,
        Self::PatchField,
        Self::SendEmail,
        Self::RefreshShipmentStatus,
        Self::SubmitShipment,
        Self::ShipInWalmart,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchOrders => "fetch orders",
            Self::SyncShippingPrice => "sync shipping price",
            Self::SyncOrders => "sync orders",
            Self::UpdateStatus => "update status",
            Self::PatchField => "patch field",
            Self::SendEmail => "send email",
            Self::RefreshShipmentStatus => "refresh shipment status",
            Self::SubmitShipment => "submit shipment",
            Self::ShipInWalmart => "ship in walmart",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status buckets the backend can transition in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusBucket {
    CreatedOrder,
    ShippedOrder,
}

impl StatusBucket {
    /// Path segment of the bucket. The casing differs between buckets.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedOrder => "createdOrder",
            Self::ShippedOrder => "ShippedOrder",
        }
    }
}

impl fmt::Display for StatusBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`OrderView::fetch_orders`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub loaded: usize,
    /// Records dropped because their identity was already loaded.
    pub duplicates: usize,
    pub decode_failures: usize,
}

/// Outcome of an operation that merges a list of updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub merge: MergeReport,
    pub decode_failures: usize,
}

/// Outcome of [`OrderView::sync_orders_since`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrependSummary {
    /// Orders new to the view.
    pub added: usize,
    /// Orders returned by the backend that the view already had.
    pub already_present: usize,
    pub decode_failures: usize,
}

/// Orders whose shipping price should be synced: no shipping price yet and
/// a status other than `Created`.
#[must_use]
pub fn shipping_price_candidates(orders: &[Order]) -> Vec<&Order> {
    orders
        .iter()
        .filter(|order| !order.shipping_price.as_ref().is_some_and(RawAmount::is_set))
        .filter(|order| {
            order
                .status
                .as_deref()
                .map(str::trim)
                .is_some_and(|status| !status.is_empty() && !status.eq_ignore_ascii_case("created"))
        })
        .collect()
}

/// One view of orders and the operations that keep it in sync.
pub struct OrderView<B, A> {
    feed: OrderFeed,
    backend: B,
    auth: A,
    store: RwLock<OrderStore>,
    in_flight: InFlight,
}

impl<B, A> fmt::Debug for OrderView<B, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderView")
            .field("feed", &self.feed)
            .finish_non_exhaustive()
    }
}

impl<B: Backend, A: AuthProvider> OrderView<B, A> {
    #[must_use]
    pub fn new(feed: OrderFeed, backend: B, auth: A) -> Self {
        Self {
            feed,
            backend,
            auth,
            store: RwLock::new(OrderStore::new()),
            in_flight: InFlight::default(),
        }
    }

    #[must_use]
    pub const fn feed(&self) -> OrderFeed {
        self.feed
    }

    /// A copy of the view's current orders.
    pub async fn snapshot(&self) -> Vec<Order> {
        self.store.read().await.snapshot()
    }

    /// A copy of one order.
    pub async fn order(&self, key: &OrderKey) -> Option<Order> {
        self.store.read().await.get(key).cloned()
    }

    /// Edit order-level shipment metadata locally, ahead of
    /// [`submit_shipment`](Self::submit_shipment).
    pub async fn edit_order_fields(&self, key: &OrderKey, fields: OrderEditableFields) -> bool {
        self.store.write().await.patch_editable_fields(key, fields)
    }

    /// Edit one line's product metadata locally.
    pub async fn edit_line_fields(
        &self,
        key: &OrderKey,
        line: &LineNumber,
        fields: ProductEditableFields,
    ) -> bool {
        self.store.write().await.patch_line(key, line, fields)
    }

    /// Whether `operation` is currently running on this view.
    #[must_use]
    pub fn is_in_flight(&self, operation: Operation) -> bool {
        self.in_flight.is_running(operation)
    }

    /// Load the feed, replacing the view's contents.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Fetch` if the call fails and `SyncError::InFlight`
    /// if a fetch is already running. The view is unchanged on error.
    #[instrument(skip_all, fields(feed = ?self.feed))]
    pub async fn fetch_orders(&self) -> Result<FetchSummary, SyncError> {
        let _guard = self.begin(Operation::FetchOrders)?;

        let response = self.call(BackendRequest::get(self.feed.path())).await?;
        let batch = decode_list(response)?;
        let decode_failures = batch.failures.len();
        log_failures(&batch);

        let loaded = batch.orders.len();
        let duplicates = self.store.write().await.replace_all(batch.orders);
        if duplicates > 0 {
            warn!(duplicates, "dropped orders with repeated identities");
        }

        info!(loaded = loaded - duplicates, decode_failures, "orders loaded");
        Ok(FetchSummary {
            loaded: loaded - duplicates,
            duplicates,
            decode_failures,
        })
    }

    /// Ask the backend for shipping prices of orders that have none yet.
    ///
    /// Makes no call when no order qualifies. Orders the backend does not
    /// return are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Fetch` if the call fails.
    #[instrument(skip(self))]
    pub async fn sync_shipping_price(&self) -> Result<MergeSummary, SyncError> {
        let _guard = self.begin(Operation::SyncShippingPrice)?;

        let ids: Vec<Value> = {
            let store = self.store.read().await;
            shipping_price_candidates(store.as_slice())
                .into_iter()
                .map(|order| {
                    json!({
                        "customerOrderId": order.customer_order_id,
                        "purchaseOrderId": order.purchase_order_id,
                    })
                })
                .collect()
        };
        if ids.is_empty() {
            debug!("no orders need a shipping price");
            return Ok(MergeSummary::default());
        }

        let requested = ids.len();
        let response = self
            .call(BackendRequest::put("/walmart/syncShippingPrice").json(Value::Array(ids)))
            .await?;
        let summary = self.merge_list(decode_list(response)?).await;
        info!(requested, updated = summary.merge.matched, "shipping prices synced");
        Ok(summary)
    }

    /// Pull orders the marketplace has created since `date` and put the ones
    /// the view does not have yet at the front.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Fetch` if the call fails.
    #[instrument(skip_all, fields(date = %date))]
    pub async fn sync_orders_since(&self, date: NaiveDate) -> Result<PrependSummary, SyncError> {
        let _guard = self.begin(Operation::SyncOrders)?;

        let request = BackendRequest::get("/walmart/orders/sync")
            .query("date", date.format("%Y-%m-%d").to_string());
        let batch = decode_list(self.call(request).await?)?;
        let decode_failures = batch.failures.len();
        log_failures(&batch);

        let returned = batch.orders.len();
        let added = self.store.write().await.prepend_new(batch.orders);

        info!(added, returned, "orders synced");
        Ok(PrependSummary {
            added,
            already_present: returned - added,
            decode_failures,
        })
    }

    /// Transition every order in `bucket` and merge the affected orders.
    ///
    /// A response that is not a list is treated as "no orders changed".
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Fetch` if the call fails.
    #[instrument(skip_all, fields(bucket = %bucket))]
    pub async fn bulk_update_status(&self, bucket: StatusBucket) -> Result<MergeSummary, SyncError> {
        let _guard = self.begin(Operation::UpdateStatus)?;

        let path = format!("/walmart/updateStatus/{bucket}");
        let response = self.call(BackendRequest::put(path)).await?;
        let batch = match response {
            Value::Array(records) => decode_batch(records),
            other => {
                debug!(response = %other, "status update returned no order list");
                DecodedBatch::default()
            }
        };

        let summary = self.merge_list(batch).await;
        info!(updated = summary.merge.matched, "status bucket updated");
        Ok(summary)
    }

    /// Change one field of one order.
    ///
    /// The value is checked against the field locally first. The view is
    /// updated only after the backend accepts the change. Returns whether
    /// the order was still in the view at that point.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation` for an unknown order or one without a
    /// purchase order id, `SyncError::Decode` when the value does not fit the
    /// field, and `SyncError::Fetch` if the call fails.
    #[instrument(skip_all, fields(key = %key, field = %field))]
    pub async fn patch_order_field(
        &self,
        key: &OrderKey,
        field: &str,
        value: Value,
    ) -> Result<bool, SyncError> {
        if field.trim().is_empty() {
            return Err(ValidationError::MissingField("field").into());
        }
        let order = self.require_order(key).await?;
        let purchase_order_id = order
            .purchase_order_id
            .clone()
            .ok_or(ValidationError::MissingField("purchaseOrderId"))?;
        patch_order(&order, field, value.clone())?;

        let _guard = self.begin(Operation::PatchField)?;
        let body = json!({
            "purchaseOrderId": purchase_order_id,
            "field": field,
            "value": value,
        });
        self.call(BackendRequest::put("/walmart/updateOrder").json(body))
            .await?;

        let patched = self.store.write().await.patch_field(key, field, value)?;
        if !patched {
            warn!("order left the view before the patch was confirmed");
        }
        Ok(patched)
    }

    /// Send a customer email and merge the order the backend returns.
    ///
    /// Returns whether a returned order was merged.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation` without calling the backend when
    /// `to`, `subject`, `body` or the purchase order id is empty, and
    /// `SyncError::Fetch` if the call fails.
    #[instrument(skip_all, fields(kind = %email.kind))]
    pub async fn send_order_email(&self, email: OrderEmail) -> Result<bool, SyncError> {
        email.validate()?;
        let _guard = self.begin(Operation::SendEmail)?;

        let body = json!({
            "purchaseOrderId": email.purchase_order_id,
            "type": email.kind.as_str(),
            "to": email.to,
            "subject": email.subject,
            "body": email.body,
        });
        let response = self
            .call(BackendRequest::post("/dashboard/send-email").json(body))
            .await?;

        info!("email sent");
        Ok(self.merge_single(response).await)
    }

    /// Refresh carrier status and tracking for one order.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Fetch` if the call fails or the response is not a
    /// status object.
    #[instrument(skip_all, fields(customer_order_id = %customer_order_id))]
    pub async fn refresh_shipment_status(
        &self,
        customer_order_id: &CustomerOrderId,
    ) -> Result<bool, SyncError> {
        let _guard = self.begin(Operation::RefreshShipmentStatus)?;

        let path = format!("/shiprocket/fetchOrUpdateShipmentStatus/{customer_order_id}");
        let response = self.call(BackendRequest::get(path)).await?;
        let body = match response {
            Value::Object(body) => body,
            other => {
                return Err(FetchError::InvalidResponse(format!(
                    "expected a shipment status object, got {other}"
                ))
                .into());
            }
        };
        let update = ShipmentStatusUpdate::from_object(body)
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        let merged = self
            .store
            .write()
            .await
            .merge_one(update.into_order(customer_order_id.clone()));
        if !merged {
            warn!("shipment status for an order not in the view");
        }
        Ok(merged)
    }

    /// Create or amend the carrier order for one order.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation`, without calling the backend, when the
    /// order is unknown, has no lines or is missing shipment fields; and
    /// `SyncError::Fetch` if the call fails.
    #[instrument(skip_all, fields(key = %key, mode = ?mode))]
    pub async fn submit_shipment(
        &self,
        key: &OrderKey,
        mode: ShipmentMode,
    ) -> Result<bool, SyncError> {
        let order = self.require_order(key).await?;
        validate_for_carrier(&order)?;
        let body = encode(&order)?;

        let _guard = self.begin(Operation::SubmitShipment)?;
        let response = self
            .call(BackendRequest::post(mode.path()).json(body))
            .await?;

        info!("shipment submitted");
        Ok(self.merge_single(response).await)
    }

    /// Confirm shipment of one order to the marketplace.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation`, without calling the backend, when the
    /// order is unknown or lacks lines, line numbers or a tracking number;
    /// and `SyncError::Fetch` if the call fails.
    #[instrument(skip_all, fields(purchase_order_id = %purchase_order_id))]
    pub async fn ship_in_walmart(
        &self,
        purchase_order_id: &PurchaseOrderId,
    ) -> Result<bool, SyncError> {
        let key = OrderKey::Purchase(purchase_order_id.clone());
        let order = self.require_order(&key).await?;
        let payload = WalmartShipment::for_order(&order)?;
        let body = serde_json::to_value(&payload).map_err(DecodeError::from)?;

        let _guard = self.begin(Operation::ShipInWalmart)?;
        let path = format!("/walmart/updateShipmentStatus/{purchase_order_id}");
        let response = self.call(BackendRequest::post(path).json(body)).await?;

        info!("shipment confirmed to marketplace");
        Ok(self.merge_single(response).await)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn begin(&self, operation: Operation) -> Result<InFlightGuard<'_>, SyncError> {
        self.in_flight.try_begin(operation).ok_or_else(|| {
            warn!(%operation, "rejected duplicate submission");
            SyncError::InFlight(operation)
        })
    }

    async fn call(&self, request: BackendRequest) -> Result<Value, FetchError> {
        send_authorized(&self.backend, &self.auth, request).await
    }

    async fn require_order(&self, key: &OrderKey) -> Result<Order, ValidationError> {
        self.order(key)
            .await
            .ok_or_else(|| ValidationError::UnknownOrder(key.to_string()))
    }

    async fn merge_list(&self, batch: DecodedBatch) -> MergeSummary {
        let decode_failures = batch.failures.len();
        log_failures(&batch);

        let merge = self.store.write().await.merge_many(batch.orders);
        if merge.has_unmatched() {
            warn!(
                unmatched = ?merge.unmatched,
                keyless = merge.keyless,
                "updates for orders not in the view"
            );
        }
        MergeSummary {
            merge,
            decode_failures,
        }
    }

    /// Merge a single returned order; anything else is ignored.
    async fn merge_single(&self, response: Value) -> bool {
        if !response.is_object() {
            return false;
        }
        match decode(response) {
            Ok(order) => {
                let key = order.key();
                let merged = self.store.write().await.merge_one(order);
                if !merged {
                    warn!(key = ?key, "returned order is not in the view");
                }
                merged
            }
            Err(error) => {
                warn!(%error, "could not decode returned order");
                false
            }
        }
    }
}

fn decode_list(response: Value) -> Result<DecodedBatch, FetchError> {
    match response {
        Value::Array(records) => Ok(decode_batch(records)),
        Value::Null => Ok(DecodedBatch::default()),
        other => Err(FetchError::InvalidResponse(format!(
            "expected a list of orders, got {}",
            json_kind(&other)
        ))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn log_failures(batch: &DecodedBatch) {
    for failure in &batch.failures {
        warn!(
            index = failure.index,
            key = ?failure.key,
            error = %failure.error,
            "dropping undecodable order record"
        );
    }
}
