//! Integration tests for the seller console.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p seller-console-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `fetch_and_merge` - Loading feeds, decoding and authentication failures
//! - `sync_operations` - Shipping price, order sync, status buckets, in-flight flags
//! - `order_operations` - Field patches, email, shipment submission
//! - `shipglobal_booking` - Pickup addresses, invoice check, rates, order and draft
//! - `delivery_analytics` - Courier and geography performance queries
//! - `derived_metrics` - Profit, stats and status badges over a loaded view
//! - `http_backend` - The reqwest backend against a local socket
//!
//! Tests talk to a [`MockBackend`], which records each request and replies
//! from a per-route script.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::Method;
use secrecy::ExposeSecret;
use seller_console::{
    Analytics, Backend, BackendRequest, FetchError, OrderFeed, OrderView, ShipGlobal, StaticToken,
};
use serde_json::Value;
use tokio::sync::Notify;

/// Token every test view sends.
pub const TEST_TOKEN: &str = "test-session-token";

/// A request as the backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<String>,
}

type Reply = Result<Value, FetchError>;

#[derive(Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    replies: HashMap<(Method, String), VecDeque<Reply>>,
    gate: Option<Arc<Notify>>,
    route_gates: HashMap<(Method, String), Arc<Notify>>,
}

/// Recording backend double.
///
/// Routes without a scripted reply answer 404. Clones share state, so a test
/// keeps one handle and gives another to the view.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply for `method path`.
    pub fn reply(&self, method: Method, path: &str, body: Value) {
        self.enqueue(method, path, Ok(body));
    }

    /// Queue a failed reply for `method path`.
    pub fn fail(&self, method: Method, path: &str, error: FetchError) {
        self.enqueue(method, path, Err(error));
    }

    /// Hold every request until the returned handle is notified.
    #[must_use]
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().gate = Some(Arc::clone(&gate));
        gate
    }

    /// Hold requests to `method path` until the returned handle is notified.
    ///
    /// Lets a test release concurrent calls in a chosen order.
    #[must_use]
    pub fn hold_route(&self, method: Method, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock()
            .route_gates
            .insert((method, path.to_owned()), Arc::clone(&gate));
        gate
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn enqueue(&self, method: Method, path: &str, reply: Reply) {
        self.lock()
            .replies
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn send(&self, request: BackendRequest) -> Result<Value, FetchError> {
        let gate = {
            let mut state = self.lock();
            state.requests.push(RecordedRequest {
                method: request.method.clone(),
                path: request.path.clone(),
                query: request.query.clone(),
                body: request.body.clone(),
                token: request
                    .token
                    .as_ref()
                    .map(|token| token.expose_secret().to_owned()),
            });
            state.gate.clone().or_else(|| {
                state
                    .route_gates
                    .get(&(request.method.clone(), request.path.clone()))
                    .cloned()
            })
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.lock()
            .replies
            .get_mut(&(request.method, request.path.clone()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(FetchError::Status {
                    status: 404,
                    message: format!("no reply scripted for {}", request.path),
                })
            })
    }
}

/// A view over `backend` that sends [`TEST_TOKEN`].
#[must_use]
pub fn view(feed: OrderFeed, backend: &MockBackend) -> OrderView<MockBackend, StaticToken> {
    OrderView::new(feed, backend.clone(), StaticToken::new(TEST_TOKEN))
}

/// A view over `backend` with no credential.
#[must_use]
pub fn logged_out_view(
    feed: OrderFeed,
    backend: &MockBackend,
) -> OrderView<MockBackend, StaticToken> {
    OrderView::new(feed, backend.clone(), StaticToken::none())
}

/// A ShipGlobal client over `backend` that sends [`TEST_TOKEN`].
#[must_use]
pub fn shipglobal(backend: &MockBackend) -> ShipGlobal<MockBackend, StaticToken> {
    ShipGlobal::new(backend.clone(), StaticToken::new(TEST_TOKEN))
}

/// An analytics client over `backend` that sends [`TEST_TOKEN`].
#[must_use]
pub fn analytics(backend: &MockBackend) -> Analytics<MockBackend, StaticToken> {
    Analytics::new(backend.clone(), StaticToken::new(TEST_TOKEN))
}

/// Script `orders` as the reply to the feed request and load them.
///
/// # Panics
///
/// Panics if the fetch fails.
pub async fn loaded_view(
    feed: OrderFeed,
    backend: &MockBackend,
    orders: Value,
) -> OrderView<MockBackend, StaticToken> {
    backend.reply(Method::GET, feed.path(), orders);
    let view = view(feed, backend);
    if let Err(err) = view.fetch_orders().await {
        panic!("fetching the scripted feed failed: {err}");
    }
    view
}
