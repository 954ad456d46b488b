//! Integration tests for MD Estimator.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p md-estimator-integration-tests
//! ```
//!
//! Every test starts its own [`MockCatalog`]: an in-process axum server on
//! `127.0.0.1:0` that speaks the catalog service's `/api/items` protocol. No
//! external services are needed.
//!
//! # Test Categories
//!
//! - `catalog_sync` - Fetch envelopes, mutations and refetch behaviour
//! - `delete_errors` - Delete failure classification
//! - `estimate_flow` - Cart snapshots, session and export end to end

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use md_estimator::{CatalogConfig, Estimator, HttpCatalogGateway, SessionStore, UserDirectory};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Shape the mock wraps its item list in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `[...]`
    Bare,
    /// `{ "data": [...] }`
    Data,
    /// `{ "items": [...] }`
    Items,
}

/// One request received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
}

/// A canned delete response.
#[derive(Debug, Clone)]
struct ScriptedResponse {
    status: StatusCode,
    body: String,
    json: bool,
}

#[derive(Clone)]
struct MockState {
    inner: Arc<MockInner>,
}

struct MockInner {
    records: Mutex<Vec<Value>>,
    next_id: AtomicU64,
    envelope: Mutex<Envelope>,
    hits: Mutex<Vec<Hit>>,
    delete_script: Mutex<VecDeque<ScriptedResponse>>,
    fail_fetch: AtomicBool,
}

/// In-process catalog service.
pub struct MockCatalog {
    addr: SocketAddr,
    state: MockState,
    server: JoinHandle<()>,
}

impl MockCatalog {
    /// Start an empty catalog.
    pub async fn start() -> Self {
        Self::with_records(Vec::new()).await
    }

    /// Start a catalog pre-filled with raw records.
    pub async fn with_records(records: Vec<Value>) -> Self {
        let state = MockState {
            inner: Arc::new(MockInner {
                records: Mutex::new(records),
                next_id: AtomicU64::new(1000),
                envelope: Mutex::new(Envelope::Bare),
                hits: Mutex::new(Vec::new()),
                delete_script: Mutex::new(VecDeque::new()),
                fail_fetch: AtomicBool::new(false),
            }),
        };

        let app = Router::new()
            .route("/api/items", get(list_items).post(create_item))
            .route("/api/items/{id}", axum::routing::put(update_item).delete(delete_item))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock catalog");
        let addr = listener.local_addr().expect("Mock catalog has no address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock catalog server failed");
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL to configure the estimator with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Catalog configuration pointing at this mock.
    #[must_use]
    pub fn config(&self) -> CatalogConfig {
        CatalogConfig::new(&self.base_url()).expect("Mock base URL is valid")
    }

    /// Estimator pointing at this mock, storing its session under `dir`.
    #[must_use]
    pub fn estimator(&self, dir: &Path) -> Estimator {
        estimator_for(&self.config(), dir)
    }

    /// Change the list envelope.
    pub fn set_envelope(&self, envelope: Envelope) {
        *self.state.inner.envelope.lock().expect("lock") = envelope;
    }

    /// Make list requests answer 503.
    pub fn fail_fetch(&self, fail: bool) {
        self.state.inner.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Answer the next delete with a JSON body.
    pub fn script_delete_json(&self, status: u16, body: &Value) {
        self.script_delete(status, body.to_string(), true);
    }

    /// Answer the next delete with a plain-text body.
    pub fn script_delete_text(&self, status: u16, body: &str) {
        self.script_delete(status, body.to_string(), false);
    }

    fn script_delete(&self, status: u16, body: String, json: bool) {
        self.state
            .inner
            .delete_script
            .lock()
            .expect("lock")
            .push_back(ScriptedResponse {
                status: StatusCode::from_u16(status).expect("valid status"),
                body,
                json,
            });
    }

    /// Replace a record server-side, as another client would.
    pub fn put_record(&self, record: Value) {
        let mut records = self.state.inner.records.lock().expect("lock");
        let id = record_id(&record);
        match records.iter_mut().find(|r| record_id(r) == id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Current raw records.
    #[must_use]
    pub fn records(&self) -> Vec<Value> {
        self.state.inner.records.lock().expect("lock").clone()
    }

    /// Every request received so far.
    #[must_use]
    pub fn hits(&self) -> Vec<Hit> {
        self.state.inner.hits.lock().expect("lock").clone()
    }

    /// Number of requests received with `method`.
    #[must_use]
    pub fn hit_count(&self, method: &Method) -> usize {
        self.hits().iter().filter(|hit| &hit.method == method).count()
    }
}

impl Drop for MockCatalog {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Estimator for an arbitrary catalog configuration.
#[must_use]
pub fn estimator_for(config: &CatalogConfig, dir: &Path) -> Estimator {
    let gateway = HttpCatalogGateway::new(config).expect("Failed to build gateway");
    Estimator::new(
        gateway,
        SessionStore::new(dir.join("session.json")),
        UserDirectory::default(),
    )
}

/// Base URL of a port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let addr = listener.local_addr().expect("Probe listener has no address");
    drop(listener);
    format!("http://{addr}/api")
}

// ============================================================================
// Handlers
// ============================================================================

fn record_id(record: &Value) -> String {
    match record.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn record_hit(state: &MockState, method: Method, path: String, headers: &HeaderMap) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    state.inner.hits.lock().expect("lock").push(Hit {
        method,
        path,
        authorization,
    });
}

async fn list_items(State(state): State<MockState>, headers: HeaderMap) -> Response {
    record_hit(&state, Method::GET, "/api/items".to_string(), &headers);

    if state.inner.fail_fetch.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response();
    }

    let records = Value::Array(state.inner.records.lock().expect("lock").clone());
    let body = match *state.inner.envelope.lock().expect("lock") {
        Envelope::Bare => records,
        Envelope::Data => json!({ "data": records }),
        Envelope::Items => json!({ "items": records }),
    };
    Json(body).into_response()
}

async fn create_item(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_hit(&state, Method::POST, "/api/items".to_string(), &headers);

    let id = state.inner.next_id.fetch_add(1, Ordering::SeqCst);
    let record = json!({ "id": id, "name": body["name"], "price": body["price"] });
    state.inner.records.lock().expect("lock").push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn update_item(
    State(state): State<MockState>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_hit(&state, Method::PUT, format!("/api/items/{id}"), &headers);

    let mut records = state.inner.records.lock().expect("lock");
    let Some(record) = records.iter_mut().find(|r| record_id(r) == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))).into_response();
    };
    record["name"] = body["name"].clone();
    record["price"] = body["price"].clone();
    Json(record.clone()).into_response()
}

async fn delete_item(
    State(state): State<MockState>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    record_hit(&state, Method::DELETE, format!("/api/items/{id}"), &headers);

    let scripted = state.inner.delete_script.lock().expect("lock").pop_front();
    if let Some(scripted) = scripted {
        let content_type = if scripted.json {
            "application/json"
        } else {
            "text/plain"
        };
        return (
            scripted.status,
            [(header::CONTENT_TYPE, content_type)],
            scripted.body,
        )
            .into_response();
    }

    let mut records = state.inner.records.lock().expect("lock");
    let before = records.len();
    records.retain(|r| record_id(r) != id);
    if records.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))).into_response();
    }
    Json(json!({ "success": true })).into_response()
}
