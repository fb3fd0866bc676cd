//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the full router around an
//! engine with mock stage processors, so the HTTP surface can be exercised
//! without data files or a listening socket.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use governor_core::{
    create_audit_system, AuditStore, BroadcastHub, Config, EngineConfig, InMemoryAuditStore,
    InMemoryTicketStore, PipelineEngine, StageKind, StaticTicketSource, Ticket, TicketStore,
    testing::MockStageProcessor,
};
use governor_server::state::AppState;

/// Re-export fixtures for test convenience
pub use governor_core::testing::fixtures;

/// Test fixture for API testing with mock processors.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_process_ticket() {
///     let fixture = TestFixture::with_tickets(vec![fixtures::iam_ticket("T1")]).await;
///
///     let response = fixture.post("/api/v1/tickets/T1/process").await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// The engine behind the router
    pub engine: PipelineEngine,
    /// Mock processor per automated stage
    pub mocks: HashMap<StageKind, Arc<MockStageProcessor>>,
    /// Run-log store, for asserting on written entries
    pub audit_store: Arc<dyn AuditStore>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with an empty ticket store.
    pub async fn new() -> Self {
        Self::with_config(Config::default(), Vec::new()).await
    }

    /// Create a fixture preloaded with `tickets`.
    pub async fn with_tickets(tickets: Vec<Ticket>) -> Self {
        Self::with_config(Config::default(), tickets).await
    }

    /// Create a fixture with custom configuration.
    pub async fn with_config(config: Config, tickets: Vec<Ticket>) -> Self {
        let ticket_store: Arc<dyn TicketStore> = Arc::new(InMemoryTicketStore::new());
        let audit_store: Arc<dyn AuditStore> = Arc::new(InMemoryAuditStore::with_capacity(
            config.pipeline.log_capacity,
        ));

        // Create audit system
        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);

        // Spawn audit writer
        tokio::spawn(audit_writer.run());

        let hub = Arc::new(BroadcastHub::new(
            Arc::clone(&ticket_store),
            config.pipeline.subscriber_buffer,
        ));
        let (registry, mocks) = fixtures::mock_registry();
        let engine = PipelineEngine::new(
            EngineConfig::from(&config),
            ticket_store,
            registry,
            hub,
            Some(audit_handle),
        );

        engine
            .ingest(&StaticTicketSource::new(tickets))
            .await
            .expect("Failed to load tickets");

        let state = Arc::new(AppState::new(
            config,
            engine.clone(),
            Arc::clone(&audit_store),
        ));

        // Create router
        let router = governor_server::api::create_router(state);

        Self {
            router,
            engine,
            mocks,
            audit_store,
        }
    }

    /// Serve the router on an ephemeral local port, for clients that need a
    /// real socket (WebSocket).
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        addr
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Fetch the raw body of a GET request as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Poll `GET /api/v1/tickets/{id}` until `predicate` holds.
    pub async fn wait_for_ticket<F>(&self, id: &str, predicate: F) -> Value
    where
        F: Fn(&Value) -> bool,
    {
        for _ in 0..200 {
            let response = self.get(&format!("/api/v1/tickets/{}", id)).await;
            if response.status == StatusCode::OK && predicate(&response.body) {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("ticket {} never reached the expected state", id);
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
