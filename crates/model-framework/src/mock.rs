//! # Mock Transport & Testing Guide
//!
//! [`MockTransport`] implements the same [`Transport`] API as the production transports but
//! answers entirely in memory from a queue of expectations. It lets you script server replies
//! for unit tests, enabling fast, deterministic testing of CRUD logic without any server.
//!
//! ## When to use Mocks vs the Memory Backend
//!
//! | Feature | MockTransport | MemoryBackend |
//! |---------|---------------|---------------|
//! | **Speed** | Instant (in-memory) | Fast (but involves tokio spawn) |
//! | **Determinism** | 100% Deterministic | Subject to scheduler |
//! | **State** | No real state (expectations) | Real REST collections |
//! | **Use Case** | Exact request/response assertions | Full CRUD round trips |
//! | **Error Injection** | Easy (`return_err`) | Limited (404 on missing items) |
//!
//! ```rust
//! use model_framework::mock::MockTransport;
//! use model_framework::transport::{Method, Transport};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect(Method::Get, "users/1").return_ok(json!({"id": "1"}));
//!
//!     let body = mock.request(Method::Get, "users/1", None).await.unwrap();
//!     assert_eq!(body["id"], "1");
//!     mock.verify();
//! }
//! ```
//!
//! ## Capturing Warnings
//!
//! Writes to undeclared root keys only log. [`capture_warnings`] installs a counting
//! subscriber for the duration of a closure so tests can assert how many `WARN` events a
//! piece of code emitted.

use crate::error::TransportError;
use crate::transport::{Method, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

struct Expectation {
    method: Method,
    url: String,
    response: Result<Value, TransportError>,
}

/// A request the mock has seen.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

/// A transport with expectation tracking for fluent testing.
///
/// Expectations are consumed in order. A request that does not match the next expectation
/// (or arrives when none is left) fails with [`TransportError::Unexpected`].
#[derive(Clone, Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockTransport {
    /// Creates a new mock with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects `method url` as the next request.
    pub fn expect(&self, method: Method, url: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            url: url.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            url: url.to_string(),
            body: body.cloned(),
        });

        let mut exps = self.expectations.lock().unwrap();
        match exps.front() {
            Some(next) if next.method == method && next.url == url => match exps.pop_front() {
                Some(expectation) => expectation.response,
                None => Err(TransportError::Unexpected(format!("{method} {url}"))),
            },
            Some(next) => Err(TransportError::Unexpected(format!(
                "{method} {url} (expected {} {})",
                next.method, next.url
            ))),
            None => Err(TransportError::Unexpected(format!("{method} {url}"))),
        }
    }
}

/// Builder for a single expectation.
pub struct ExpectationBuilder {
    method: Method,
    url: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ExpectationBuilder {
    /// Sets the expectation to return a successful body.
    pub fn return_ok(self, body: Value) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            method: self.method,
            url: self.url,
            response: Ok(body),
        });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: TransportError) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            method: self.method,
            url: self.url,
            response: Err(error),
        });
    }

    /// Shorthand for a non-2xx reply.
    pub fn return_status(self, status: u16, body: impl Into<String>) {
        let error = TransportError::Status {
            method: self.method.to_string(),
            url: self.url.clone(),
            status,
            body: body.into(),
        };
        self.return_err(error);
    }
}

// =============================================================================
// WARNING CAPTURE
// =============================================================================

#[derive(Clone, Default)]
struct WarningCounter {
    count: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for WarningCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs `f` under a subscriber that counts `WARN` events on the current thread.
pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, usize) {
    let counter = WarningCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, counter.count.load(Ordering::SeqCst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_transport_with_expectations() {
        let mock = MockTransport::new();
        mock.expect(Method::Post, "users").return_ok(json!({"id": "1"}));
        mock.expect(Method::Delete, "users/1").return_ok(Value::Null);

        let created = mock
            .request(Method::Post, "users", Some(&json!({"name": "a"})))
            .await
            .unwrap();
        assert_eq!(created["id"], "1");
        mock.request(Method::Delete, "users/1", None).await.unwrap();

        mock.verify();
        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].body, Some(json!({"name": "a"})));
    }

    #[tokio::test]
    async fn test_unexpected_request() {
        let mock = MockTransport::new();
        mock.expect(Method::Get, "users/1").return_ok(json!({}));

        let err = mock.request(Method::Get, "users/2", None).await.unwrap_err();
        assert!(matches!(err, TransportError::Unexpected(_)));
        // mismatches do not consume the expectation
        assert!(mock.request(Method::Get, "users/1", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_status_error() {
        let mock = MockTransport::new();
        mock.expect(Method::Get, "users/9").return_status(404, "not found");
        let err = mock.request(Method::Get, "users/9", None).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met")]
    fn test_verify_panics_on_leftovers() {
        let mock = MockTransport::new();
        mock.expect(Method::Get, "users").return_ok(json!([]));
        mock.verify();
    }

    #[test]
    fn test_capture_warnings_counts_only_warn() {
        let ((), count) = capture_warnings(|| {
            tracing::info!("ignored");
            tracing::warn!("counted");
            tracing::warn!("counted again");
        });
        assert_eq!(count, 2);
    }
}
