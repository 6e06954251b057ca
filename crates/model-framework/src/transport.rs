//! # Transport Facade
//!
//! CRUD operations never talk to the network directly. They go through a [`Transport`], a
//! small async trait with a single `request` method, which is handed to each call
//! (`model.fetch(&transport)`). Implementations decide what a URL means:
//!
//! - [`HttpTransport`] joins it onto a base URL and performs a real HTTP call (feature `http`).
//! - [`MemoryTransport`](crate::memory::MemoryTransport) routes it to an in-process REST
//!   collection actor.
//! - [`MockTransport`](crate::mock::MockTransport) answers from a queue of expectations.
//!
//! Every implementation returns the decoded JSON body on success (`Value::Null` for an empty
//! body) and a [`TransportError`] otherwise. Non-2xx statuses are always errors.

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// HTTP verbs used by CRUD operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facade over whatever carries CRUD requests to a server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `method url` with an optional JSON body and returns the decoded response body.
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        (**self).request(method, url, body).await
    }
}

/// Joins a model URL (`users/1`) onto a base URL (`http://host/api/`).
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        format!("/{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// JSON-over-HTTP transport backed by `reqwest`.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Uses a preconfigured client (timeouts, default headers, auth).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let target = join_url(&self.base_url, url);
        let verb = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut req = self.http.request(verb, &target);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Network(format!("{method} {target}: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                method: method.to_string(),
                url: target,
                status,
                body,
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("{method} {target}: {e}")))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
