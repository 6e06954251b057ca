//! # In-Memory REST Backend
//!
//! [`MemoryBackend`] is a tiny REST server that runs as a tokio task and keeps JSON
//! collections in memory. It is the "server" half of an actor: it owns the store and
//! processes requests sequentially from an mpsc channel, so the store needs no locks.
//! [`MemoryTransport`] is the cloneable "client" half and implements [`Transport`].
//!
//! URL conventions follow the model endpoints:
//!
//! | Request               | Effect                                                   |
//! |-----------------------|----------------------------------------------------------|
//! | `POST collection`     | assigns the next id, stores the body, returns it         |
//! | `GET collection`      | every item of the collection, in id order                |
//! | `GET collection/id`   | the item                                                 |
//! | `PUT collection/id`   | replaces the item, keeping its id, returns it            |
//! | `DELETE collection/id`| removes the item, returns `null`                         |
//!
//! Unknown collections and items answer `404`; non-object bodies answer `400`.
//!
//! ```rust
//! use model_framework::memory::MemoryBackend;
//! use model_framework::transport::{Method, Transport};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (backend, transport) = MemoryBackend::new(10);
//!     tokio::spawn(backend.run());
//!
//!     let created = transport
//!         .request(Method::Post, "users", Some(&json!({"name": "Ann"})))
//!         .await
//!         .unwrap();
//!     assert_eq!(created["id"], "1");
//! }
//! ```

use crate::error::TransportError;
use crate::transport::{Method, Transport};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Message sent from [`MemoryTransport`] to [`MemoryBackend`].
#[derive(Debug)]
pub struct BackendRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub respond_to: oneshot::Sender<Result<Value, TransportError>>,
}

type Collection = BTreeMap<u64, Value>;

/// The in-process REST server.
pub struct MemoryBackend {
    receiver: mpsc::Receiver<BackendRequest>,
    store: HashMap<String, Collection>,
    next_id: u64,
}

impl MemoryBackend {
    /// Creates the backend and its transport.
    ///
    /// `buffer_size` is the request channel capacity; callers wait when it is full.
    pub fn new(buffer_size: usize) -> (Self, MemoryTransport) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let backend = Self {
            receiver,
            store: HashMap::new(),
            next_id: 1,
        };
        (backend, MemoryTransport { sender })
    }

    /// Processes requests until every transport has been dropped.
    pub async fn run(mut self) {
        info!("Memory backend started");
        while let Some(BackendRequest {
            method,
            path,
            body,
            respond_to,
        }) = self.receiver.recv().await
        {
            let result = self.handle(method, &path, body);
            match &result {
                Ok(_) => debug!(%method, %path, "Handled"),
                Err(e) => warn!(%method, %path, error = %e, "Rejected"),
            }
            let _ = respond_to.send(result);
        }
        let size: usize = self.store.values().map(BTreeMap::len).sum();
        info!(collections = self.store.len(), size, "Memory backend shutdown");
    }

    fn handle(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let path = path.trim_matches('/');
        match method {
            Method::Post => {
                let mut item = object_body(method, path, body)?;
                let id = self.next_id;
                self.next_id += 1;
                item.insert("id".into(), Value::String(id.to_string()));
                let item = Value::Object(item);
                self.store
                    .entry(path.to_string())
                    .or_default()
                    .insert(id, item.clone());
                info!(collection = path, id, "Created");
                Ok(item)
            }
            Method::Get => {
                if let Some(collection) = self.store.get(path) {
                    return Ok(Value::Array(collection.values().cloned().collect()));
                }
                let (collection, id) = split_item(method, path)?;
                self.store
                    .get(collection)
                    .and_then(|items| items.get(&id))
                    .cloned()
                    .ok_or_else(|| not_found(method, path))
            }
            Method::Put => {
                let (collection, id) = split_item(method, path)?;
                let mut item = object_body(method, path, body)?;
                let slot = self
                    .store
                    .get_mut(collection)
                    .and_then(|items| items.get_mut(&id))
                    .ok_or_else(|| not_found(method, path))?;
                item.insert("id".into(), Value::String(id.to_string()));
                *slot = Value::Object(item);
                info!(collection, id, "Replaced");
                Ok(slot.clone())
            }
            Method::Delete => {
                let (collection, id) = split_item(method, path)?;
                self.store
                    .get_mut(collection)
                    .and_then(|items| items.remove(&id))
                    .ok_or_else(|| not_found(method, path))?;
                info!(collection, id, "Deleted");
                Ok(Value::Null)
            }
        }
    }
}

fn status(method: Method, path: &str, status: u16, body: &str) -> TransportError {
    TransportError::Status {
        method: method.to_string(),
        url: path.to_string(),
        status,
        body: body.to_string(),
    }
}

fn not_found(method: Method, path: &str) -> TransportError {
    status(method, path, 404, "not found")
}

fn split_item(method: Method, path: &str) -> Result<(&str, u64), TransportError> {
    path.rsplit_once('/')
        .and_then(|(collection, id)| id.parse().ok().map(|id| (collection, id)))
        .ok_or_else(|| not_found(method, path))
}

fn object_body(
    method: Method,
    path: &str,
    body: Option<Value>,
) -> Result<Map<String, Value>, TransportError> {
    match body {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(status(method, path, 400, "expected a JSON object body")),
    }
}

/// Cloneable handle that sends requests to a [`MemoryBackend`].
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    sender: mpsc::Sender<BackendRequest>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendRequest {
                method,
                path: url.to_string(),
                body: body.cloned(),
                respond_to,
            })
            .await
            .map_err(|_| TransportError::Network("memory backend closed".into()))?;
        response
            .await
            .map_err(|_| TransportError::Network("memory backend dropped the request".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spawn_backend() -> MemoryTransport {
        let (backend, transport) = MemoryBackend::new(10);
        tokio::spawn(backend.run());
        transport
    }

    #[tokio::test]
    async fn test_crud_round() {
        let transport = spawn_backend();

        let created = transport
            .request(Method::Post, "users", Some(&json!({"name": "Ann"})))
            .await
            .unwrap();
        assert_eq!(created, json!({"id": "1", "name": "Ann"}));

        let replaced = transport
            .request(Method::Put, "users/1", Some(&json!({"name": "Bo", "id": "x"})))
            .await
            .unwrap();
        assert_eq!(replaced, json!({"id": "1", "name": "Bo"}));

        let listed = transport.request(Method::Get, "/users/", None).await.unwrap();
        assert_eq!(listed, json!([{"id": "1", "name": "Bo"}]));

        transport.request(Method::Delete, "users/1", None).await.unwrap();
        let err = transport.request(Method::Get, "users/1", None).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_ids_are_unique_across_collections() {
        let transport = spawn_backend();
        let a = transport
            .request(Method::Post, "users", Some(&json!({})))
            .await
            .unwrap();
        let b = transport
            .request(Method::Post, "posts/1/comments", Some(&json!({})))
            .await
            .unwrap();
        assert_eq!(a["id"], "1");
        assert_eq!(b["id"], "2");

        let nested = transport
            .request(Method::Get, "posts/1/comments/2", None)
            .await
            .unwrap();
        assert_eq!(nested["id"], "2");
    }

    #[tokio::test]
    async fn test_unknown_resources_are_not_found() {
        let transport = spawn_backend();
        for (method, path) in [
            (Method::Get, "users"),
            (Method::Get, "users/1"),
            (Method::Delete, "users/1"),
            (Method::Get, "users/abc"),
        ] {
            let err = transport.request(method, path, None).await.unwrap_err();
            assert!(matches!(err, TransportError::Status { status: 404, .. }), "{method} {path}");
        }
        let err = transport
            .request(Method::Put, "users/1", Some(&json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_non_object_body_is_bad_request() {
        let transport = spawn_backend();
        let err = transport
            .request(Method::Post, "users", Some(&json!([1, 2])))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_closed_backend_is_a_network_error() {
        let (backend, transport) = MemoryBackend::new(1);
        drop(backend);
        let err = transport.request(Method::Get, "users", None).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
