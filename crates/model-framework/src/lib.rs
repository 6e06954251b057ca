//! # Model Framework
//!
//! Schema-driven data models for REST resources. A model couples a declarative field
//! schema with CRUD operations over an injected transport, so application code works with
//! typed, defaulted state and never hand-builds URLs.
//!
//! ## Core Components
//!
//! - **[adapter]**: the [`TypeAdapter`] contract for custom field types (`coerce` on the way
//!   in, `render` on the way out).
//! - **[schema]** / **[state]**: the field description and the engine that turns supplied
//!   data into a fully defaulted state tree.
//! - **[model]**: [`ModelDefinition`] and [`Model`], with identity (`isNew`), derived
//!   endpoints (`basePath`, `urlRoot`, `url`), `reset` and `to_json`.
//! - **[crud]**: `fetch`, `save` and `destroy` over any [`Transport`].
//! - **[memory]**: an in-process REST backend actor, handy for demos and tests.
//! - **[binding]**: the plugin and per-component [`ModelScope`] that resets models on teardown.
//! - **[typed]**: the [`TypedModel`] trait for domain wrappers.
//!
//! ## Quick Start
//!
//! ```rust
//! use model_framework::{MemoryBackend, Model, ModelDefinition, ModelOptions, SaveOptions, Schema, SchemaNode};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let user = ModelDefinition::builder(
//!         "user",
//!         Schema::new()
//!             .field("id", SchemaNode::string())
//!             .field("email", SchemaNode::string()),
//!     )
//!     .build();
//!
//!     let (backend, transport) = MemoryBackend::new(10);
//!     tokio::spawn(backend.run());
//!
//!     let mut alice = Model::new(&user, json!({"email": "alice@example.com"}), ModelOptions::default()).unwrap();
//!     assert!(alice.is_new());
//!
//!     alice.save(&transport, None, SaveOptions::default()).await.unwrap();
//!     assert_eq!(alice.url(), "users/1");
//! }
//! ```
//!
//! ## Testing
//!
//! See [`mock`] for a scripted transport and a helper that counts logged warnings.

pub mod adapter;
pub mod binding;
pub mod config;
pub mod crud;
pub mod error;
pub mod memory;
pub mod mock;
pub mod model;
pub mod schema;
pub mod state;
pub mod tracing;
pub mod transport;
pub mod typed;

pub use adapter::{Adapted, AdapterInstance, AdapterRegistry, AdapterSpec, TypeAdapter};
pub use binding::{ModelScope, ModelsOption, Plugin};
pub use config::{ModelConfig, ModelOptions, PluginOptions, SaveOptions};
pub use error::{AdapterError, ModelError, SchemaError, TransportError};
pub use memory::{MemoryBackend, MemoryTransport};
pub use model::{Model, ModelDefinition};
pub use schema::{FieldType, Primitive, Schema, SchemaNode};
pub use state::{FieldValue, State};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{Method, Transport};
pub use typed::TypedModel;
