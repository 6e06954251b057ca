//! # Framework Errors
//!
//! This module defines the error types used throughout the model framework.
//! Every fallible operation returns [`ModelError`], whose variants map onto the
//! three failure kinds a caller has to tell apart:
//!
//! - **Type** - a type adapter rejected a value during construction, assignment or merge.
//! - **Request** - the transport reported a non-success status or a network failure.
//! - **InvalidState** - the operation makes no sense for the model's current identity
//!   (e.g. `destroy()` on a model that was never saved).
//!
//! Coercion and state errors abort the operation that triggered them and leave
//! the model exactly as it was. Writes to undeclared root keys are not errors:
//! they degrade to a warning (see [`crate::state::warn_on_unknown_root_key`]).

use thiserror::Error;

/// Raised by a [`TypeAdapter`](crate::adapter::TypeAdapter) when `coerce` refuses a value.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{adapter} rejected {value}: {reason}")]
pub struct AdapterError {
    pub adapter: &'static str,
    pub value: String,
    pub reason: String,
}

impl AdapterError {
    pub fn new(adapter: &'static str, value: &serde_json::Value, reason: impl Into<String>) -> Self {
        Self {
            adapter,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },
    #[error("network failure: {0}")]
    Network(String),
    #[error("failed to decode response body: {0}")]
    Decode(String),
    #[error("unexpected request: {0}")]
    Unexpected(String),
}

/// Problems found while compiling a schema description.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("schema description for `{0}` must be an object")]
    NotAnObject(String),
    #[error("field `{0}` has no `type`")]
    MissingType(String),
    #[error("unknown type `{type_name}` for field `{field}`")]
    UnknownType { field: String, type_name: String },
    #[error("object field `{0}` must declare `properties`")]
    MissingProperties(String),
    #[error("array field `{0}` must declare `items`")]
    MissingItems(String),
}

/// Errors surfaced by models, the schema engine and CRUD operations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("type error on `{field}`: {source}")]
    Type {
        field: String,
        #[source]
        source: AdapterError,
    },
    #[error("request error: {0}")]
    Request(#[from] TransportError),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl ModelError {
    pub(crate) fn type_error(field: &str, source: AdapterError) -> Self {
        ModelError::Type {
            field: field.to_string(),
            source,
        }
    }

    /// True for adapter rejections.
    pub fn is_type_error(&self) -> bool {
        matches!(self, ModelError::Type { .. })
    }

    /// True for transport failures.
    pub fn is_request_error(&self) -> bool {
        matches!(self, ModelError::Request(_))
    }

    /// True for operations attempted in the wrong lifecycle state.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, ModelError::InvalidState(_))
    }
}
