//! # TypeAdapter Trait
//!
//! The `TypeAdapter` trait is the contract every custom field type implements to control
//! how values enter a model (`coerce`, the ingress side) and how they leave it (`render`,
//! the egress side). The schema engine never sees the adapter type directly: it works with
//! [`AdapterSpec`] descriptors and boxed [`AdapterInstance`]s so that one schema can mix any
//! number of adapter types.
//!
//! # Architecture Note
//! We use an **Associated Type** (`type Value`) so each adapter keeps its internal
//! representation strongly typed (a `DateTime<Utc>`, a validated id, ...) while the model
//! stores JSON everywhere else. [`Adapted<A>`] is the per-field instance wrapping that value
//! together with the optional extraction key.
//!
//! # Extraction Keys
//! Some sources wrap primitives in an envelope such as `{"$date": "2020-01-01T00:00:00Z"}`.
//! When an adapter instance carries an extraction key and the incoming value is an object
//! containing that key, the nested value is handed to `coerce` instead of the envelope.

use crate::error::{AdapterError, ModelError};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::marker::PhantomData;

/// Trait that any custom field type must implement to coerce model values.
///
/// # Example
/// ```rust
/// use model_framework::adapter::TypeAdapter;
/// use model_framework::error::AdapterError;
/// use serde_json::{json, Value};
///
/// struct Upper;
///
/// impl TypeAdapter for Upper {
///     type Value = String;
///     const NAME: &'static str = "Upper";
///
///     fn coerce(raw: &Value) -> Result<String, AdapterError> {
///         raw.as_str()
///             .map(str::to_uppercase)
///             .ok_or_else(|| AdapterError::new(Self::NAME, raw, "expected a string"))
///     }
///
///     fn render(value: &String) -> Value {
///         json!(value)
///     }
/// }
/// ```
pub trait TypeAdapter: Send + Sync + 'static {
    /// The internal representation stored in the field.
    type Value: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Name used in schema descriptions and diagnostics.
    const NAME: &'static str;

    /// Validate and transform an incoming value. Must fail instead of guessing.
    fn coerce(raw: &Value) -> Result<Self::Value, AdapterError>;

    /// Produce the externally visible (serialized) representation.
    fn render(value: &Self::Value) -> Value;
}

/// Object-safe view of an adapter instance held in a model's state tree.
pub trait AdapterInstance: Debug + Send + Sync {
    /// The adapter's [`TypeAdapter::NAME`].
    fn type_name(&self) -> &'static str;

    /// Ingress (`in`): replaces the internal value on success, leaves it untouched on failure.
    fn input(&mut self, value: &Value) -> Result<(), AdapterError>;

    /// Egress (`out`): `None` while the internal value is absent.
    fn output(&self) -> Option<Value>;

    fn clone_box(&self) -> Box<dyn AdapterInstance>;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn AdapterInstance> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A type adapter instance: one field's coerced value plus its extraction key.
pub struct Adapted<A: TypeAdapter> {
    value: Option<A::Value>,
    extraction_key: Option<String>,
    _adapter: PhantomData<fn() -> A>,
}

impl<A: TypeAdapter> Adapted<A> {
    /// Creates an instance with no value.
    pub fn new(extraction_key: Option<String>) -> Self {
        Self {
            value: None,
            extraction_key,
            _adapter: PhantomData,
        }
    }

    /// Creates an instance and runs `input` on `raw`.
    pub fn with_value(raw: &Value, extraction_key: Option<String>) -> Result<Self, AdapterError> {
        let mut adapted = Self::new(extraction_key);
        adapted.input(raw)?;
        Ok(adapted)
    }

    /// The coerced internal value, if any.
    pub fn get(&self) -> Option<&A::Value> {
        self.value.as_ref()
    }

    pub fn extraction_key(&self) -> Option<&str> {
        self.extraction_key.as_deref()
    }

    fn unwrap_envelope<'v>(&self, value: &'v Value) -> &'v Value {
        match (&self.extraction_key, value) {
            (Some(key), Value::Object(map)) => map.get(key).unwrap_or(value),
            _ => value,
        }
    }
}

impl<A: TypeAdapter> Clone for Adapted<A> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            extraction_key: self.extraction_key.clone(),
            _adapter: PhantomData,
        }
    }
}

impl<A: TypeAdapter> Debug for Adapted<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(A::NAME)
            .field("value", &self.value)
            .field("extraction_key", &self.extraction_key)
            .finish()
    }
}

impl<A: TypeAdapter> AdapterInstance for Adapted<A> {
    fn type_name(&self) -> &'static str {
        A::NAME
    }

    fn input(&mut self, value: &Value) -> Result<(), AdapterError> {
        let raw = self.unwrap_envelope(value);
        if raw.is_null() {
            self.value = None;
            return Ok(());
        }
        self.value = Some(A::coerce(raw)?);
        Ok(())
    }

    fn output(&self) -> Option<Value> {
        self.value.as_ref().map(A::render)
    }

    fn clone_box(&self) -> Box<dyn AdapterInstance> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn build_adapter<A: TypeAdapter>(extraction_key: Option<String>) -> Box<dyn AdapterInstance> {
    Box::new(Adapted::<A>::new(extraction_key))
}

/// Schema-side descriptor that creates fresh [`AdapterInstance`]s for a field.
#[derive(Clone)]
pub struct AdapterSpec {
    name: &'static str,
    extraction_key: Option<String>,
    build: fn(Option<String>) -> Box<dyn AdapterInstance>,
}

impl AdapterSpec {
    pub fn of<A: TypeAdapter>() -> Self {
        Self {
            name: A::NAME,
            extraction_key: None,
            build: build_adapter::<A>,
        }
    }

    /// Read from `key` when the incoming value is an object containing it.
    pub fn with_extraction_key(mut self, key: impl Into<String>) -> Self {
        self.extraction_key = Some(key.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn extraction_key(&self) -> Option<&str> {
        self.extraction_key.as_deref()
    }

    /// Builds an instance for `field` and feeds it `raw` (absent when `None`).
    pub fn instantiate(
        &self,
        field: &str,
        raw: Option<&Value>,
    ) -> Result<Box<dyn AdapterInstance>, ModelError> {
        let mut instance = (self.build)(self.extraction_key.clone());
        if let Some(raw) = raw {
            instance
                .input(raw)
                .map_err(|e| ModelError::type_error(field, e))?;
        }
        Ok(instance)
    }
}

impl Debug for AdapterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterSpec")
            .field("name", &self.name)
            .field("extraction_key", &self.extraction_key)
            .finish()
    }
}

/// Lookup table from type names to adapter specs, used when compiling JSON schema descriptions.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    specs: HashMap<String, AdapterSpec>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `A` under its [`TypeAdapter::NAME`].
    pub fn register<A: TypeAdapter>(mut self) -> Self {
        self.specs.insert(A::NAME.to_string(), AdapterSpec::of::<A>());
        self
    }

    /// Registers an [`AdapterSpec`] under an explicit name (e.g. one carrying an extraction key).
    pub fn register_spec(mut self, name: impl Into<String>, spec: AdapterSpec) -> Self {
        self.specs.insert(name.into(), spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AdapterSpec> {
        self.specs.get(name)
    }
}
