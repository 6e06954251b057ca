//! # Schema Engine
//!
//! Walks a [`Schema`] and produces the initial state tree of a model, routing every value
//! through the coercion rules of its node:
//!
//! - **Primitive**: supplied value when present and of the right JSON type, else the node's
//!   `default`, else the type's empty value (`""`, `0`, `false`).
//! - **Object**: recurse into `properties` with the matching sub-object (or the node's
//!   object default, or nothing).
//! - **Array**: every supplied element goes through the `items` rule; absent means empty.
//! - **Adapter**: a fresh [`AdapterInstance`](crate::adapter::AdapterInstance) fed with the
//!   supplied value (or the default) through `input`.
//!
//! JSON `null` is treated as "not supplied" everywhere.

use crate::adapter::AdapterInstance;
use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::schema::{FieldType, Schema, SchemaNode};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Root-level field names declared by a schema.
pub type ApprovedKeys = BTreeSet<String>;

/// Runtime value of one field.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Scalar(Value),
    Object(State),
    Array(Vec<FieldValue>),
    Adapter(Box<dyn AdapterInstance>),
}

impl FieldValue {
    /// Serialized form; adapters emit `out()`, absent adapters emit `null`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Scalar(value) => value.clone(),
            FieldValue::Object(state) => state.to_json(),
            FieldValue::Array(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Adapter(instance) => instance.output().unwrap_or(Value::Null),
        }
    }

    pub fn as_adapter(&self) -> Option<&dyn AdapterInstance> {
        match self {
            FieldValue::Adapter(instance) => Some(instance.as_ref()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&State> {
        match self {
            FieldValue::Object(state) => Some(state),
            _ => None,
        }
    }
}

/// A (possibly nested) map of field values.
#[derive(Debug, Clone, Default)]
pub struct State {
    fields: BTreeMap<String, FieldValue>,
}

impl State {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(name)
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Looks up a dotted path such as `address.city`.
    pub fn get_path(&self, path: &str) -> Option<&FieldValue> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// Builds the initial state tree for `schema` from `supplied` data.
///
/// Returns the state together with the schema's approved root keys. Keys in `supplied` that
/// the schema does not declare are ignored here; the model decides what to do with them.
pub fn build_initial_state(
    schema: &Schema,
    supplied: &Value,
) -> Result<(State, ApprovedKeys), ModelError> {
    let state = build_state(schema, supplied.as_object(), "")?;
    let approved = schema.keys().map(str::to_string).collect();
    Ok((state, approved))
}

fn build_state(
    schema: &Schema,
    supplied: Option<&Map<String, Value>>,
    prefix: &str,
) -> Result<State, ModelError> {
    let mut state = State::default();
    for (name, node) in schema.iter() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        let value = build_field(&path, node, supplied.and_then(|m| m.get(name)))?;
        state.insert(name, value);
    }
    Ok(state)
}

/// Applies a node's build rule to one supplied value.
pub fn build_field(
    path: &str,
    node: &SchemaNode,
    supplied: Option<&Value>,
) -> Result<FieldValue, ModelError> {
    let supplied = supplied.filter(|v| !v.is_null());
    let default = node.default.as_ref().filter(|v| !v.is_null());

    match &node.kind {
        FieldType::Primitive(primitive) => {
            if let Some(value) = supplied {
                if primitive.accepts(value) {
                    return Ok(FieldValue::Scalar(value.clone()));
                }
                debug!(field = path, ?primitive, %value, "Type mismatch, falling back to default");
            }
            Ok(FieldValue::Scalar(
                default.cloned().unwrap_or_else(|| primitive.zero()),
            ))
        }
        FieldType::Object(properties) => {
            let nested = match supplied {
                Some(Value::Object(map)) => Some(map),
                Some(other) => {
                    debug!(field = path, value = %other, "Expected an object, falling back to default");
                    default.and_then(Value::as_object)
                }
                None => default.and_then(Value::as_object),
            };
            Ok(FieldValue::Object(build_state(properties, nested, path)?))
        }
        FieldType::Array(items) => {
            let elements = match supplied {
                Some(Value::Array(elements)) => Some(elements),
                Some(other) => {
                    debug!(field = path, value = %other, "Expected an array, falling back to default");
                    default.and_then(Value::as_array)
                }
                None => default.and_then(Value::as_array),
            };
            let built = elements
                .map(|elements| {
                    elements
                        .iter()
                        .enumerate()
                        .map(|(i, element)| build_field(&format!("{path}[{i}]"), items, Some(element)))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?
                .unwrap_or_default();
            Ok(FieldValue::Array(built))
        }
        FieldType::Adapter(spec) => Ok(FieldValue::Adapter(
            spec.instantiate(path, supplied.or(default))?,
        )),
    }
}

/// Writes `value` into an existing field slot.
///
/// Adapter fields route through `input` on their existing instance, so a rejected value
/// leaves the slot untouched. A value of the wrong JSON kind for a primitive, object or
/// array field is logged and skipped; the slot keeps its current value. `null` rebuilds the
/// field from its defaults, and anything else is rebuilt with [`build_field`].
pub(crate) fn assign_field(
    slot: &mut FieldValue,
    path: &str,
    node: &SchemaNode,
    value: &Value,
) -> Result<(), ModelError> {
    let rebuilt = match (&mut *slot, &node.kind) {
        (FieldValue::Adapter(instance), FieldType::Adapter(_)) => {
            return instance
                .input(value)
                .map_err(|e| ModelError::type_error(path, e));
        }
        _ if value.is_null() => Some(build_field(path, node, None)?),
        (_, FieldType::Primitive(primitive)) => primitive.convert(value).map(FieldValue::Scalar),
        (_, FieldType::Object(_)) if !value.is_object() => None,
        (_, FieldType::Array(_)) if !value.is_array() => None,
        _ => Some(build_field(path, node, Some(value))?),
    };
    match rebuilt {
        Some(field) => *slot = field,
        None => warn!(field = path, %value, "Value does not match the field type; keeping the current value"),
    }
    Ok(())
}

/// Emits the developer warning for a write to a root key outside the schema.
///
/// The write itself still happens; this only reports. Returns whether a warning was logged.
pub fn warn_on_unknown_root_key(model: &str, key: &str, config: &ModelConfig) -> bool {
    if !config.schema_warnings {
        return false;
    }
    warn!(
        model,
        key,
        "Key is not declared in the schema; it is set at the root without reactivity and will not trigger recomputation"
    );
    true
}
