//! # Schema Description
//!
//! A [`Schema`] is the compiled form of a model's declarative field description. Each field is
//! a [`SchemaNode`] whose [`FieldType`] is resolved once, when the schema is built, into a
//! closed set of variants. Object nodes always carry their nested properties and array nodes
//! always carry their item node, so the "object without properties" and "array without
//! items" shapes cannot be expressed.
//!
//! Schemas can be assembled in code with the shorthand constructors, or compiled from the
//! JSON-Schema flavoured description format with [`Schema::from_json`]:
//!
//! ```rust
//! use model_framework::adapter::AdapterRegistry;
//! use model_framework::schema::{FieldType, Primitive, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::from_json(
//!     &json!({
//!         "name": { "type": "String", "default": "anonymous" },
//!         "tags": { "type": "Array", "items": { "type": "String" } },
//!         "address": {
//!             "type": "Object",
//!             "properties": { "city": { "type": "String" } }
//!         }
//!     }),
//!     &AdapterRegistry::new(),
//! )
//! .unwrap();
//!
//! assert!(matches!(schema.get("name").unwrap().kind, FieldType::Primitive(Primitive::String)));
//! ```

use crate::adapter::{AdapterRegistry, AdapterSpec, TypeAdapter};
use crate::error::SchemaError;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Leaf JSON types with a well-defined empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Boolean,
}

impl Primitive {
    /// Empty value used when neither data nor a default is available.
    pub fn zero(self) -> Value {
        match self {
            Primitive::String => json!(""),
            Primitive::Number => json!(0),
            Primitive::Boolean => json!(false),
        }
    }

    /// Whether `value` already has this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Primitive::String => value.is_string(),
            Primitive::Number => value.is_number(),
            Primitive::Boolean => value.is_boolean(),
        }
    }

    /// Lossless conversion used when assigning into an existing field: the value itself when
    /// it already has this type, a number rendered as text for string fields, else `None`.
    pub fn convert(self, value: &Value) -> Option<Value> {
        match (self, value) {
            _ if self.accepts(value) => Some(value.clone()),
            (Primitive::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            _ => None,
        }
    }
}

/// The resolved type of a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    Primitive(Primitive),
    Object(Schema),
    Array(Box<SchemaNode>),
    Adapter(AdapterSpec),
}

/// Describes one field: its type and optional default.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub kind: FieldType,
    pub default: Option<Value>,
}

impl SchemaNode {
    fn of(kind: FieldType) -> Self {
        Self {
            kind,
            default: None,
        }
    }

    /// Shorthand for a string field.
    pub fn string() -> Self {
        Self::of(FieldType::Primitive(Primitive::String))
    }

    /// Shorthand for a numeric field.
    pub fn number() -> Self {
        Self::of(FieldType::Primitive(Primitive::Number))
    }

    /// Shorthand for a boolean field.
    pub fn boolean() -> Self {
        Self::of(FieldType::Primitive(Primitive::Boolean))
    }

    /// Shorthand for a nested object field.
    pub fn object(properties: Schema) -> Self {
        Self::of(FieldType::Object(properties))
    }

    /// Shorthand for an array field whose elements follow `items`.
    pub fn array(items: SchemaNode) -> Self {
        Self::of(FieldType::Array(Box::new(items)))
    }

    /// Shorthand for a field coerced by the adapter `A`.
    pub fn adapter<A: TypeAdapter>() -> Self {
        Self::of(FieldType::Adapter(AdapterSpec::of::<A>()))
    }

    /// A field coerced by an explicit [`AdapterSpec`] (e.g. one with an extraction key).
    pub fn adapter_spec(spec: AdapterSpec) -> Self {
        Self::of(FieldType::Adapter(spec))
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Ordered mapping from field name to [`SchemaNode`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, SchemaNode>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a field.
    pub fn field(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.fields.insert(name.into(), node);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compiles a JSON description (`type`, `default`, `properties`, `items`).
    ///
    /// Built-in type names are matched case-insensitively; anything else is looked up in
    /// `registry`.
    pub fn from_json(description: &Value, registry: &AdapterRegistry) -> Result<Self, SchemaError> {
        compile_properties("<root>", description, registry)
    }
}

fn compile_properties(
    path: &str,
    description: &Value,
    registry: &AdapterRegistry,
) -> Result<Schema, SchemaError> {
    let map = description
        .as_object()
        .ok_or_else(|| SchemaError::NotAnObject(path.to_string()))?;
    let mut schema = Schema::new();
    for (name, node) in map {
        let field_path = if path == "<root>" {
            name.clone()
        } else {
            format!("{path}.{name}")
        };
        schema = schema.field(name.clone(), compile_node(&field_path, node, registry)?);
    }
    Ok(schema)
}

fn compile_node(
    path: &str,
    description: &Value,
    registry: &AdapterRegistry,
) -> Result<SchemaNode, SchemaError> {
    let map = description
        .as_object()
        .ok_or_else(|| SchemaError::NotAnObject(path.to_string()))?;
    let type_name = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::MissingType(path.to_string()))?;

    let kind = match type_name.to_ascii_lowercase().as_str() {
        "string" => FieldType::Primitive(Primitive::String),
        "number" => FieldType::Primitive(Primitive::Number),
        "boolean" => FieldType::Primitive(Primitive::Boolean),
        "object" => {
            let properties = map
                .get("properties")
                .ok_or_else(|| SchemaError::MissingProperties(path.to_string()))?;
            FieldType::Object(compile_properties(path, properties, registry)?)
        }
        "array" => {
            let items = map
                .get("items")
                .ok_or_else(|| SchemaError::MissingItems(path.to_string()))?;
            FieldType::Array(Box::new(compile_node(&format!("{path}[]"), items, registry)?))
        }
        _ => {
            let spec = registry
                .get(type_name)
                .ok_or_else(|| SchemaError::UnknownType {
                    field: path.to_string(),
                    type_name: type_name.to_string(),
                })?;
            FieldType::Adapter(spec.clone())
        }
    };

    Ok(SchemaNode {
        kind,
        default: map.get("default").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;

    struct Flag;

    impl TypeAdapter for Flag {
        type Value = bool;
        const NAME: &'static str = "Flag";

        fn coerce(raw: &Value) -> Result<bool, AdapterError> {
            raw.as_bool()
                .ok_or_else(|| AdapterError::new(Self::NAME, raw, "expected a bool"))
        }

        fn render(value: &bool) -> Value {
            json!(value)
        }
    }

    #[test]
    fn primitive_zero_values() {
        assert_eq!(Primitive::String.zero(), json!(""));
        assert_eq!(Primitive::Number.zero(), json!(0));
        assert_eq!(Primitive::Boolean.zero(), json!(false));
    }

    #[test]
    fn primitive_convert_widens_numbers_to_text() {
        assert_eq!(Primitive::String.convert(&json!(42)), Some(json!("42")));
        assert_eq!(Primitive::String.convert(&json!("a")), Some(json!("a")));
        assert_eq!(Primitive::Number.convert(&json!("42")), None);
        assert_eq!(Primitive::Boolean.convert(&json!(1)), None);
    }

    #[test]
    fn builder_keeps_defaults() {
        let schema = Schema::new()
            .field("name", SchemaNode::string().with_default(json!("x")))
            .field("count", SchemaNode::number());
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.get("name").unwrap().default, Some(json!("x")));
        assert!(schema.get("count").unwrap().default.is_none());
    }

    #[test]
    fn compiles_nested_description() {
        let schema = Schema::from_json(
            &json!({
                "profile": {
                    "type": "object",
                    "properties": {
                        "flags": { "type": "array", "items": { "type": "Flag" } }
                    }
                }
            }),
            &AdapterRegistry::new().register::<Flag>(),
        )
        .unwrap();

        let FieldType::Object(profile) = &schema.get("profile").unwrap().kind else {
            panic!("expected object");
        };
        let FieldType::Array(items) = &profile.get("flags").unwrap().kind else {
            panic!("expected array");
        };
        assert!(matches!(&items.kind, FieldType::Adapter(spec) if spec.name() == "Flag"));
    }

    #[test]
    fn object_without_properties_is_rejected() {
        let err = Schema::from_json(&json!({"a": {"type": "Object"}}), &AdapterRegistry::new())
            .unwrap_err();
        assert_eq!(err, SchemaError::MissingProperties("a".into()));
    }

    #[test]
    fn array_without_items_is_rejected() {
        let err = Schema::from_json(&json!({"a": {"type": "Array"}}), &AdapterRegistry::new())
            .unwrap_err();
        assert_eq!(err, SchemaError::MissingItems("a".into()));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = Schema::from_json(&json!({"a": {"type": "Money"}}), &AdapterRegistry::new())
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                field: "a".into(),
                type_name: "Money".into()
            }
        );
    }

    #[test]
    fn missing_type_is_rejected() {
        let err = Schema::from_json(&json!({"a": {"default": 1}}), &AdapterRegistry::new())
            .unwrap_err();
        assert_eq!(err, SchemaError::MissingType("a".into()));
    }
}
