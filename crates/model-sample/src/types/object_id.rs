use model_framework::{AdapterError, AdapterSpec, TypeAdapter};
use serde_json::Value;

pub const NAME: &str = "ObjectId";

/// A 12-byte document id written as 24 hex characters, normalised to lowercase.
pub struct ObjectId;

impl ObjectId {
    /// [`AdapterSpec`] with the `$oid` extraction key.
    pub fn spec() -> AdapterSpec {
        AdapterSpec::of::<ObjectId>().with_extraction_key("$oid")
    }
}

impl TypeAdapter for ObjectId {
    type Value = String;
    const NAME: &'static str = NAME;

    fn coerce(raw: &Value) -> Result<String, AdapterError> {
        let s = raw
            .as_str()
            .ok_or_else(|| AdapterError::new(NAME, raw, "expected a string"))?;
        if s.len() != 24 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AdapterError::new(NAME, raw, "expected 24 hex characters"));
        }
        Ok(s.to_ascii_lowercase())
    }

    fn render(value: &String) -> Value {
        Value::String(value.clone())
    }
}
