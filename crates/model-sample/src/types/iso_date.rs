use chrono::{DateTime, SecondsFormat, Utc};
use model_framework::{AdapterError, AdapterSpec, TypeAdapter};
use serde_json::Value;

pub const NAME: &str = "IsoDate";

/// A point in time.
///
/// Accepts RFC 3339 strings (any offset, normalised to UTC) and millisecond Unix
/// timestamps. Always renders as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub struct IsoDate;

impl IsoDate {
    /// [`AdapterSpec`] with the `$date` extraction key.
    pub fn spec() -> AdapterSpec {
        AdapterSpec::of::<IsoDate>().with_extraction_key("$date")
    }
}

impl TypeAdapter for IsoDate {
    type Value = DateTime<Utc>;
    const NAME: &'static str = NAME;

    fn coerce(raw: &Value) -> Result<DateTime<Utc>, AdapterError> {
        match raw {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| AdapterError::new(NAME, raw, e.to_string())),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .ok_or_else(|| AdapterError::new(NAME, raw, "timestamp out of range")),
            _ => Err(AdapterError::new(NAME, raw, "expected a date string or timestamp")),
        }
    }

    fn render(value: &DateTime<Utc>) -> Value {
        Value::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}
