//! # Custom Field Types
//!
//! Concrete [`TypeAdapter`](model_framework::TypeAdapter)s used by the sample models.
//!
//! - [`IsoDate`] - timestamps stored as `DateTime<Utc>`, rendered as RFC 3339 with
//!   millisecond precision; reads `{"$date": ...}` envelopes.
//! - [`ObjectId`] - 24-character hex identifiers; reads `{"$oid": ...}` envelopes.

pub mod iso_date;
pub mod object_id;

pub use iso_date::IsoDate;
pub use object_id::ObjectId;

use model_framework::AdapterRegistry;

/// Registry for schema descriptions that name the sample types.
pub fn registry() -> AdapterRegistry {
    AdapterRegistry::new()
        .register_spec(iso_date::NAME, IsoDate::spec())
        .register_spec(object_id::NAME, ObjectId::spec())
}
