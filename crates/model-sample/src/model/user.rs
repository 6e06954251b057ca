use crate::model::AppError;
use crate::types::IsoDate;
use chrono::{DateTime, Utc};
use model_framework::{
    Model, ModelConfig, ModelDefinition, ModelError, ModelOptions, Schema, SchemaNode, TypedModel,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// The `user` definition: base path `users`, computed `full_name`.
pub fn user_definition() -> Arc<ModelDefinition> {
    let address = Schema::new()
        .field("street", SchemaNode::string())
        .field("city", SchemaNode::string())
        .field("zip", SchemaNode::string());

    let schema = Schema::new()
        .field("id", SchemaNode::string())
        .field("first_name", SchemaNode::string())
        .field("last_name", SchemaNode::string())
        .field("email", SchemaNode::string())
        .field("created_at", SchemaNode::adapter_spec(IsoDate::spec()))
        .field("address", SchemaNode::object(address))
        .field("tags", SchemaNode::array(SchemaNode::string()));

    ModelDefinition::builder("user", schema)
        .computed("full_name", |m| {
            let first = m.get_str("first_name").unwrap_or_default();
            let last = m.get_str("last_name").unwrap_or_default();
            json!(format!("{first} {last}").trim())
        })
        .build()
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    inner: Model,
}

impl User {
    pub fn new(
        definition: &Arc<ModelDefinition>,
        data: Value,
        options: ModelOptions,
        config: ModelConfig,
    ) -> Result<Self, AppError> {
        Ok(Self {
            inner: Model::with_config(definition, data, options, config)?,
        })
    }

    pub fn from_model(inner: Model) -> Self {
        Self { inner }
    }

    pub fn into_model(self) -> Model {
        self.inner
    }

    pub fn full_name(&self) -> String {
        self.inner.get_str("full_name").unwrap_or_default()
    }

    pub fn email(&self) -> String {
        self.inner.get_str("email").unwrap_or_default()
    }

    pub fn set_email(&mut self, email: &str) -> Result<(), AppError> {
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
                self.inner.set("email", json!(email))?;
                Ok(())
            }
            _ => Err(AppError::Validation(format!("invalid email `{email}`"))),
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.inner.adapter::<IsoDate>("created_at").copied()
    }

    pub fn city(&self) -> Option<String> {
        match self.inner.field("address.city")?.to_json() {
            Value::String(city) if !city.is_empty() => Some(city),
            _ => None,
        }
    }
}

impl TypedModel for User {
    type Error = AppError;

    fn inner(&self) -> &Model {
        &self.inner
    }

    fn inner_mut(&mut self) -> &mut Model {
        &mut self.inner
    }

    fn map_error(e: ModelError) -> Self::Error {
        AppError::Model(e)
    }
}
