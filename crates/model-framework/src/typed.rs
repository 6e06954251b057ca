//! # TypedModel Trait
//!
//! Provides a common interface for domain-specific model wrappers, adding default `fetch`,
//! `save` and `destroy` methods built on top of a generic [`Model`].
use crate::config::SaveOptions;
use crate::error::ModelError;
use crate::model::Model;
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for domain wrappers to inherit the CRUD operations of their inner [`Model`].
///
/// # Example
///
/// ```rust
/// use model_framework::config::{ModelOptions, SaveOptions};
/// use model_framework::error::ModelError;
/// use model_framework::mock::MockTransport;
/// use model_framework::model::{Model, ModelDefinition};
/// use model_framework::schema::{Schema, SchemaNode};
/// use model_framework::transport::Method;
/// use model_framework::typed::TypedModel;
/// use serde_json::json;
///
/// // 1. Define the wrapper
/// struct Note {
///     inner: Model,
/// }
///
/// // 2. Implement TypedModel
/// impl TypedModel for Note {
///     type Error = ModelError;
///
///     fn inner(&self) -> &Model {
///         &self.inner
///     }
///
///     fn inner_mut(&mut self) -> &mut Model {
///         &mut self.inner
///     }
///
///     fn map_error(e: ModelError) -> Self::Error {
///         e
///     }
/// }
///
/// // 3. Usage: save() is provided automatically
/// #[tokio::main]
/// async fn main() {
///     let def = ModelDefinition::builder("note", Schema::new().field("id", SchemaNode::string()))
///         .build();
///     let mut note = Note { inner: Model::new(&def, json!({}), ModelOptions::default()).unwrap() };
///
///     let mock = MockTransport::new();
///     mock.expect(Method::Post, "notes").return_ok(json!({"id": "1"}));
///     note.save(&mock, None, SaveOptions::default()).await.unwrap();
///     assert_eq!(note.inner().url(), "notes/1");
/// }
/// ```
#[async_trait]
pub trait TypedModel: Send + Sync {
    /// The domain-specific error type.
    type Error: Send;

    /// Access the inner generic model.
    fn inner(&self) -> &Model;

    fn inner_mut(&mut self) -> &mut Model;

    /// Map framework errors to the domain error type.
    fn map_error(e: ModelError) -> Self::Error;

    /// Load from the server.
    #[tracing::instrument(skip_all, fields(model = %self.inner().name()))]
    async fn fetch<T>(&mut self, transport: &T) -> Result<Value, Self::Error>
    where
        T: Transport + ?Sized,
    {
        tracing::debug!("Sending request");
        self.inner_mut().fetch(transport).await.map_err(Self::map_error)
    }

    /// Create or replace on the server.
    #[tracing::instrument(skip_all, fields(model = %self.inner().name()))]
    async fn save<T>(
        &mut self,
        transport: &T,
        data: Option<Value>,
        options: SaveOptions,
    ) -> Result<Value, Self::Error>
    where
        T: Transport + ?Sized,
    {
        tracing::debug!("Sending request");
        self.inner_mut()
            .save(transport, data, options)
            .await
            .map_err(Self::map_error)
    }

    /// Delete on the server.
    #[tracing::instrument(skip_all, fields(model = %self.inner().name()))]
    async fn destroy<T>(&self, transport: &T) -> Result<(), Self::Error>
    where
        T: Transport + ?Sized,
    {
        tracing::debug!("Sending request");
        self.inner().destroy(transport).await.map_err(Self::map_error)
    }
}
