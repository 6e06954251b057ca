//! # CRUD Request Orchestrator
//!
//! `fetch`, `save` and `destroy` on [`Model`], each taking the [`Transport`] to use for that
//! call. Successful `fetch`/`save` responses are merged into the model through the same
//! coercion path as construction (see [`Model::merge`]), which is how a new model picks up
//! its server-assigned `id` and becomes persisted.
//!
//! | Operation | New model            | Persisted model        |
//! |-----------|----------------------|------------------------|
//! | `fetch`   | `GET basePath`       | `GET basePath/id`      |
//! | `save`    | `POST basePath`      | `PUT basePath/id`      |
//! | `destroy` | `InvalidState` error | `DELETE basePath/id`   |
//!
//! These are the only suspension points in the crate. A failed request leaves the model
//! untouched. Overlapping calls need a cloned model, and whichever response is merged last
//! wins; callers that share a model are responsible for serializing writes.

use crate::config::SaveOptions;
use crate::error::ModelError;
use crate::model::Model;
use crate::transport::{Method, Transport};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

impl Model {
    /// Loads the model from `url` and merges the response body.
    #[instrument(skip_all, fields(model = %self.name(), url = %self.url()))]
    pub async fn fetch<T>(&mut self, transport: &T) -> Result<Value, ModelError>
    where
        T: Transport + ?Sized,
    {
        let url = self.url();
        let body = transport
            .request(Method::Get, &url, None)
            .await
            .inspect_err(|e| warn!(error = %e, "Fetch failed"))?;
        self.merge(&body)?;
        debug!("Fetched");
        Ok(body)
    }

    /// Creates (`POST`) or replaces (`PUT`) the model on the server.
    ///
    /// Sends `data` when given, otherwise [`Model::to_json`]. `options.path` overrides the
    /// target URL for this call only.
    #[instrument(skip_all, fields(model = %self.name(), is_new = self.is_new()))]
    pub async fn save<T>(
        &mut self,
        transport: &T,
        data: Option<Value>,
        options: SaveOptions,
    ) -> Result<Value, ModelError>
    where
        T: Transport + ?Sized,
    {
        let method = if self.is_new() { Method::Post } else { Method::Put };
        let url = options.path.unwrap_or_else(|| self.url());
        let payload = data.unwrap_or_else(|| self.to_json());

        let body = transport
            .request(method, &url, Some(&payload))
            .await
            .inspect_err(|e| warn!(%method, %url, error = %e, "Save failed"))?;
        self.merge(&body)?;
        info!(%method, %url, id = ?self.id(), "Saved");
        Ok(body)
    }

    /// Deletes the model on the server. The instance itself is left as it is.
    #[instrument(skip_all, fields(model = %self.name()))]
    pub async fn destroy<T>(&self, transport: &T) -> Result<(), ModelError>
    where
        T: Transport + ?Sized,
    {
        let Some(url) = self.url_root() else {
            return Err(ModelError::InvalidState(format!(
                "cannot destroy a new {} without an id",
                self.name()
            )));
        };
        transport
            .request(Method::Delete, &url, None)
            .await
            .inspect_err(|e| warn!(%url, error = %e, "Destroy failed"))?;
        info!(%url, "Destroyed");
        Ok(())
    }
}
