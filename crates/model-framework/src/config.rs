//! Configuration threaded from the plugin into models and the schema engine.

use serde::Deserialize;

/// Runtime configuration consulted by the schema engine.
///
/// Deserialises from the plugin install options, e.g. `{"schemaWarnings": false}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Warn when a root key outside the schema is written.
    #[serde(default = "default_schema_warnings")]
    pub schema_warnings: bool,
}

fn default_schema_warnings() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            schema_warnings: default_schema_warnings(),
        }
    }
}

impl ModelConfig {
    pub fn with_schema_warnings(mut self, enabled: bool) -> Self {
        self.schema_warnings = enabled;
        self
    }
}

/// Options accepted by [`Plugin::install`](crate::binding::Plugin::install).
pub type PluginOptions = ModelConfig;

/// Per-instance options for [`Model::new`](crate::model::Model::new).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ModelOptions {
    /// Keep the model's data when its owning scope is torn down.
    #[serde(default)]
    pub persist: bool,
}

impl ModelOptions {
    pub fn persistent() -> Self {
        Self { persist: true }
    }
}

/// Per-call options for [`Model::save`](crate::model::Model::save).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SaveOptions {
    /// Overrides the computed `url` for this call only.
    #[serde(default)]
    pub path: Option<String>,
}

impl SaveOptions {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}
