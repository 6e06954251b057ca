//! # Framework Binding Layer
//!
//! Connects models to the lifecycle of a host component.
//!
//! 1. **Install** - [`Plugin::install`] records the [`PluginOptions`] once per application.
//! 2. **Create** - [`Plugin::scope`] runs every factory of a component's [`ModelsOption`]
//!    exactly once and exposes the results under `$name`.
//! 3. **Teardown** - [`ModelScope::teardown`] resets every model whose `persist` flag is not
//!    set. The instances stay in the scope; only their schema-governed data is cleared.
//!
//! ```rust
//! use model_framework::binding::{ModelsOption, Plugin};
//! use model_framework::config::{ModelOptions, PluginOptions};
//! use model_framework::model::{Model, ModelDefinition};
//! use model_framework::schema::{Schema, SchemaNode};
//! use serde_json::json;
//!
//! let user = ModelDefinition::builder("user", Schema::new().field("name", SchemaNode::string()))
//!     .build();
//!
//! let plugin = Plugin::install(PluginOptions::default());
//! let models = ModelsOption::new().model("user", move |config| {
//!     Model::with_config(&user, json!({"name": "Ann"}), ModelOptions::default(), *config)
//! });
//!
//! let mut scope = plugin.scope(&models).unwrap();
//! assert_eq!(scope.get("$user").unwrap().get("name"), Some(json!("Ann")));
//!
//! scope.teardown().unwrap();
//! assert_eq!(scope.get("$user").unwrap().get("name"), Some(json!("")));
//! ```

use crate::config::{ModelConfig, PluginOptions};
use crate::error::ModelError;
use crate::model::Model;
use std::fmt;
use tracing::{debug, info};

/// Builds one model for a component.
pub type ModelFactory = Box<dyn Fn(&ModelConfig) -> Result<Model, ModelError> + Send + Sync>;

/// The plugin-wide configuration handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plugin {
    config: ModelConfig,
}

impl Plugin {
    pub fn install(options: PluginOptions) -> Self {
        info!(schema_warnings = options.schema_warnings, "Model plugin installed");
        Self { config: options }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Creates a component scope, invoking each factory once in declaration order.
    pub fn scope(&self, models: &ModelsOption) -> Result<ModelScope, ModelError> {
        let mut scope = ModelScope::new(self.config);
        for (name, factory) in &models.factories {
            let model = factory(&self.config)?;
            scope.attach(name, model);
        }
        debug!(models = scope.models.len(), "Scope created");
        Ok(scope)
    }
}

/// A component's declarative `models` option.
#[derive(Default)]
pub struct ModelsOption {
    factories: Vec<(String, ModelFactory)>,
}

impl ModelsOption {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a model exposed as `$name`.
    pub fn model(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&ModelConfig) -> Result<Model, ModelError> + Send + Sync + 'static,
    ) -> Self {
        self.factories.push((name.into(), Box::new(factory)));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for ModelsOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelsOption")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// The models exposed on one component instance.
#[derive(Debug)]
pub struct ModelScope {
    config: ModelConfig,
    models: Vec<(String, Model)>,
}

fn local_name(key: &str) -> &str {
    key.strip_prefix('$').unwrap_or(key)
}

impl ModelScope {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            models: Vec::new(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Exposes `model` as `$name`, returning whatever was exposed there before.
    pub fn attach(&mut self, name: &str, model: Model) -> Option<Model> {
        let name = local_name(name);
        match self.models.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, model)),
            None => {
                self.models.push((name.to_string(), model));
                None
            }
        }
    }

    /// Removes `$name`. A non-persisted model is reset before it is handed back.
    pub fn detach(&mut self, name: &str) -> Result<Option<Model>, ModelError> {
        let name = local_name(name);
        let Some(index) = self.models.iter().position(|(n, _)| n == name) else {
            return Ok(None);
        };
        let (_, mut model) = self.models.remove(index);
        if !model.persist() {
            model.reset()?;
        }
        debug!(name, persist = model.persist(), "Model detached");
        Ok(Some(model))
    }

    /// Looks up `$name` (the `$` prefix is optional).
    pub fn get(&self, name: &str) -> Option<&Model> {
        let name = local_name(name);
        self.models.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Model> {
        let name = local_name(name);
        self.models
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    /// Exposed property names, `$`-prefixed, in attach order.
    pub fn names(&self) -> Vec<String> {
        self.models.iter().map(|(n, _)| format!("${n}")).collect()
    }

    /// Component teardown: resets every non-persisted model in place.
    pub fn teardown(&mut self) -> Result<(), ModelError> {
        let mut reset = 0;
        for (_, model) in self.models.iter_mut().filter(|(_, m)| !m.persist()) {
            model.reset()?;
            reset += 1;
        }
        info!(models = self.models.len(), reset, "Scope torn down");
        Ok(())
    }
}
