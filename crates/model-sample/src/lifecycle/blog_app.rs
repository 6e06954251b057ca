use crate::model::{comment_definition, post_definition, user_definition, AppError};
use model_framework::{
    MemoryBackend, MemoryTransport, Model, ModelDefinition, ModelOptions, ModelScope,
    ModelsOption, Plugin, PluginOptions,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Model definitions shared by every component.
#[derive(Debug, Clone)]
pub struct Definitions {
    pub user: Arc<ModelDefinition>,
    pub post: Arc<ModelDefinition>,
    pub comment: Arc<ModelDefinition>,
}

impl Definitions {
    pub fn build() -> Result<Self, AppError> {
        Ok(Self {
            user: user_definition(),
            post: post_definition()?,
            comment: comment_definition(),
        })
    }
}

/// The runtime orchestrator of the sample blog.
///
/// # Example
///
/// ```ignore
/// let app = BlogApp::new(PluginOptions::default())?;
/// let mut page = app.profile_page()?;
/// page.get_mut("$user").unwrap().save(&app.transport, None, SaveOptions::default()).await?;
/// page.teardown()?;
/// app.shutdown().await?;
/// ```
pub struct BlogApp {
    /// Transport for every CRUD call in the application
    pub transport: MemoryTransport,

    pub plugin: Plugin,

    pub definitions: Definitions,

    /// Task handles for the running backend (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl BlogApp {
    /// Spawns the backend, installs the plugin and builds the definitions.
    pub fn new(options: PluginOptions) -> Result<Self, AppError> {
        let (backend, transport) = MemoryBackend::new(32);
        let backend_handle = tokio::spawn(backend.run());

        let plugin = Plugin::install(options);
        let definitions = Definitions::build()?;

        info!("Blog application started");
        Ok(Self {
            transport,
            plugin,
            definitions,
            handles: vec![backend_handle],
        })
    }

    /// The `models` option of the profile page: a fresh `$user` and a persisted `$draft`.
    pub fn profile_models(&self) -> ModelsOption {
        let user = self.definitions.user.clone();
        let post = self.definitions.post.clone();
        ModelsOption::new()
            .model("user", move |config| {
                Model::with_config(&user, json!({}), ModelOptions::default(), *config)
            })
            .model("draft", move |config| {
                Model::with_config(&post, json!({"draft": true}), ModelOptions::persistent(), *config)
            })
    }

    /// Creates the scope for one profile page component.
    pub fn profile_page(&self) -> Result<ModelScope, AppError> {
        Ok(self.plugin.scope(&self.profile_models())?)
    }

    /// Gracefully shuts down the backend.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down application...");
        drop(self.transport);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Backend task failed: {:?}", e);
                return Err(format!("Backend task failed: {:?}", e));
            }
        }

        info!("Application shutdown complete.");
        Ok(())
    }
}
