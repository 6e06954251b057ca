use model_framework::ModelError;
use thiserror::Error;

/// Errors surfaced by the sample's typed models.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("validation failed: {0}")]
    Validation(String),
}
