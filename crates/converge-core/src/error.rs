//! Error types for converge-core

use crate::validation::ValidationFailures;

/// Result type for converge-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole reconciliation before any change is applied
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more desired resources failed validation
    #[error(transparent)]
    Validation(#[from] ValidationFailures),

    /// A collector could not produce the observed state
    #[error("Failed to collect {kind} resources: {message}")]
    Collection { kind: String, message: String },

    /// A transformation rejected a resource
    #[error("Transformation '{name}' failed: {message}")]
    Transformation { name: String, message: String },

    // Transparent wrappers for underlying crate errors
    /// Extension resolution or configuration error
    #[error(transparent)]
    Extension(#[from] converge_extensions::Error),

    /// Resource type lookup or registration error
    #[error(transparent)]
    Resource(#[from] converge_resources::Error),

    /// Configuration property error
    #[error(transparent)]
    Config(#[from] converge_extensions::ConfigError),
}

/// A backend call failed while applying one change.
///
/// Captured into that change's [`ChangeResult`](crate::ChangeResult) and
/// never propagated.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ChangeApplicationError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ChangeApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// This error followed by its chain of sources, outermost first.
    pub fn causes(&self) -> Vec<String> {
        let mut causes = vec![self.message.clone()];
        let mut current = std::error::Error::source(self);
        while let Some(err) = current {
            causes.push(err.to_string());
            current = err.source();
        }
        causes
    }
}
