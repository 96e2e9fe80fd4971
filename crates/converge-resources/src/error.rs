//! Error types for converge-resources

use crate::ResourceType;

/// Result type for converge-resources operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by resource registration and lookup
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No descriptor is registered for the exact resource type.
    #[error("resource type not found: {resource_type}")]
    ResourceTypeNotFound { resource_type: ResourceType },

    /// No descriptor is registered for the kind (in any version).
    #[error("no resource registered for kind '{kind}' in group '{group}'")]
    KindNotFound { kind: String, group: String },

    /// The same resource type was registered twice with different representations.
    #[error(
        "conflicting registration for {resource_type}: already bound to '{existing}', cannot bind to '{attempted}'"
    )]
    ResourceRegistrationConflict {
        resource_type: ResourceType,
        existing: String,
        attempted: String,
    },

    /// An API version string could not be interpreted as a release version.
    #[error("invalid API version '{value}': {reason}")]
    InvalidApiVersion { value: String, reason: String },
}
