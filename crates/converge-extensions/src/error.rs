/// Errors raised while reading extension configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required property has no value and no declared default.
    #[error("missing required configuration property '{key}'")]
    MissingProperty { key: String },

    /// A property is present but cannot be read as the declared type.
    #[error("invalid value for configuration property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },

    /// Failed to parse configuration TOML.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors that can occur in the extension system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No enabled extension matched the query.
    #[error("no extension matches {query}")]
    NoSuchExtension { query: String },

    /// More than one enabled extension matched the query.
    #[error("{query} is ambiguous, candidates: {}", .candidates.join(", "))]
    AmbiguousExtension {
        query: String,
        candidates: Vec<String>,
    },

    /// An extension rejected its configuration.
    #[error("failed to configure extension '{name}': {source}")]
    Configuration {
        name: String,
        #[source]
        source: ConfigError,
    },

    /// Invalid extension name.
    #[error("invalid extension name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A provider failed to register its resources.
    #[error(transparent)]
    Resource(#[from] converge_resources::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
