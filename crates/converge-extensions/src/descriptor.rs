//! Extension descriptors and capability declarations

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use converge_resources::ResourceType;
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::error::ConfigError;
use crate::naming::{NamingConvention, derive_aliases, simple_type_name};

/// Base trait of every pluggable unit.
pub trait Extension: Send + Sync {
    /// Apply configuration to a freshly constructed instance.
    ///
    /// Called exactly once, right after construction, by the
    /// [`ExtensionFactory`](crate::ExtensionFactory).
    fn configure(&mut self, _config: &Configuration) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// The role an extension plays in a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionCategory {
    Controller,
    Collector,
    Validation,
    Transformation,
    Reporter,
    Action,
    HealthIndicator,
}

impl fmt::Display for ExtensionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Controller => "controller",
            Self::Collector => "collector",
            Self::Validation => "validation",
            Self::Transformation => "transformation",
            Self::Reporter => "reporter",
            Self::Action => "action",
            Self::HealthIndicator => "health_indicator",
        };
        write!(f, "{s}")
    }
}

/// Priority given to extensions that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 0;

/// What an extension declares about itself at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub category: ExtensionCategory,
    /// Resource types the extension accepts. Empty means every type.
    pub resource_types: Vec<ResourceType>,
    /// Lower values run first.
    pub priority: i32,
}

impl Capability {
    pub fn new(category: ExtensionCategory) -> Self {
        Self {
            category,
            resource_types: Vec::new(),
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn accepts(&self, resource_type: &ResourceType) -> bool {
        self.resource_types.is_empty()
            || self.resource_types.iter().any(|t| t.matches(resource_type))
    }
}

/// Metadata describing one registered extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMeta {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Name of the provider that registered the extension.
    pub provider: String,
    /// The trait object type the extension is registered under.
    pub declared_type: &'static str,
    /// The concrete implementing type.
    pub implementation: &'static str,
    pub aliases: BTreeSet<String>,
    pub enabled: bool,
    pub capability: Capability,
}

impl ExtensionMeta {
    pub fn category(&self) -> ExtensionCategory {
        self.capability.category
    }

    pub fn priority(&self) -> i32 {
        self.capability.priority
    }

    pub fn accepts(&self, resource_type: &ResourceType) -> bool {
        self.capability.accepts(resource_type)
    }

    /// Whether `alias` names this extension (name or alias, ignoring case).
    pub fn matches_alias(&self, alias: &str) -> bool {
        self.name.eq_ignore_ascii_case(alias)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias))
    }
}

/// Zero-argument constructor for an extension instance.
pub type Supplier<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

/// Metadata plus the supplier for one extension implementing `T`.
///
/// `T` is usually a trait object such as `dyn Collector`.
pub struct ExtensionDescriptor<T: ?Sized> {
    meta: ExtensionMeta,
    supplier: Supplier<T>,
}

impl<T: ?Sized> Clone for ExtensionDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta.clone(),
            supplier: Arc::clone(&self.supplier),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ExtensionDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> ExtensionDescriptor<T> {
    pub fn meta(&self) -> &ExtensionMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn supplier(&self) -> &Supplier<T> {
        &self.supplier
    }

    /// Construct a new, unconfigured instance.
    pub fn instantiate(&self) -> Box<T> {
        (self.supplier)()
    }
}

impl<T: ?Sized + 'static> ExtensionDescriptor<T> {
    /// Create a descriptor with an explicit name.
    pub fn new(
        name: impl Into<String>,
        category: ExtensionCategory,
        supplier: impl Fn() -> Box<T> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        Self {
            meta: ExtensionMeta {
                aliases: derive_aliases(&name, &NamingConvention::none()),
                name,
                title: None,
                description: None,
                provider: String::new(),
                declared_type: std::any::type_name::<T>(),
                implementation: "",
                enabled: true,
                capability: Capability::new(category),
            },
            supplier: Arc::new(supplier),
        }
    }

    /// Create a descriptor named after the implementing type `C`.
    pub fn of<C: ?Sized + 'static>(
        category: ExtensionCategory,
        supplier: impl Fn() -> Box<T> + Send + Sync + 'static,
    ) -> Self {
        let implementation = std::any::type_name::<C>();
        let mut descriptor = Self::new(simple_type_name(implementation), category, supplier);
        descriptor.meta.implementation = implementation;
        descriptor.meta.aliases = derive_aliases(implementation, &NamingConvention::none());
        descriptor
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.meta.provider = provider.into();
        self
    }

    /// Add the aliases derived under a provider naming convention.
    pub fn with_naming(mut self, convention: &NamingConvention) -> Self {
        let source = if self.meta.implementation.is_empty() {
            self.meta.name.clone()
        } else {
            self.meta.implementation.to_string()
        };
        self.meta.aliases.extend(derive_aliases(&source, convention));
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.meta.aliases.insert(alias.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.meta.capability.priority = priority;
        self
    }

    /// Declare support for a resource type. May be called repeatedly.
    pub fn supporting(mut self, resource_type: ResourceType) -> Self {
        self.meta.capability.resource_types.push(resource_type);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.meta.enabled = enabled;
        self
    }

    pub(crate) fn into_parts(self) -> (ExtensionMeta, Supplier<T>) {
        (self.meta, self.supplier)
    }

    pub(crate) fn from_parts(meta: ExtensionMeta, supplier: Supplier<T>) -> Self {
        Self { meta, supplier }
    }
}
