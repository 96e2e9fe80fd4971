//! Resource type registry.
//!
//! Populated once while providers register, read-only afterwards. Lookups that
//! omit an API version resolve to the latest registered version of the kind,
//! using the [`ApiVersion`](crate::ApiVersion) order.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::{ResourceDescriptor, ResourceType};

/// Registry of resource descriptors keyed by their exact resource type.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    descriptors: HashMap<ResourceType, ResourceDescriptor>,
}

impl ResourceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
        }
    }

    /// Register a resource descriptor.
    ///
    /// Registering the identical type and class again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceRegistrationConflict` if the type is already
    /// bound to a different resource class.
    pub fn register(&mut self, descriptor: ResourceDescriptor) -> Result<()> {
        if let Some(existing) = self.descriptors.get(descriptor.resource_type()) {
            if existing.resource_class() == descriptor.resource_class() {
                tracing::debug!(
                    resource_type = %descriptor.resource_type(),
                    "Resource already registered, ignoring duplicate"
                );
                return Ok(());
            }
            return Err(Error::ResourceRegistrationConflict {
                resource_type: descriptor.resource_type().clone(),
                existing: existing.resource_class().to_string(),
                attempted: descriptor.resource_class().to_string(),
            });
        }

        tracing::debug!(resource_type = %descriptor.resource_type(), "Registered resource");
        self.descriptors
            .insert(descriptor.resource_type().clone(), descriptor);
        Ok(())
    }

    /// Resolve a kind to the descriptor of its latest registered version.
    ///
    /// An empty `group` searches every group; when the same kind exists in
    /// several groups the highest version wins, ties going to the
    /// lexically greatest group so the result is deterministic.
    ///
    /// # Errors
    ///
    /// Returns `Error::KindNotFound` if no version of the kind is registered.
    pub fn resolve(&self, kind: &str, group: &str) -> Result<&ResourceDescriptor> {
        self.versions_of(kind, group)
            .into_iter()
            .last()
            .ok_or_else(|| Error::KindNotFound {
                kind: kind.to_string(),
                group: group.to_string(),
            })
    }

    /// Resolve a possibly partial resource type.
    ///
    /// A fully specified type resolves exactly; a type with an empty version
    /// resolves to the latest version of its kind.
    pub fn resolve_type(&self, resource_type: &ResourceType) -> Result<&ResourceDescriptor> {
        if resource_type.api_version.is_empty() {
            self.resolve(&resource_type.kind, &resource_type.group)
        } else {
            self.resolve_exact(resource_type)
        }
    }

    /// Return the descriptor registered for exactly `resource_type`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceTypeNotFound` if there is no such registration.
    pub fn resolve_exact(&self, resource_type: &ResourceType) -> Result<&ResourceDescriptor> {
        self.descriptors
            .get(resource_type)
            .ok_or_else(|| Error::ResourceTypeNotFound {
                resource_type: resource_type.clone(),
            })
    }

    /// All registered versions of a kind, oldest first.
    pub fn versions_of(&self, kind: &str, group: &str) -> Vec<&ResourceDescriptor> {
        let mut versions: Vec<_> = self
            .descriptors
            .values()
            .filter(|d| d.kind().eq_ignore_ascii_case(kind))
            .filter(|d| group.is_empty() || d.resource_type().group == group)
            .collect();
        versions.sort_by(|a, b| {
            let (a, b) = (a.resource_type(), b.resource_type());
            a.version()
                .cmp(&b.version())
                .then_with(|| a.group.cmp(&b.group))
        });
        versions
    }

    /// Find descriptors answering to `name` (kind, singular, plural or short name).
    ///
    /// Results are sorted by resource type.
    pub fn find_by_name(&self, name: &str) -> Vec<&ResourceDescriptor> {
        let mut found: Vec<_> = self
            .descriptors
            .values()
            .filter(|d| d.matches_name(name))
            .collect();
        found.sort_by(|a, b| a.resource_type().cmp(b.resource_type()));
        found
    }

    /// Check if a resource type is registered.
    pub fn contains(&self, resource_type: &ResourceType) -> bool {
        self.descriptors.contains_key(resource_type)
    }

    /// All descriptors sorted by resource type.
    pub fn all(&self) -> Vec<&ResourceDescriptor> {
        let mut all: Vec<_> = self.descriptors.values().collect();
        all.sort_by(|a, b| a.resource_type().cmp(b.resource_type()));
        all
    }

    /// Number of registered resource types.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
