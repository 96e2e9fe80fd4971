//! Resource descriptors: naming metadata for a registered resource type.

use std::collections::BTreeSet;

use crate::ResourceType;

/// Describes one registered resource type.
///
/// `resource_class` names the Rust representation bound to the type; two
/// registrations of the same [`ResourceType`] conflict when their classes
/// differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    resource_type: ResourceType,
    description: Option<String>,
    resource_class: &'static str,
    singular_name: String,
    plural_name: Option<String>,
    short_names: BTreeSet<String>,
}

impl ResourceDescriptor {
    /// Create a descriptor bound to an explicit class name.
    ///
    /// The singular name defaults to the lowercased kind.
    pub fn new(resource_type: ResourceType, resource_class: &'static str) -> Self {
        let singular_name = resource_type.kind.to_lowercase();
        Self {
            resource_type,
            description: None,
            resource_class,
            singular_name,
            plural_name: None,
            short_names: BTreeSet::new(),
        }
    }

    /// Create a descriptor bound to the Rust type `R`.
    pub fn of<R: ?Sized + 'static>(resource_type: ResourceType) -> Self {
        Self::new(resource_type, std::any::type_name::<R>())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_singular_name(mut self, name: impl Into<String>) -> Self {
        self.singular_name = name.into();
        self
    }

    pub fn with_plural_name(mut self, name: impl Into<String>) -> Self {
        self.plural_name = Some(name.into());
        self
    }

    pub fn with_short_name(mut self, name: impl Into<String>) -> Self {
        self.short_names.insert(name.into());
        self
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn kind(&self) -> &str {
        &self.resource_type.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn resource_class(&self) -> &'static str {
        self.resource_class
    }

    pub fn singular_name(&self) -> &str {
        &self.singular_name
    }

    pub fn plural_name(&self) -> Option<&str> {
        self.plural_name.as_deref()
    }

    pub fn short_names(&self) -> &BTreeSet<String> {
        &self.short_names
    }

    /// Every name this resource answers to: kind, singular, plural and short names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.kind())
            .chain(std::iter::once(self.singular_name()))
            .chain(self.plural_name())
            .chain(self.short_names.iter().map(String::as_str))
    }

    /// Whether `name` is one of [`names`](Self::names), ignoring ASCII case.
    pub fn matches_name(&self, name: &str) -> bool {
        self.names().any(|n| n.eq_ignore_ascii_case(name))
    }
}
