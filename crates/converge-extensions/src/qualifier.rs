//! Composable predicates over extension metadata.
//!
//! Qualifiers are pure filters, so the order in which they are applied never
//! changes the resulting set.

use std::fmt;

use converge_resources::ResourceType;

use crate::descriptor::{ExtensionCategory, ExtensionDescriptor, ExtensionMeta};

/// A predicate selecting extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    /// Descriptor's enabled flag equals the expected value.
    Enabled(bool),

    /// Exact (case-sensitive) name match.
    Named(String),

    /// Name or alias match, ignoring case.
    Alias(String),

    Category(ExtensionCategory),

    Provider(String),

    /// The extension declares support for the resource type.
    SupportsResourceType(ResourceType),

    /// At least one inner qualifier matches. Empty matches nothing.
    Any(Vec<Qualifier>),

    /// Every inner qualifier matches. Empty matches everything.
    All(Vec<Qualifier>),
}

impl Qualifier {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn alias(alias: impl Into<String>) -> Self {
        Self::Alias(alias.into())
    }

    pub fn provider(provider: impl Into<String>) -> Self {
        Self::Provider(provider.into())
    }

    pub fn matches(&self, meta: &ExtensionMeta) -> bool {
        match self {
            Self::Enabled(expected) => meta.enabled == *expected,
            Self::Named(name) => meta.name == *name,
            Self::Alias(alias) => meta.matches_alias(alias),
            Self::Category(category) => meta.category() == *category,
            Self::Provider(provider) => meta.provider == *provider,
            Self::SupportsResourceType(resource_type) => meta.accepts(resource_type),
            Self::Any(inner) => inner.iter().any(|q| q.matches(meta)),
            Self::All(inner) => inner.iter().all(|q| q.matches(meta)),
        }
    }

    /// Keep the descriptors this qualifier matches, preserving order.
    pub fn filter<T: ?Sized>(
        &self,
        descriptors: impl IntoIterator<Item = ExtensionDescriptor<T>>,
    ) -> Vec<ExtensionDescriptor<T>> {
        descriptors
            .into_iter()
            .filter(|d| self.matches(d.meta()))
            .collect()
    }

    pub fn and(self, other: Qualifier) -> Qualifier {
        match self {
            Self::All(mut inner) => {
                inner.push(other);
                Self::All(inner)
            }
            q => Self::All(vec![q, other]),
        }
    }

    pub fn or(self, other: Qualifier) -> Qualifier {
        match self {
            Self::Any(mut inner) => {
                inner.push(other);
                Self::Any(inner)
            }
            q => Self::Any(vec![q, other]),
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled(expected) => write!(f, "enabled={expected}"),
            Self::Named(name) => write!(f, "name='{name}'"),
            Self::Alias(alias) => write!(f, "alias '{alias}'"),
            Self::Category(category) => write!(f, "category={category}"),
            Self::Provider(provider) => write!(f, "provider='{provider}'"),
            Self::SupportsResourceType(t) => write!(f, "supports {t}"),
            Self::Any(inner) => write_joined(f, inner, "or"),
            Self::All(inner) => write_joined(f, inner, "and"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, inner: &[Qualifier], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, q) in inner.iter().enumerate() {
        if i > 0 {
            write!(f, " {sep} ")?;
        }
        write!(f, "{q}")?;
    }
    write!(f, ")")
}

/// Keep descriptors matching every qualifier (AND).
pub fn by_qualifiers<T: ?Sized>(
    descriptors: impl IntoIterator<Item = ExtensionDescriptor<T>>,
    qualifiers: &[Qualifier],
) -> Vec<ExtensionDescriptor<T>> {
    descriptors
        .into_iter()
        .filter(|d| qualifiers.iter().all(|q| q.matches(d.meta())))
        .collect()
}

/// Keep descriptors matching at least one qualifier (OR).
pub fn by_any_qualifiers<T: ?Sized>(
    descriptors: impl IntoIterator<Item = ExtensionDescriptor<T>>,
    qualifiers: &[Qualifier],
) -> Vec<ExtensionDescriptor<T>> {
    descriptors
        .into_iter()
        .filter(|d| qualifiers.iter().any(|q| q.matches(d.meta())))
        .collect()
}
