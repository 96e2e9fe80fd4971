//! Extension registry
//!
//! A single registry holds every extension of every provider. It is filled
//! once at bootstrap and only read afterwards.

use std::any::{Any, TypeId};

use crate::descriptor::{ExtensionCategory, ExtensionDescriptor, ExtensionMeta, Supplier};
use crate::error::{Error, Result};
use crate::qualifier::Qualifier;

struct Entry {
    meta: ExtensionMeta,
    type_id: TypeId,
    /// A boxed `Supplier<T>` for the declared type `T` identified by `type_id`.
    supplier: Box<dyn Any + Send + Sync>,
}

impl Entry {
    fn descriptor<T: ?Sized + 'static>(&self) -> Option<ExtensionDescriptor<T>> {
        if self.type_id != TypeId::of::<T>() {
            return None;
        }
        self.supplier
            .downcast_ref::<Supplier<T>>()
            .map(|supplier| ExtensionDescriptor::from_parts(self.meta.clone(), supplier.clone()))
    }

    fn same_slot(&self, type_id: TypeId, meta: &ExtensionMeta) -> bool {
        self.type_id == type_id
            && self.meta.category() == meta.category()
            && self.meta.provider == meta.provider
            && self.meta.name == meta.name
    }
}

/// Registry of extension descriptors keyed by declared type.
///
/// # Example
///
/// ```
/// use converge_extensions::{Extension, ExtensionCategory, ExtensionDescriptor, ExtensionRegistry};
///
/// struct Noop;
/// impl Extension for Noop {}
///
/// let mut registry = ExtensionRegistry::new();
/// registry
///     .register(ExtensionDescriptor::<dyn Extension>::new(
///         "noop",
///         ExtensionCategory::Action,
///         || Box::new(Noop),
///     ))
///     .unwrap();
///
/// assert_eq!(registry.find_all::<dyn Extension>().len(), 1);
/// assert_eq!(registry.find_by_alias("NOOP").unwrap().name, "noop");
/// ```
#[derive(Default)]
pub struct ExtensionRegistry {
    entries: Vec<Entry>,
}

impl ExtensionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an extension.
    ///
    /// Registering the same declared type, category, provider and name a
    /// second time replaces the earlier descriptor in place, keeping its
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidName` if the name is blank.
    pub fn register<T: ?Sized + 'static>(&mut self, descriptor: ExtensionDescriptor<T>) -> Result<()> {
        let name = descriptor.name();
        if name.trim().is_empty() {
            return Err(Error::InvalidName {
                name: name.to_string(),
                reason: "extension names must not be empty".to_string(),
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidName {
                name: name.to_string(),
                reason: "extension names must not contain whitespace".to_string(),
            });
        }

        let (meta, supplier) = descriptor.into_parts();
        let entry = Entry {
            type_id: TypeId::of::<T>(),
            supplier: Box::new(supplier),
            meta,
        };

        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.same_slot(entry.type_id, &entry.meta))
        {
            tracing::warn!(
                name = %entry.meta.name,
                provider = %entry.meta.provider,
                category = %entry.meta.category(),
                "Replacing previously registered extension"
            );
            *existing = entry;
            return Ok(());
        }

        tracing::debug!(
            name = %entry.meta.name,
            provider = %entry.meta.provider,
            category = %entry.meta.category(),
            declared_type = entry.meta.declared_type,
            "Registered extension"
        );
        self.entries.push(entry);
        Ok(())
    }

    /// Every descriptor registered under declared type `T`, in registration order.
    pub fn find_all<T: ?Sized + 'static>(&self) -> Vec<ExtensionDescriptor<T>> {
        self.entries.iter().filter_map(Entry::descriptor::<T>).collect()
    }

    /// Descriptors of declared type `T` that match `qualifier`.
    pub fn find<T: ?Sized + 'static>(&self, qualifier: &Qualifier) -> Vec<ExtensionDescriptor<T>> {
        qualifier.filter(self.find_all::<T>())
    }

    /// Every enabled extension, of any declared type, named `alias`.
    pub fn find_all_by_alias(&self, alias: &str) -> Vec<&ExtensionMeta> {
        self.entries
            .iter()
            .map(|e| &e.meta)
            .filter(|m| m.enabled && m.matches_alias(alias))
            .collect()
    }

    /// Resolve a user-facing name to exactly one enabled extension.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSuchExtension` when nothing matches and
    /// `Error::AmbiguousExtension` when several match and none is named
    /// exactly `alias`.
    pub fn find_by_alias(&self, alias: &str) -> Result<&ExtensionMeta> {
        select_unique(
            &format!("alias '{alias}'"),
            alias,
            self.find_all_by_alias(alias),
            |m| *m,
        )
    }

    pub fn find_by_category(&self, category: ExtensionCategory) -> Vec<&ExtensionMeta> {
        self.entries
            .iter()
            .map(|e| &e.meta)
            .filter(|m| m.category() == category)
            .collect()
    }

    /// Metadata of every registered extension, in registration order.
    pub fn all(&self) -> Vec<&ExtensionMeta> {
        self.entries.iter().map(|e| &e.meta).collect()
    }

    /// Check whether an extension with this exact name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.meta.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.all())
            .finish()
    }
}

/// Pick the single candidate, preferring an exact name match when there are several.
pub(crate) fn select_unique<I>(
    query: &str,
    alias: &str,
    mut candidates: Vec<I>,
    meta: impl Fn(&I) -> &ExtensionMeta,
) -> Result<I> {
    if candidates.len() > 1 {
        let exact: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| meta(c).name == alias)
            .map(|(i, _)| i)
            .collect();
        if let [index] = exact[..] {
            return Ok(candidates.swap_remove(index));
        }
    }

    match candidates.len() {
        0 => Err(Error::NoSuchExtension {
            query: query.to_string(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(Error::AmbiguousExtension {
            query: query.to_string(),
            candidates: candidates
                .iter()
                .map(|c| qualified_name(meta(c)))
                .collect(),
        }),
    }
}

/// `provider/name`, or just the name when no provider is set.
pub(crate) fn qualified_name(meta: &ExtensionMeta) -> String {
    if meta.provider.is_empty() {
        meta.name.clone()
    } else {
        format!("{}/{}", meta.provider, meta.name)
    }
}
