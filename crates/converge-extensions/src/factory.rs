//! Extension factory
//!
//! Resolves descriptors through qualifiers and builds configured instances.
//! Every call constructs fresh instances so configuration changes are always
//! observed.

use std::sync::Arc;

use converge_resources::ResourceType;

use crate::config::Configuration;
use crate::descriptor::{Extension, ExtensionDescriptor};
use crate::error::{Error, Result};
use crate::qualifier::{Qualifier, by_qualifiers};
use crate::registry::{ExtensionRegistry, qualified_name, select_unique};

/// Resolves and instantiates extensions from a frozen registry.
#[derive(Debug, Clone)]
pub struct ExtensionFactory {
    registry: Arc<ExtensionRegistry>,
}

impl ExtensionFactory {
    pub fn new(registry: Arc<ExtensionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Resolve the single enabled descriptor of type `T` named `alias`.
    pub fn resolve<T: ?Sized + 'static>(&self, alias: &str) -> Result<ExtensionDescriptor<T>> {
        let candidates = by_qualifiers(
            self.registry.find_all::<T>(),
            &[Qualifier::Enabled(true), Qualifier::alias(alias)],
        );
        select_unique(&format!("alias '{alias}'"), alias, candidates, |d| d.meta())
    }

    /// Resolve the single enabled descriptor of type `T` matching every qualifier.
    pub fn resolve_with<T: ?Sized + 'static>(
        &self,
        qualifiers: &[Qualifier],
    ) -> Result<ExtensionDescriptor<T>> {
        let query = Qualifier::All(qualifiers.to_vec()).to_string();
        let mut candidates = self.enabled_matching::<T>(qualifiers);
        match candidates.len() {
            0 => Err(Error::NoSuchExtension { query }),
            1 => Ok(candidates.remove(0)),
            _ => Err(Error::AmbiguousExtension {
                query,
                candidates: candidates.iter().map(|d| qualified_name(d.meta())).collect(),
            }),
        }
    }

    /// Build and configure the extension named `alias`.
    ///
    /// # Errors
    ///
    /// Fails with `NoSuchExtension` or `AmbiguousExtension` when `alias`
    /// does not identify exactly one enabled extension, and with
    /// `Configuration` when the instance rejects `config`.
    pub fn get_extension<T: ?Sized + Extension + 'static>(
        &self,
        alias: &str,
        config: &Configuration,
    ) -> Result<Box<T>> {
        let descriptor = self.resolve::<T>(alias)?;
        instantiate(&descriptor, config)
    }

    /// Build and configure the single extension matching every qualifier.
    pub fn get_extension_with<T: ?Sized + Extension + 'static>(
        &self,
        qualifiers: &[Qualifier],
        config: &Configuration,
    ) -> Result<Box<T>> {
        let descriptor = self.resolve_with::<T>(qualifiers)?;
        instantiate(&descriptor, config)
    }

    /// One configured instance per enabled extension of type `T`, ordered by
    /// priority (lower first), ties in registration order.
    pub fn get_all_extensions<T: ?Sized + Extension + 'static>(
        &self,
        config: &Configuration,
    ) -> Result<Vec<Box<T>>> {
        self.get_all_extensions_with::<T>(&[], config)
    }

    /// Like [`get_all_extensions`](Self::get_all_extensions), restricted by qualifiers.
    pub fn get_all_extensions_with<T: ?Sized + Extension + 'static>(
        &self,
        qualifiers: &[Qualifier],
        config: &Configuration,
    ) -> Result<Vec<Box<T>>> {
        let mut descriptors = self.enabled_matching::<T>(qualifiers);
        descriptors.sort_by_key(|d| d.meta().priority());

        tracing::debug!(
            declared_type = std::any::type_name::<T>(),
            count = descriptors.len(),
            "Instantiating extensions"
        );

        descriptors
            .iter()
            .map(|d| instantiate(d, config))
            .collect()
    }

    /// Every enabled extension of type `T` accepting `resource_type`, in priority order.
    pub fn get_all_for_resource<T: ?Sized + Extension + 'static>(
        &self,
        resource_type: &ResourceType,
        config: &Configuration,
    ) -> Result<Vec<Box<T>>> {
        self.get_all_extensions_with::<T>(
            &[Qualifier::SupportsResourceType(resource_type.clone())],
            config,
        )
    }

    fn enabled_matching<T: ?Sized + 'static>(
        &self,
        qualifiers: &[Qualifier],
    ) -> Vec<ExtensionDescriptor<T>> {
        let enabled = Qualifier::Enabled(true).filter(self.registry.find_all::<T>());
        by_qualifiers(enabled, qualifiers)
    }
}

fn instantiate<T: ?Sized + Extension>(
    descriptor: &ExtensionDescriptor<T>,
    config: &Configuration,
) -> Result<Box<T>> {
    let mut instance = descriptor.instantiate();
    instance
        .configure(config)
        .map_err(|source| Error::Configuration {
            name: descriptor.name().to_string(),
            source,
        })?;
    tracing::debug!(name = descriptor.name(), "Configured extension");
    Ok(instance)
}
