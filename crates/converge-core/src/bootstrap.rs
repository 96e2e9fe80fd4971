//! Provider bootstrap
//!
//! Builds the extension and resource registries once from a set of
//! providers, then freezes them for read-only use.

use std::sync::Arc;

use converge_extensions::{ExtensionFactory, ExtensionProvider, ExtensionRegistry, ProviderRegistrar};
use converge_resources::ResourceRegistry;

use crate::Result;
use crate::reconciler::Reconciler;

/// The registries shared by every reconciliation of a process.
#[derive(Debug, Clone)]
pub struct Runtime {
    extensions: Arc<ExtensionRegistry>,
    resources: Arc<ResourceRegistry>,
}

impl Runtime {
    /// Register every provider's resources and extensions, in order.
    ///
    /// # Errors
    ///
    /// Fails on the first provider registration error, such as a
    /// conflicting resource registration.
    pub fn bootstrap(providers: &[Box<dyn ExtensionProvider>]) -> Result<Self> {
        let mut extensions = ExtensionRegistry::new();
        let mut resources = ResourceRegistry::new();

        for provider in providers {
            provider.register_resources(&mut resources)?;
            let mut registrar = ProviderRegistrar::new(&mut extensions, provider.as_ref());
            provider.register_extensions(&mut registrar)?;
            tracing::debug!(provider = provider.name(), "Registered provider");
        }

        tracing::info!(
            providers = providers.len(),
            extensions = extensions.len(),
            resources = resources.len(),
            "Bootstrapped runtime"
        );

        Ok(Self {
            extensions: Arc::new(extensions),
            resources: Arc::new(resources),
        })
    }

    /// A runtime over registries built elsewhere.
    pub fn from_registries(extensions: ExtensionRegistry, resources: ResourceRegistry) -> Self {
        Self {
            extensions: Arc::new(extensions),
            resources: Arc::new(resources),
        }
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn factory(&self) -> ExtensionFactory {
        ExtensionFactory::new(Arc::clone(&self.extensions))
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.factory(), Arc::clone(&self.resources))
    }
}
