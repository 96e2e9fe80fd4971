//! Provider registration surface

use converge_resources::ResourceRegistry;

use crate::descriptor::ExtensionDescriptor;
use crate::error::Result;
use crate::naming::{AffixPosition, NamingConvention};
use crate::registry::ExtensionRegistry;

/// A bundle of extensions and resource types for one backend.
///
/// Providers register everything exactly once at bootstrap. Registration
/// performs no I/O.
pub trait ExtensionProvider: Send + Sync {
    /// Provider name, e.g. `kafka` or `schema-registry`.
    fn name(&self) -> &str;

    /// How this provider embeds its name in extension type names.
    fn naming(&self) -> NamingConvention {
        NamingConvention::for_provider(self.name(), AffixPosition::Prefix)
    }

    fn register_extensions(&self, registrar: &mut ProviderRegistrar<'_>) -> Result<()>;

    fn register_resources(&self, _registry: &mut ResourceRegistry) -> Result<()> {
        Ok(())
    }
}

/// Registers extensions on behalf of one provider.
///
/// Stamps the provider name on every descriptor and adds the aliases derived
/// from the provider's naming convention.
pub struct ProviderRegistrar<'a> {
    registry: &'a mut ExtensionRegistry,
    provider: String,
    naming: NamingConvention,
}

impl<'a> ProviderRegistrar<'a> {
    pub fn new(registry: &'a mut ExtensionRegistry, provider: &dyn ExtensionProvider) -> Self {
        Self {
            registry,
            provider: provider.name().to_string(),
            naming: provider.naming(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn register<T: ?Sized + 'static>(&mut self, descriptor: ExtensionDescriptor<T>) -> Result<()> {
        let descriptor = descriptor
            .with_provider(self.provider.clone())
            .with_naming(&self.naming);
        self.registry.register(descriptor)
    }
}
