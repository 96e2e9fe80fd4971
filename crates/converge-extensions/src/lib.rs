//! Extension system for Converge.
//!
//! Providers register pluggable units (collectors, controllers, validations,
//! transformations, reporters, ...) as [`ExtensionDescriptor`]s in a single
//! [`ExtensionRegistry`]. The [`ExtensionFactory`] narrows the registry with
//! [`Qualifier`]s and instantiates configured extensions on demand.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use converge_extensions::{
//!     Configuration, Extension, ExtensionCategory, ExtensionDescriptor, ExtensionFactory,
//!     ExtensionRegistry,
//! };
//!
//! trait Greeter: Extension {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct EnglishGreeter;
//! impl Extension for EnglishGreeter {}
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! let mut registry = ExtensionRegistry::new();
//! registry
//!     .register(ExtensionDescriptor::<dyn Greeter>::of::<EnglishGreeter>(
//!         ExtensionCategory::Action,
//!         || Box::new(EnglishGreeter),
//!     ))
//!     .unwrap();
//!
//! let factory = ExtensionFactory::new(Arc::new(registry));
//! let greeter = factory
//!     .get_extension::<dyn Greeter>("english-greeter", &Configuration::new())
//!     .unwrap();
//! assert_eq!(greeter.greet(), "hello");
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod naming;
pub mod provider;
pub mod qualifier;
pub mod registry;

pub use config::{ConfigProperty, Configuration};
pub use descriptor::{
    Capability, DEFAULT_PRIORITY, Extension, ExtensionCategory, ExtensionDescriptor,
    ExtensionMeta, Supplier,
};
pub use error::{ConfigError, Error, Result};
pub use factory::ExtensionFactory;
pub use naming::{AffixPosition, NamingConvention, derive_aliases, simple_type_name, to_kebab_case};
pub use provider::{ExtensionProvider, ProviderRegistrar};
pub use qualifier::{Qualifier, by_any_qualifiers, by_qualifiers};
pub use registry::ExtensionRegistry;
