//! Resource types and the resource registry for Converge.
//!
//! This crate is the leaf of the workspace. It provides:
//!
//! - [`ResourceType`]: the `(kind, group, apiVersion)` triple identifying a
//!   resource representation
//! - [`ApiVersion`]: a total, semver-aware ordering over API version strings
//! - [`ResourceDescriptor`] and [`ResourceRegistry`]: naming metadata and
//!   "resolve to latest version" lookup
//! - [`GenericResource`], [`ObjectMeta`] and [`HasMetadata`]: the generic
//!   resource model consumed by the reconciliation core
//!
//! # Example
//!
//! ```
//! use converge_resources::{ResourceDescriptor, ResourceRegistry, ResourceType};
//!
//! struct Topic;
//!
//! let mut registry = ResourceRegistry::new();
//! registry
//!     .register(ResourceDescriptor::of::<Topic>(ResourceType::new("Topic", "kafka", "v1")))
//!     .unwrap();
//! registry
//!     .register(ResourceDescriptor::of::<Topic>(ResourceType::new("Topic", "kafka", "v2")))
//!     .unwrap();
//!
//! let latest = registry.resolve("Topic", "kafka").unwrap();
//! assert_eq!(latest.resource_type().api_version, "v2");
//! ```

pub mod descriptor;
pub mod error;
pub mod model;
pub mod registry;
pub mod resource_type;
pub mod version;

pub use descriptor::ResourceDescriptor;
pub use error::{Error, Result};
pub use model::{ANNOTATION_DELETE, GenericResource, HasMetadata, ObjectMeta};
pub use registry::ResourceRegistry;
pub use resource_type::ResourceType;
pub use version::ApiVersion;
