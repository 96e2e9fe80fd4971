//! Reconciliation core for Converge.
//!
//! Computes the changes converging observed resources to their desired state
//! and applies them through provider change handlers.
//!
//! - [`ChangeComputer`] diffs keyed collections into [`ResourceChange`]s
//! - [`ChangeExecutor`] routes changes to [`ChangeHandler`]s and collects
//!   [`ChangeResult`]s, honoring dry runs
//! - [`Reconciler`] drives a full cycle through the extension factory
//!
//! # Example
//!
//! ```
//! use converge_core::{ChangeComputer, ChangeExecutor, Operation, ReconciliationContext};
//! use converge_resources::{GenericResource, ResourceType};
//! use serde_json::json;
//!
//! let topic = ResourceType::new("Topic", "kafka.converge.io", "v1");
//! let observed = vec![GenericResource::new(&topic, "orders").with_spec(json!({"partitions": 3}))];
//! let desired = vec![
//!     GenericResource::new(&topic, "orders").with_spec(json!({"partitions": 6})),
//!     GenericResource::new(&topic, "payments").with_spec(json!({"partitions": 1})),
//! ];
//!
//! let changes = ChangeComputer::by_name().compute_changes(&observed, &desired);
//! let ops: Vec<Operation> = changes.iter().map(|c| c.op).collect();
//! assert_eq!(ops, vec![Operation::Update, Operation::Create]);
//!
//! let results = ChangeExecutor::default().execute_blocking(&ReconciliationContext::dry_run(), changes);
//! assert_eq!(results.len(), 2);
//! ```

pub mod bootstrap;
pub mod change;
pub mod computer;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod logging;
pub mod plugin;
pub mod pool;
pub mod reconciler;
pub mod transformation;
pub mod validation;

pub use bootstrap::Runtime;
pub use change::{ChangeResult, ChangeStatus, Operation, ResourceChange, StateChange};
pub use computer::{ChangeComputer, diff_resources};
pub use context::{
    DELETE_ORPHANS_KEY, ReconciliationContext, ReconciliationMode, ResourceSelector,
    delete_orphans_property,
};
pub use error::{ChangeApplicationError, Error, Result};
pub use executor::{ChangeExecutor, ChangeFuture, ChangeHandler};
pub use plugin::{Collector, Controller, Reporter, Resource, Transformation, Validation};
pub use pool::{Lease, SharedPool};
pub use reconciler::{ReconciliationReport, Reconciler};
pub use transformation::TransformationPipeline;
pub use validation::{ValidationChain, ValidationError, ValidationFailures};

pub use async_trait::async_trait;
