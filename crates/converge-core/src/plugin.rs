//! Extension points implemented by providers
//!
//! Every trait here extends [`Extension`], so implementations are
//! registered in the extension registry and instantiated through the
//! factory.

use std::sync::Arc;

use async_trait::async_trait;
use converge_extensions::{Configuration, Extension, simple_type_name};
use converge_resources::HasMetadata;
use serde::Serialize;

use crate::Result;
use crate::change::{ChangeResult, ResourceChange};
use crate::computer::ChangeComputer;
use crate::context::ReconciliationContext;
use crate::executor::{ChangeExecutor, ChangeHandler};
use crate::validation::ValidationFailures;

/// Bounds every resource representation must meet to be reconciled.
pub trait Resource: HasMetadata + Clone + Serialize + Send + Sync + 'static {}

impl<T> Resource for T where T: HasMetadata + Clone + Serialize + Send + Sync + 'static {}

/// Produces the observed state of a resource kind.
#[async_trait]
pub trait Collector<R: Resource>: Extension {
    async fn list_resources(&self, configuration: &Configuration) -> Result<Vec<R>>;
}

/// Owns the change handlers able to apply changes for a resource kind.
pub trait Controller<R: Resource>: Extension {
    fn change_handlers(&self) -> Vec<Arc<dyn ChangeHandler>>;

    /// The computer used by [`plan`](Self::plan). Keyed by name, with the
    /// orphan policy read from the `delete-orphans` property.
    fn computer(&self, context: &ReconciliationContext) -> Result<ChangeComputer<R, String>> {
        Ok(ChangeComputer::by_name().with_delete_orphans(context.delete_orphans()?))
    }

    fn plan(
        &self,
        observed: &[R],
        desired: &[R],
        context: &ReconciliationContext,
    ) -> Result<Vec<ResourceChange>> {
        Ok(self.computer(context)?.compute_changes(observed, desired))
    }

    fn executor(&self) -> ChangeExecutor {
        ChangeExecutor::new(self.change_handlers())
    }
}

/// Checks a desired resource before reconciliation.
pub trait Validation<R>: Extension {
    /// Name reported in validation errors.
    fn name(&self) -> String {
        simple_type_name(std::any::type_name::<Self>()).to_string()
    }

    fn validate(&self, resource: &R) -> std::result::Result<(), ValidationFailures>;
}

/// Rewrites desired resources before validation.
pub trait Transformation<R>: Extension {
    fn name(&self) -> String {
        simple_type_name(std::any::type_name::<Self>()).to_string()
    }

    /// Return the rewritten resource, or `None` to drop it.
    fn transform(&self, resource: R, context: &ReconciliationContext) -> Result<Option<R>>;
}

/// Receives the results of a reconciliation.
pub trait Reporter: Extension {
    fn report(&self, results: &[ChangeResult]) -> Result<()>;
}
