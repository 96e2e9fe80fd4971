//! Reconciliation orchestration
//!
//! The Reconciler drives one full cycle for a resource kind:
//! - transform, stamp, select and validate the desired resources
//! - collect and select the observed state
//! - plan and execute changes through the controller
//! - hand the results to every reporter

use std::sync::Arc;

use chrono::{DateTime, Utc};
use converge_extensions::{ExtensionFactory, Qualifier};
use converge_resources::{ResourceRegistry, ResourceType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;
use crate::change::{ChangeResult, ChangeStatus};
use crate::context::{ReconciliationContext, ReconciliationMode};
use crate::plugin::{Collector, Controller, Reporter, Resource, Transformation, Validation};
use crate::transformation::TransformationPipeline;
use crate::validation::ValidationChain;

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub id: Uuid,
    pub resource_type: ResourceType,
    pub mode: ReconciliationMode,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ChangeResult>,
}

impl ReconciliationReport {
    pub fn count(&self, status: ChangeStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn ok_count(&self) -> usize {
        self.count(ChangeStatus::Ok)
    }

    pub fn changed_count(&self) -> usize {
        self.count(ChangeStatus::Changed)
    }

    pub fn failed_count(&self) -> usize {
        self.count(ChangeStatus::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(ChangeResult::is_failed)
    }
}

/// Reconciles desired resources of one kind against their observed state.
#[derive(Debug, Clone)]
pub struct Reconciler {
    factory: ExtensionFactory,
    resources: Arc<ResourceRegistry>,
}

impl Reconciler {
    pub fn new(factory: ExtensionFactory, resources: Arc<ResourceRegistry>) -> Self {
        Self { factory, resources }
    }

    pub fn factory(&self) -> &ExtensionFactory {
        &self.factory
    }

    /// Run one reconciliation.
    ///
    /// `resource_type` may omit its version, in which case the latest
    /// registered version is used. Selectors run on the stamped desired
    /// resources before validation, so resources they exclude are never
    /// validated. Extension resolution, configuration,
    /// collection and validation errors abort before any change is applied;
    /// failures applying individual changes are reported in the results.
    pub async fn reconcile<R: Resource>(
        &self,
        resource_type: &ResourceType,
        desired: Vec<R>,
        context: &ReconciliationContext,
    ) -> Result<ReconciliationReport> {
        let started_at = Utc::now();
        let id = Uuid::new_v4();
        let resource_type = self.resources.resolve_type(resource_type)?.resource_type().clone();
        let config = &context.configuration;

        tracing::info!(
            %id,
            resource_type = %resource_type,
            mode = %context.mode,
            dry_run = context.dry_run,
            "Starting reconciliation"
        );

        let supports = [Qualifier::SupportsResourceType(resource_type.clone())];
        let collector = self
            .factory
            .get_extension_with::<dyn Collector<R>>(&supports, config)?;
        let controller = self
            .factory
            .get_extension_with::<dyn Controller<R>>(&supports, config)?;
        let pipeline = TransformationPipeline::new(
            self.factory
                .get_all_for_resource::<dyn Transformation<R>>(&resource_type, config)?,
        );
        let validations = ValidationChain::new(
            self.factory
                .get_all_for_resource::<dyn Validation<R>>(&resource_type, config)?,
        );
        let reporters = self.factory.get_all_extensions::<dyn Reporter>(config)?;

        let mut desired = pipeline.apply(desired, context)?;
        for resource in &mut desired {
            context.stamp(resource.metadata_mut());
        }
        desired.retain(|r| context.accepts(r.metadata(), &resource_type));
        validations.validate(&desired)?;

        let mut observed = collector.list_resources(config).await?;
        observed.retain(|r| context.accepts(r.metadata(), &resource_type));
        tracing::debug!(
            observed = observed.len(),
            desired = desired.len(),
            "Computing changes"
        );

        let changes = controller.plan(&observed, &desired, context)?;
        let results = controller.executor().execute(context, changes).await;

        for reporter in &reporters {
            if let Err(err) = reporter.report(&results) {
                tracing::warn!(error = %err, "Reporter failed");
            }
        }

        let report = ReconciliationReport {
            id,
            resource_type,
            mode: context.mode,
            dry_run: context.dry_run,
            started_at,
            finished_at: Utc::now(),
            results,
        };

        tracing::info!(
            %id,
            ok = report.ok_count(),
            changed = report.changed_count(),
            failed = report.failed_count(),
            "Finished reconciliation"
        );
        Ok(report)
    }

    /// Run [`reconcile`](Self::reconcile) on the calling thread.
    pub fn reconcile_blocking<R: Resource>(
        &self,
        resource_type: &ResourceType,
        desired: Vec<R>,
        context: &ReconciliationContext,
    ) -> Result<ReconciliationReport> {
        futures::executor::block_on(self.reconcile(resource_type, desired, context))
    }
}
