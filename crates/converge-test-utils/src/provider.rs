//! [`TestProvider`] and the extensions it registers.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use converge_core::{
    ChangeHandler, ChangeResult, Collector, Controller, Error, ReconciliationContext, Reporter,
    Result, Transformation, Validation, ValidationError, ValidationFailures,
};
use converge_extensions::{
    ConfigError, ConfigProperty, Configuration, Extension, ExtensionCategory, ExtensionDescriptor,
    ExtensionProvider, ProviderRegistrar,
};
use converge_resources::{GenericResource, ResourceDescriptor, ResourceRegistry, ResourceType};
use serde_json::Value;

use crate::cluster::InMemoryCluster;
use crate::handler::RecordingHandler;
use crate::{TOPIC_GROUP, topic_type_at};

/// Lists the resources of an [`InMemoryCluster`].
///
/// Setting `collector.unavailable = true` makes collection fail.
pub struct InMemoryCollector {
    cluster: InMemoryCluster,
    unavailable: bool,
}

impl InMemoryCollector {
    pub fn new(cluster: InMemoryCluster) -> Self {
        Self {
            cluster,
            unavailable: false,
        }
    }
}

impl Extension for InMemoryCollector {
    fn configure(&mut self, config: &Configuration) -> std::result::Result<(), ConfigError> {
        self.unavailable = ConfigProperty::new("collector.unavailable")
            .with_default(false)
            .get(config)?;
        Ok(())
    }
}

#[async_trait]
impl Collector<GenericResource> for InMemoryCollector {
    async fn list_resources(&self, _configuration: &Configuration) -> Result<Vec<GenericResource>> {
        if self.unavailable {
            return Err(Error::Collection {
                kind: "Topic".to_string(),
                message: "cluster unavailable".to_string(),
            });
        }
        Ok(self.cluster.resources())
    }
}

/// Applies `Topic` changes through a [`RecordingHandler`].
pub struct TopicController {
    handler: RecordingHandler,
}

impl TopicController {
    pub fn new(handler: RecordingHandler) -> Self {
        Self { handler }
    }
}

impl Extension for TopicController {}

impl Controller<GenericResource> for TopicController {
    fn change_handlers(&self) -> Vec<Arc<dyn ChangeHandler>> {
        vec![Arc::new(self.handler.clone())]
    }
}

/// Rejects topics with fewer than `min-partitions` partitions (default 1).
pub struct MinPartitions {
    min: u64,
}

impl Default for MinPartitions {
    fn default() -> Self {
        Self { min: 1 }
    }
}

impl Extension for MinPartitions {
    fn configure(&mut self, config: &Configuration) -> std::result::Result<(), ConfigError> {
        self.min = ConfigProperty::new("min-partitions")
            .with_default(1u64)
            .get(config)?;
        Ok(())
    }
}

impl Validation<GenericResource> for MinPartitions {
    fn validate(&self, resource: &GenericResource) -> std::result::Result<(), ValidationFailures> {
        let partitions = resource.spec.get("partitions").and_then(Value::as_u64).unwrap_or(0);
        if partitions < self.min {
            return Err(ValidationError::new(
                self.name(),
                format!("expected at least {} partitions, got {partitions}", self.min),
            )
            .into());
        }
        Ok(())
    }
}

/// Fills in `partitions` when a topic omits it, from `default-partitions`
/// (default 3).
pub struct WithDefaultPartitions {
    partitions: u64,
}

impl Default for WithDefaultPartitions {
    fn default() -> Self {
        Self { partitions: 3 }
    }
}

impl Extension for WithDefaultPartitions {
    fn configure(&mut self, config: &Configuration) -> std::result::Result<(), ConfigError> {
        self.partitions = ConfigProperty::new("default-partitions")
            .with_default(3u64)
            .get(config)?;
        Ok(())
    }
}

impl Transformation<GenericResource> for WithDefaultPartitions {
    fn transform(
        &self,
        mut resource: GenericResource,
        _context: &ReconciliationContext,
    ) -> Result<Option<GenericResource>> {
        if let Value::Object(spec) = &mut resource.spec
            && !spec.contains_key("partitions")
        {
            spec.insert("partitions".to_string(), Value::from(self.partitions));
        }
        Ok(Some(resource))
    }
}

/// Keeps every batch of results it receives.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    reports: Arc<Mutex<Vec<Vec<ChangeResult>>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Vec<ChangeResult>> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Extension for CollectingReporter {}

impl Reporter for CollectingReporter {
    fn report(&self, results: &[ChangeResult]) -> Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(results.to_vec());
        Ok(())
    }
}

/// A provider named `test` managing `Topic` resources in an
/// [`InMemoryCluster`].
///
/// The collector and controller are always registered. Validation,
/// transformation and reporting are opt-in.
#[derive(Debug, Clone)]
pub struct TestProvider {
    cluster: InMemoryCluster,
    handler: RecordingHandler,
    versions: Vec<String>,
    validation: bool,
    transformation: bool,
    reporter: Option<CollectingReporter>,
}

impl TestProvider {
    /// The handler writes applied changes back to `cluster`.
    pub fn new(cluster: InMemoryCluster) -> Self {
        let handler = RecordingHandler::new().with_cluster(cluster.clone());
        Self {
            cluster,
            handler,
            versions: vec!["v1".to_string()],
            validation: false,
            transformation: false,
            reporter: None,
        }
    }

    pub fn with_handler(mut self, handler: RecordingHandler) -> Self {
        self.handler = handler;
        self
    }

    /// Register `Topic` at each of `versions` instead of `v1` only.
    pub fn with_versions(mut self, versions: &[&str]) -> Self {
        self.versions = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn with_validation(mut self) -> Self {
        self.validation = true;
        self
    }

    pub fn with_transformation(mut self) -> Self {
        self.transformation = true;
        self
    }

    pub fn with_reporter(mut self, reporter: CollectingReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn handler(&self) -> &RecordingHandler {
        &self.handler
    }

    pub fn cluster(&self) -> &InMemoryCluster {
        &self.cluster
    }
}

fn any_topic_version() -> ResourceType {
    ResourceType::new("Topic", TOPIC_GROUP, "")
}

impl ExtensionProvider for TestProvider {
    fn name(&self) -> &str {
        "test"
    }

    fn register_resources(&self, registry: &mut ResourceRegistry) -> converge_extensions::Result<()> {
        for version in &self.versions {
            registry.register(
                ResourceDescriptor::of::<GenericResource>(topic_type_at(version))
                    .with_plural_name("topics"),
            )?;
        }
        Ok(())
    }

    fn register_extensions(&self, registrar: &mut ProviderRegistrar<'_>) -> converge_extensions::Result<()> {
        let cluster = self.cluster.clone();
        registrar.register(
            ExtensionDescriptor::<dyn Collector<GenericResource>>::of::<InMemoryCollector>(
                ExtensionCategory::Collector,
                move || Box::new(InMemoryCollector::new(cluster.clone())),
            )
            .supporting(any_topic_version()),
        )?;

        let handler = self.handler.clone();
        registrar.register(
            ExtensionDescriptor::<dyn Controller<GenericResource>>::of::<TopicController>(
                ExtensionCategory::Controller,
                move || Box::new(TopicController::new(handler.clone())),
            )
            .supporting(any_topic_version()),
        )?;

        if self.validation {
            registrar.register(
                ExtensionDescriptor::<dyn Validation<GenericResource>>::of::<MinPartitions>(
                    ExtensionCategory::Validation,
                    || Box::new(MinPartitions::default()),
                )
                .supporting(any_topic_version()),
            )?;
        }

        if self.transformation {
            registrar.register(
                ExtensionDescriptor::<dyn Transformation<GenericResource>>::of::<
                    WithDefaultPartitions,
                >(ExtensionCategory::Transformation, || {
                    Box::new(WithDefaultPartitions::default())
                })
                .supporting(any_topic_version()),
            )?;
        }

        if let Some(reporter) = &self.reporter {
            let reporter = reporter.clone();
            registrar.register(ExtensionDescriptor::<dyn Reporter>::of::<CollectingReporter>(
                ExtensionCategory::Reporter,
                move || Box::new(reporter.clone()),
            ))?;
        }

        tracing::debug!(versions = ?self.versions, "Registered test provider");
        Ok(())
    }
}
