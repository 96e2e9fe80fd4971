//! Extension resolution across several providers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use converge_core::{
    ChangeResult, ChangeStatus, Collector, Error, Operation, Reconciler, ReconciliationContext,
    Reporter, Result as CoreResult, Runtime,
};
use converge_extensions::{
    ConfigError, Configuration, Extension, ExtensionCategory, ExtensionDescriptor, ExtensionProvider,
    ProviderRegistrar, Qualifier, Result,
};
use converge_resources::{GenericResource, ResourceType};
use converge_test_utils::{
    CollectingReporter, InMemoryCluster, InMemoryCollector, TOPIC_GROUP, TestProvider, topic,
    topic_type,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Mirrors the `test` provider's collector under its own name.
struct MirrorProvider {
    cluster: InMemoryCluster,
}

impl ExtensionProvider for MirrorProvider {
    fn name(&self) -> &str {
        "mirror"
    }

    fn register_extensions(&self, registrar: &mut ProviderRegistrar<'_>) -> Result<()> {
        let cluster = self.cluster.clone();
        registrar.register(
            ExtensionDescriptor::<dyn Collector<GenericResource>>::of::<InMemoryCollector>(
                ExtensionCategory::Collector,
                move || Box::new(InMemoryCollector::new(cluster.clone())),
            )
            .supporting(ResourceType::new("Topic", TOPIC_GROUP, "")),
        )
    }
}

/// Appends its name to a shared log on every report.
struct AuditReporter {
    name: &'static str,
    log: ReportLog,
}

type ReportLog = Arc<Mutex<Vec<&'static str>>>;

impl Extension for AuditReporter {}
impl Reporter for AuditReporter {
    fn report(&self, _results: &[ChangeResult]) -> CoreResult<()> {
        self.log.lock().unwrap().push(self.name);
        Ok(())
    }
}

/// Registers reporters with explicit priorities, one of them disabled.
#[derive(Default)]
struct ReportingProvider {
    log: ReportLog,
}

impl ExtensionProvider for ReportingProvider {
    fn name(&self) -> &str {
        "reporting"
    }

    fn register_extensions(&self, registrar: &mut ProviderRegistrar<'_>) -> Result<()> {
        for (name, priority, enabled) in [("late", 10, true), ("early", -5, true), ("off", 0, false)] {
            let log = Arc::clone(&self.log);
            registrar.register(
                ExtensionDescriptor::<dyn Reporter>::new(name, ExtensionCategory::Reporter, move || {
                    Box::new(AuditReporter {
                        name,
                        log: Arc::clone(&log),
                    })
                })
                .with_priority(priority)
                .with_enabled(enabled),
            )?;
        }
        Ok(())
    }
}

/// Fails every report because its endpoint is never configured.
struct UnreachableReporter {
    calls: Arc<AtomicUsize>,
}

impl Extension for UnreachableReporter {}
impl Reporter for UnreachableReporter {
    fn report(&self, _results: &[ChangeResult]) -> CoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Config(ConfigError::MissingProperty {
            key: "audit.endpoint".to_string(),
        }))
    }
}

/// Registers [`UnreachableReporter`] ahead of every default-priority reporter.
#[derive(Default)]
struct UnreachableProvider {
    calls: Arc<AtomicUsize>,
}

impl ExtensionProvider for UnreachableProvider {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn register_extensions(&self, registrar: &mut ProviderRegistrar<'_>) -> Result<()> {
        let calls = Arc::clone(&self.calls);
        registrar.register(
            ExtensionDescriptor::<dyn Reporter>::of::<UnreachableReporter>(
                ExtensionCategory::Reporter,
                move || {
                    Box::new(UnreachableReporter {
                        calls: Arc::clone(&calls),
                    })
                },
            )
            .with_priority(-10),
        )
    }
}

fn bootstrap(providers: Vec<Box<dyn ExtensionProvider>>) -> Runtime {
    Runtime::bootstrap(&providers).unwrap()
}

#[test]
fn test_two_collectors_for_one_type_are_ambiguous() {
    let cluster = InMemoryCluster::new();
    let runtime = bootstrap(vec![
        Box::new(TestProvider::new(cluster.clone())),
        Box::new(MirrorProvider { cluster }),
    ]);

    let err = runtime
        .reconciler()
        .reconcile_blocking(&topic_type(), vec![topic("orders", 1)], &ReconciliationContext::new())
        .unwrap_err();

    let Error::Extension(converge_extensions::Error::AmbiguousExtension { candidates, .. }) = err else {
        panic!("expected ambiguity, got {err:?}");
    };
    assert_eq!(
        candidates,
        vec!["test/InMemoryCollector", "mirror/InMemoryCollector"]
    );
}

#[test]
fn test_provider_qualifier_narrows_resolution() {
    let cluster = InMemoryCluster::new();
    let runtime = bootstrap(vec![
        Box::new(TestProvider::new(cluster.clone())),
        Box::new(MirrorProvider { cluster }),
    ]);

    let descriptor = runtime
        .factory()
        .resolve_with::<dyn Collector<GenericResource>>(&[
            Qualifier::SupportsResourceType(topic_type()),
            Qualifier::provider("mirror"),
        ])
        .unwrap();
    assert_eq!(descriptor.meta().provider, "mirror");
}

#[rstest]
#[case("InMemoryCollector")]
#[case("in-memory-collector")]
#[case("IN-MEMORY-COLLECTOR")]
fn test_collector_resolves_by_alias(#[case] alias: &str) {
    let runtime = bootstrap(vec![Box::new(TestProvider::new(InMemoryCluster::new()))]);

    let collector = runtime
        .factory()
        .get_extension::<dyn Collector<GenericResource>>(alias, &Configuration::new());
    assert!(collector.is_ok(), "alias {alias} did not resolve");
}

#[test]
fn test_missing_controller_is_reported() {
    let runtime = bootstrap(vec![Box::new(MirrorProvider {
        cluster: InMemoryCluster::new(),
    })]);
    let reconciler = Reconciler::new(
        runtime.factory(),
        Arc::new({
            let mut resources = converge_resources::ResourceRegistry::new();
            resources
                .register(converge_resources::ResourceDescriptor::of::<GenericResource>(topic_type()))
                .unwrap();
            resources
        }),
    );

    let err = reconciler
        .reconcile_blocking(&topic_type(), vec![topic("orders", 1)], &ReconciliationContext::new())
        .unwrap_err();

    assert!(
        matches!(err, Error::Extension(converge_extensions::Error::NoSuchExtension { .. })),
        "got {err:?}"
    );
}

#[test]
fn test_reporters_follow_priority_and_skip_disabled() {
    let provider = ReportingProvider::default();
    let log = Arc::clone(&provider.log);
    let runtime = bootstrap(vec![Box::new(provider)]);

    let registry = runtime.extensions();
    let mut enabled: Vec<(i32, String)> = registry
        .find_all::<dyn Reporter>()
        .into_iter()
        .filter(|d| d.meta().enabled)
        .map(|d| (d.meta().priority(), d.name().to_string()))
        .collect();
    enabled.sort();
    assert_eq!(
        enabled,
        vec![(-5, "early".to_string()), (10, "late".to_string())]
    );

    let reporters = runtime
        .factory()
        .get_all_extensions::<dyn Reporter>(&Configuration::new())
        .unwrap();
    for reporter in &reporters {
        reporter.report(&[]).unwrap();
    }
    assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
}

#[test]
fn test_reporters_from_several_providers_all_run() {
    let collecting = CollectingReporter::new();
    let reporting = ReportingProvider::default();
    let log = Arc::clone(&reporting.log);
    let runtime = bootstrap(vec![
        Box::new(TestProvider::new(InMemoryCluster::new()).with_reporter(collecting.clone())),
        Box::new(reporting),
    ]);

    let report = runtime
        .reconciler()
        .reconcile_blocking(&topic_type(), vec![topic("orders", 1)], &ReconciliationContext::new())
        .unwrap();

    assert_eq!(collecting.reports(), vec![report.results]);
    // early (-5), then the collecting reporter (0), then late (10)
    assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
}

#[test]
fn test_failing_reporter_does_not_mask_results() {
    let cluster = InMemoryCluster::new();
    let collecting = CollectingReporter::new();
    let unreachable = UnreachableProvider::default();
    let calls = Arc::clone(&unreachable.calls);
    let runtime = bootstrap(vec![
        Box::new(unreachable),
        Box::new(TestProvider::new(cluster.clone()).with_reporter(collecting.clone())),
    ]);

    let report = runtime
        .reconciler()
        .reconcile_blocking(&topic_type(), vec![topic("orders", 1)], &ReconciliationContext::new())
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].change.op, Operation::Create);
    assert_eq!(report.results[0].status, ChangeStatus::Changed);
    assert!(!report.has_failures());
    assert_eq!(cluster.names(), vec!["orders"]);
    assert_eq!(collecting.reports(), vec![report.results.clone()]);
}
