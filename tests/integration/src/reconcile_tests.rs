//! End-to-end reconciliation through a bootstrapped runtime
//!
//! Each test wires the `test` provider over an in-memory cluster, then runs
//! the full flow: transform, stamp, validate, collect, plan, execute, report.

use converge_core::{
    ChangeStatus, Error, Operation, ReconciliationContext, ReconciliationMode, ReconciliationReport,
    Runtime,
};
use converge_extensions::{Configuration, ExtensionProvider};
use converge_resources::{GenericResource, ObjectMeta, ResourceType};
use converge_test_utils::{
    CollectingReporter, InMemoryCluster, RecordingHandler, TOPIC_GROUP, TestProvider, topic,
    topic_type,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn runtime(provider: &TestProvider) -> Runtime {
    let providers: Vec<Box<dyn ExtensionProvider>> = vec![Box::new(provider.clone())];
    Runtime::bootstrap(&providers).unwrap()
}

fn reconcile(
    provider: &TestProvider,
    desired: Vec<GenericResource>,
    context: &ReconciliationContext,
) -> converge_core::Result<ReconciliationReport> {
    runtime(provider)
        .reconciler()
        .reconcile_blocking(&topic_type(), desired, context)
}

fn deleting_orphans() -> ReconciliationContext {
    ReconciliationContext::new().with_configuration(Configuration::new().with("delete-orphans", true))
}

fn summary(report: &ReconciliationReport) -> Vec<(String, Operation, ChangeStatus)> {
    report
        .results
        .iter()
        .map(|r| (r.change.name().to_string(), r.change.op, r.status))
        .collect()
}

fn row(name: &str, op: Operation, status: ChangeStatus) -> (String, Operation, ChangeStatus) {
    (name.to_string(), op, status)
}

#[test]
fn test_create_update_and_delete_orphans() {
    let cluster = InMemoryCluster::new()
        .with(topic("orders", 1))
        .with(topic("audit", 1))
        .with(topic("stale", 1));
    let provider = TestProvider::new(cluster.clone());

    let desired = vec![topic("orders", 6), topic("audit", 1), topic("payments", 2)];
    let report = reconcile(&provider, desired.clone(), &deleting_orphans()).unwrap();

    assert_eq!(
        summary(&report),
        vec![
            row("orders", Operation::Update, ChangeStatus::Changed),
            row("audit", Operation::None, ChangeStatus::Ok),
            row("payments", Operation::Create, ChangeStatus::Changed),
            row("stale", Operation::Delete, ChangeStatus::Changed),
        ]
    );
    assert!(!report.has_failures());
    assert_eq!(provider.handler().calls(), 1);
    assert_eq!(cluster.names(), vec!["audit", "orders", "payments"]);
    assert_eq!(cluster.get("orders").unwrap().spec["partitions"], json!(6));

    // A second pass finds nothing to do.
    let again = reconcile(&provider, desired, &deleting_orphans()).unwrap();
    assert_eq!(again.ok_count(), 3);
    assert_eq!(again.changed_count(), 0);
    assert_eq!(provider.handler().calls(), 1);
}

#[test]
fn test_orphans_are_kept_by_default() {
    let cluster = InMemoryCluster::new().with(topic("stale", 1));
    let provider = TestProvider::new(cluster.clone());

    let report = reconcile(&provider, vec![topic("orders", 1)], &ReconciliationContext::new()).unwrap();

    assert_eq!(
        summary(&report),
        vec![row("orders", Operation::Create, ChangeStatus::Changed)]
    );
    assert_eq!(cluster.names(), vec!["orders", "stale"]);
}

#[test]
fn test_delete_annotation_removes_resource() {
    let cluster = InMemoryCluster::new().with(topic("orders", 1));
    let provider = TestProvider::new(cluster.clone());

    let desired = vec![
        topic("orders", 1).with_annotation(converge_resources::ANNOTATION_DELETE, true),
        topic("ghost", 1).with_annotation(converge_resources::ANNOTATION_DELETE, true),
    ];
    let report = reconcile(&provider, desired, &ReconciliationContext::new()).unwrap();

    assert_eq!(
        summary(&report),
        vec![
            row("orders", Operation::Delete, ChangeStatus::Changed),
            row("ghost", Operation::None, ChangeStatus::Ok),
        ]
    );
    assert!(cluster.is_empty());
}

#[test]
fn test_dry_run_applies_nothing() {
    let cluster = InMemoryCluster::new().with(topic("orders", 1)).with(topic("stale", 1));
    let provider = TestProvider::new(cluster.clone());

    let context = deleting_orphans().with_dry_run(true);
    let report = reconcile(&provider, vec![topic("orders", 3), topic("payments", 1)], &context).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.changed_count(), 3);
    assert!(report.results.iter().all(|r| !r.applied));
    assert_eq!(provider.handler().calls(), 0);
    assert_eq!(cluster.get("orders").unwrap().spec["partitions"], json!(1));
    assert_eq!(cluster.names(), vec!["orders", "stale"]);
}

#[test]
fn test_partial_failure_is_isolated() {
    let cluster = InMemoryCluster::new();
    let handler = RecordingHandler::new()
        .with_cluster(cluster.clone())
        .failing_on("payments");
    let provider = TestProvider::new(cluster.clone()).with_handler(handler);

    let report = reconcile(
        &provider,
        vec![topic("orders", 1), topic("payments", 1), topic("audit", 1)],
        &ReconciliationContext::new(),
    )
    .unwrap();

    assert_eq!(
        summary(&report),
        vec![
            row("orders", Operation::Create, ChangeStatus::Changed),
            row("payments", Operation::Create, ChangeStatus::Failed),
            row("audit", Operation::Create, ChangeStatus::Changed),
        ]
    );
    assert!(report.has_failures());
    assert!(report.results[1].errors[0].contains("payments"));
    assert_eq!(cluster.names(), vec!["audit", "orders"]);
}

#[test]
fn test_validation_failures_abort_before_any_change() {
    let cluster = InMemoryCluster::new();
    let provider = TestProvider::new(cluster.clone()).with_validation();

    let context = ReconciliationContext::new()
        .with_configuration(Configuration::new().with("min-partitions", 3));
    let err = reconcile(
        &provider,
        vec![topic("orders", 1), topic("payments", 6), topic("audit", 2)],
        &context,
    )
    .unwrap_err();

    let Error::Validation(failures) = err else {
        panic!("expected validation failure, got {err}");
    };
    assert_eq!(failures.len(), 2);
    let names: Vec<&serde_json::Value> = failures
        .errors
        .iter()
        .map(|e| &e.details["resource"])
        .collect();
    assert_eq!(names, vec![&json!("orders"), &json!("audit")]);
    assert_eq!(provider.handler().calls(), 0);
    assert!(cluster.is_empty());
}

#[test]
fn test_transformation_runs_before_validation() {
    let cluster = InMemoryCluster::new();
    let provider = TestProvider::new(cluster.clone())
        .with_transformation()
        .with_validation();

    let bare = GenericResource::new(&topic_type(), "orders").with_spec(json!({"replicas": 1}));
    let context = ReconciliationContext::new().with_configuration(
        Configuration::new()
            .with("default-partitions", 4)
            .with("min-partitions", 2),
    );
    let report = reconcile(&provider, vec![bare], &context).unwrap();

    assert_eq!(report.changed_count(), 1);
    assert_eq!(
        cluster.get("orders").unwrap().spec,
        json!({"partitions": 4, "replicas": 1})
    );
}

#[test]
fn test_context_labels_are_stamped() {
    let cluster = InMemoryCluster::new();
    let provider = TestProvider::new(cluster.clone());

    let context = ReconciliationContext::new()
        .with_label("managed-by", "converge")
        .with_label("team", "platform")
        .with_annotation("converge.io/source", "integration");
    let desired = vec![topic("orders", 1).with_label("team", "payments")];
    reconcile(&provider, desired, &context).unwrap();

    let created = cluster.get("orders").unwrap();
    assert_eq!(created.metadata.label("managed-by"), Some(&json!("converge")));
    assert_eq!(created.metadata.label("team"), Some(&json!("payments")));
    assert_eq!(
        created.metadata.annotation("converge.io/source"),
        Some(&json!("integration"))
    );
}

#[test]
fn test_selectors_scope_both_sides() {
    let cluster = InMemoryCluster::new()
        .with(topic("payments-old", 1).with_label("team", "payments"))
        .with(topic("search-old", 1).with_label("team", "search"));
    let provider = TestProvider::new(cluster.clone());

    let context = deleting_orphans().with_selector(|meta: &ObjectMeta, _: &ResourceType| {
        meta.label("team") == Some(&json!("payments"))
    });
    let desired = vec![
        topic("payments-new", 1).with_label("team", "payments"),
        topic("search-new", 1).with_label("team", "search"),
    ];
    let report = reconcile(&provider, desired, &context).unwrap();

    assert_eq!(
        summary(&report),
        vec![
            row("payments-new", Operation::Create, ChangeStatus::Changed),
            row("payments-old", Operation::Delete, ChangeStatus::Changed),
        ]
    );
    assert_eq!(cluster.names(), vec!["payments-new", "search-old"]);
}

#[test]
fn test_resources_outside_selectors_are_not_validated() {
    let cluster = InMemoryCluster::new();
    let provider = TestProvider::new(cluster.clone()).with_validation();

    let context = ReconciliationContext::new()
        .with_configuration(Configuration::new().with("min-partitions", 3))
        .with_selector(|meta: &ObjectMeta, _: &ResourceType| {
            meta.label("team") == Some(&json!("payments"))
        });
    let desired = vec![
        topic("payments", 6).with_label("team", "payments"),
        topic("search", 1).with_label("team", "search"),
    ];
    let report = reconcile(&provider, desired, &context).unwrap();

    assert_eq!(
        summary(&report),
        vec![row("payments", Operation::Create, ChangeStatus::Changed)]
    );
    assert_eq!(cluster.names(), vec!["payments"]);
}

#[test]
fn test_mode_restricts_operations() {
    let cluster = InMemoryCluster::new().with(topic("orders", 1)).with(topic("stale", 1));
    let provider = TestProvider::new(cluster.clone());

    let context = deleting_orphans().with_mode(ReconciliationMode::Create);
    let report = reconcile(&provider, vec![topic("orders", 9), topic("payments", 1)], &context).unwrap();

    assert_eq!(
        summary(&report),
        vec![row("payments", Operation::Create, ChangeStatus::Changed)]
    );
    assert_eq!(report.mode, ReconciliationMode::Create);
    assert_eq!(cluster.get("orders").unwrap().spec["partitions"], json!(1));
    assert!(cluster.get("stale").is_some());
}

#[test]
fn test_reporters_receive_results() {
    let reporter = CollectingReporter::new();
    let provider = TestProvider::new(InMemoryCluster::new()).with_reporter(reporter.clone());

    let report = reconcile(&provider, vec![topic("orders", 1)], &ReconciliationContext::new()).unwrap();

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0], report.results);
}

#[test]
fn test_latest_version_is_resolved() {
    let provider = TestProvider::new(InMemoryCluster::new()).with_versions(&["v1", "v2beta1", "v2"]);

    let report = runtime(&provider)
        .reconciler()
        .reconcile_blocking(
            &ResourceType::new("Topic", TOPIC_GROUP, ""),
            vec![topic("orders", 1)],
            &ReconciliationContext::new(),
        )
        .unwrap();

    assert_eq!(report.resource_type, ResourceType::new("Topic", TOPIC_GROUP, "v2"));
}

#[test]
fn test_unknown_resource_type_fails() {
    let provider = TestProvider::new(InMemoryCluster::new());

    let err = runtime(&provider)
        .reconciler()
        .reconcile_blocking(
            &ResourceType::new("Queue", TOPIC_GROUP, "v1"),
            Vec::<GenericResource>::new(),
            &ReconciliationContext::new(),
        )
        .unwrap_err();

    assert!(matches!(err, Error::Resource(_)), "got {err:?}");
}

#[test]
fn test_collection_failure_aborts() {
    let provider = TestProvider::new(InMemoryCluster::new());

    let context = ReconciliationContext::new()
        .with_configuration(Configuration::new().with("collector.unavailable", true));
    let err = reconcile(&provider, vec![topic("orders", 1)], &context).unwrap_err();

    assert!(matches!(err, Error::Collection { .. }), "got {err:?}");
    assert_eq!(provider.handler().calls(), 0);
}

#[test]
fn test_ill_typed_configuration_aborts() {
    let provider = TestProvider::new(InMemoryCluster::new());

    let context = ReconciliationContext::new()
        .with_configuration(Configuration::new().with("delete-orphans", "sometimes"));
    let err = reconcile(&provider, vec![topic("orders", 1)], &context).unwrap_err();

    assert!(matches!(err, Error::Config(_)), "got {err:?}");
}

#[tokio::test]
async fn test_reconcile_async() {
    let cluster = InMemoryCluster::new();
    let provider = TestProvider::new(cluster.clone());

    let report = runtime(&provider)
        .reconciler()
        .reconcile(&topic_type(), vec![topic("orders", 1)], &ReconciliationContext::new())
        .await
        .unwrap();

    assert_eq!(report.changed_count(), 1);
    assert!(report.finished_at >= report.started_at);
    assert_eq!(cluster.names(), vec!["orders"]);
}
