//! Shared test fixtures for the Converge workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`cluster`]: [`InMemoryCluster`], an observed state that change
//!   handlers write back to
//! - [`handler`]: [`RecordingHandler`] with scripted failures
//! - [`provider`]: [`TestProvider`] wiring a collector, a controller and
//!   optional validations, transformations and reporters for `Topic`s

pub mod cluster;
pub mod handler;
pub mod provider;

pub use cluster::InMemoryCluster;
pub use handler::RecordingHandler;
pub use provider::{
    CollectingReporter, InMemoryCollector, MinPartitions, TestProvider, TopicController,
    WithDefaultPartitions,
};

use converge_resources::{GenericResource, ResourceType};
use serde_json::json;

pub const TOPIC_GROUP: &str = "kafka.converge.io";

/// `Topic` at the given version.
pub fn topic_type_at(version: &str) -> ResourceType {
    ResourceType::new("Topic", TOPIC_GROUP, version)
}

/// `Topic (kafka.converge.io/v1)`.
pub fn topic_type() -> ResourceType {
    topic_type_at("v1")
}

/// A `Topic` with `partitions` and a single replica.
pub fn topic(name: &str, partitions: u64) -> GenericResource {
    GenericResource::new(&topic_type(), name)
        .with_spec(json!({ "partitions": partitions, "replicas": 1 }))
}
