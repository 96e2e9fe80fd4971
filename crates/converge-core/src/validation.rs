//! Validation chain
//!
//! Runs every validation over every desired resource and aggregates all
//! failures into one report, so users see every problem in a single pass.

use std::collections::BTreeMap;
use std::fmt;

use converge_resources::HasMetadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::plugin::Validation;

/// One problem found by a validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Name of the validation that failed.
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl ValidationError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Every validation error of a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailures {
    pub errors: Vec<ValidationError>,
}

impl ValidationFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Combine two reports, keeping the order of both.
    pub fn merge(mut self, other: ValidationFailures) -> Self {
        self.errors.extend(other.errors);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationFailures> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationError> for ValidationFailures {
    fn from(error: ValidationError) -> Self {
        Self::single(error)
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailures {}

/// Validations applied in sequence to every resource.
pub struct ValidationChain<R> {
    validations: Vec<Box<dyn Validation<R>>>,
}

impl<R: HasMetadata> ValidationChain<R> {
    /// Validations run in the given order, which is expected to be
    /// priority order.
    pub fn new(validations: Vec<Box<dyn Validation<R>>>) -> Self {
        Self { validations }
    }

    pub fn len(&self) -> usize {
        self.validations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validations.is_empty()
    }

    /// Validate every resource against every validation.
    ///
    /// Each error is tagged with the `resource` name and `kind` it concerns.
    pub fn validate(&self, resources: &[R]) -> Result<(), ValidationFailures> {
        let mut failures = ValidationFailures::new();
        for resource in resources {
            for validation in &self.validations {
                if let Err(found) = validation.validate(resource) {
                    let resource_type = resource.resource_type();
                    for error in found.errors {
                        failures.push(
                            error
                                .with_detail("resource", resource.name())
                                .with_detail("kind", resource_type.kind.clone()),
                        );
                    }
                }
            }
        }

        if !failures.is_empty() {
            tracing::warn!(count = failures.len(), "Validation failed");
        }
        failures.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge_extensions::Extension;
    use converge_resources::{GenericResource, ResourceType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct MinPartitions(u64);
    impl Extension for MinPartitions {}
    impl Validation<GenericResource> for MinPartitions {
        fn validate(&self, resource: &GenericResource) -> Result<(), ValidationFailures> {
            let partitions = resource.spec["partitions"].as_u64().unwrap_or(0);
            if partitions < self.0 {
                return Err(ValidationError::new(
                    self.name(),
                    format!("expected at least {} partitions", self.0),
                )
                .with_detail("partitions", partitions)
                .into());
            }
            Ok(())
        }
    }

    struct NoUppercase;
    impl Extension for NoUppercase {}
    impl Validation<GenericResource> for NoUppercase {
        fn validate(&self, resource: &GenericResource) -> Result<(), ValidationFailures> {
            if resource.metadata.name.chars().any(char::is_uppercase) {
                return Err(ValidationError::new("NoUppercase", "name must be lowercase").into());
            }
            Ok(())
        }
    }

    fn topic(name: &str, partitions: u64) -> GenericResource {
        GenericResource::new(&ResourceType::new("Topic", "kafka", "v1"), name)
            .with_spec(json!({ "partitions": partitions }))
    }

    #[test]
    fn test_all_failures_are_aggregated() {
        let chain: ValidationChain<GenericResource> =
            ValidationChain::new(vec![Box::new(MinPartitions(3)), Box::new(NoUppercase)]);

        let failures = chain
            .validate(&[topic("Orders", 1), topic("ok", 6), topic("payments", 2)])
            .unwrap_err();

        let summary: Vec<(String, Value)> = failures
            .errors
            .iter()
            .map(|e| (e.name.clone(), e.details["resource"].clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("MinPartitions".to_string(), json!("Orders")),
                ("NoUppercase".to_string(), json!("Orders")),
                ("MinPartitions".to_string(), json!("payments")),
            ]
        );
        assert_eq!(failures.errors[0].details["partitions"], json!(1));
        assert_eq!(failures.errors[0].details["kind"], json!("Topic"));
    }

    #[test]
    fn test_valid_resources_pass() {
        let chain: ValidationChain<GenericResource> =
            ValidationChain::new(vec![Box::new(MinPartitions(1))]);
        assert!(chain.validate(&[topic("a", 1)]).is_ok());
        assert!(ValidationChain::<GenericResource>::new(vec![]).validate(&[topic("a", 0)]).is_ok());
    }

    #[test]
    fn test_display_lists_every_error() {
        let failures = ValidationFailures::single(ValidationError::new("A", "first"))
            .merge(ValidationFailures::single(ValidationError::new("B", "second")));
        assert_eq!(
            failures.to_string(),
            "Validation failed with 2 error(s)\n  - A: first\n  - B: second"
        );
    }

    #[test]
    fn test_serializes_as_structured_list() {
        let failures = ValidationFailures::single(
            ValidationError::new("A", "bad").with_detail("field", "spec.partitions"),
        );
        assert_eq!(
            serde_json::to_value(&failures).unwrap(),
            json!({"errors": [{"name": "A", "message": "bad", "details": {"field": "spec.partitions"}}]})
        );
    }
}
