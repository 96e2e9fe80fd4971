//! Transformation pipeline

use converge_resources::HasMetadata;

use crate::Result;
use crate::context::ReconciliationContext;
use crate::plugin::Transformation;

/// Transformations applied in sequence to every desired resource.
///
/// Later stages see the output of earlier ones. A stage returning `None`
/// drops the resource and later stages never see it.
pub struct TransformationPipeline<R> {
    stages: Vec<Box<dyn Transformation<R>>>,
}

impl<R: HasMetadata> TransformationPipeline<R> {
    pub fn new(stages: Vec<Box<dyn Transformation<R>>>) -> Self {
        Self { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn apply(&self, resources: Vec<R>, context: &ReconciliationContext) -> Result<Vec<R>> {
        let mut output = Vec::with_capacity(resources.len());
        'resources: for resource in resources {
            let mut current = resource;
            for stage in &self.stages {
                let name = current.name().to_string();
                match stage.transform(current, context)? {
                    Some(next) => current = next,
                    None => {
                        tracing::debug!(resource = %name, stage = %stage.name(), "Transformation dropped resource");
                        continue 'resources;
                    }
                }
            }
            output.push(current);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use converge_extensions::Extension;
    use converge_resources::{GenericResource, ResourceType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct DefaultPartitions;
    impl Extension for DefaultPartitions {}
    impl Transformation<GenericResource> for DefaultPartitions {
        fn transform(
            &self,
            mut resource: GenericResource,
            _: &ReconciliationContext,
        ) -> Result<Option<GenericResource>> {
            if resource.spec.get("partitions").is_none() {
                resource.spec["partitions"] = json!(1);
            }
            Ok(Some(resource))
        }
    }

    struct DoublePartitions;
    impl Extension for DoublePartitions {}
    impl Transformation<GenericResource> for DoublePartitions {
        fn transform(
            &self,
            mut resource: GenericResource,
            _: &ReconciliationContext,
        ) -> Result<Option<GenericResource>> {
            let n = resource.spec["partitions"].as_u64().unwrap_or(0);
            resource.spec["partitions"] = json!(n * 2);
            Ok(Some(resource))
        }
    }

    struct DropInternal;
    impl Extension for DropInternal {}
    impl Transformation<GenericResource> for DropInternal {
        fn transform(
            &self,
            resource: GenericResource,
            _: &ReconciliationContext,
        ) -> Result<Option<GenericResource>> {
            Ok((!resource.metadata.name.starts_with('_')).then_some(resource))
        }
    }

    struct Failing;
    impl Extension for Failing {}
    impl Transformation<GenericResource> for Failing {
        fn transform(
            &self,
            _: GenericResource,
            _: &ReconciliationContext,
        ) -> Result<Option<GenericResource>> {
            Err(Error::Transformation {
                name: self.name(),
                message: "boom".to_string(),
            })
        }
    }

    fn topic(name: &str) -> GenericResource {
        GenericResource::new(&ResourceType::new("Topic", "kafka", "v1"), name)
    }

    #[test]
    fn test_stages_run_in_order() {
        let pipeline: TransformationPipeline<GenericResource> = TransformationPipeline::new(vec![
            Box::new(DefaultPartitions),
            Box::new(DoublePartitions),
        ]);
        let out = pipeline
            .apply(vec![topic("a")], &ReconciliationContext::new())
            .unwrap();
        assert_eq!(out[0].spec, json!({"partitions": 2}));
    }

    #[test]
    fn test_drop_stops_later_stages() {
        let pipeline: TransformationPipeline<GenericResource> = TransformationPipeline::new(vec![
            Box::new(DropInternal),
            Box::new(Failing),
        ]);
        let out = pipeline.apply(vec![topic("_internal")], &ReconciliationContext::new());
        assert!(out.unwrap().is_empty());
    }

    #[test]
    fn test_failure_propagates() {
        let pipeline: TransformationPipeline<GenericResource> =
            TransformationPipeline::new(vec![Box::new(Failing)]);
        let err = pipeline
            .apply(vec![topic("a")], &ReconciliationContext::new())
            .unwrap_err();
        assert!(err.to_string().contains("Failing"));
    }
}
