use std::collections::BTreeMap;

use json_patch::Patch;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use tracing::debug;

use crate::{patch::PatchBuilder, resource::TargetResource, verdict::Verdict};

pub const DEFAULT_CPU_LIMIT: &str = "100m";
pub const DEFAULT_MEMORY_LIMIT: &str = "100Mi";

/// Give every container without resource limits a default CPU and memory
/// limit. Containers that declare limits, even an empty set, are left alone.
#[derive(Clone, Debug)]
pub struct DefaultLimitsMutator {
    limits: BTreeMap<String, Quantity>,
}

impl Default for DefaultLimitsMutator {
    fn default() -> Self {
        DefaultLimitsMutator::new(DEFAULT_CPU_LIMIT, DEFAULT_MEMORY_LIMIT)
    }
}

impl DefaultLimitsMutator {
    pub fn new(cpu: &str, memory: &str) -> Self {
        DefaultLimitsMutator {
            limits: BTreeMap::from([
                ("cpu".to_owned(), Quantity(cpu.to_owned())),
                ("memory".to_owned(), Quantity(memory.to_owned())),
            ]),
        }
    }

    /// One `add` operation per container lacking limits, in container order.
    /// Paths address containers by their position in the list.
    pub fn compute_patch(&self, resource: &TargetResource) -> Patch {
        let pointer = resource.kind().containers_pointer();
        let value = serde_json::json!(self.limits);
        let mut builder = PatchBuilder::new();

        for (index, container) in resource.containers().iter().enumerate() {
            let has_limits = container
                .resources
                .as_ref()
                .is_some_and(|resources| resources.limits.is_some());
            if has_limits {
                continue;
            }

            debug!(
                container = container.name.as_str(),
                index, "adding default resource limits"
            );
            let tokens = pointer
                .iter()
                .map(|token| token.to_string())
                .chain([
                    index.to_string(),
                    "resources".to_owned(),
                    "limits".to_owned(),
                ]);
            builder.add(tokens, value.clone());
        }

        builder.build()
    }

    pub fn mutate(&self, resource: &TargetResource) -> Verdict {
        Verdict::from_patch(self.compute_patch(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;
    use json_patch::PatchOperation;
    use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
    use rstest::rstest;
    use serde_json::json;

    fn pod(containers: serde_json::Value) -> TargetResource {
        let raw = RawExtension(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "test"},
            "spec": {"containers": containers}
        }));
        TargetResource::from_raw(ResourceKind::Pod, &raw).unwrap()
    }

    fn paths(patch: &Patch) -> Vec<String> {
        patch
            .0
            .iter()
            .map(|operation| match operation {
                PatchOperation::Add(add) => add.path.to_string(),
                other => panic!("unexpected operation: {other:?}"),
            })
            .collect()
    }

    #[test]
    fn only_containers_without_limits_are_patched() {
        let resource = pod(json!([
            {"name": "a", "image": "nginx"},
            {"name": "b", "image": "nginx", "resources": {"limits": {"cpu": "1"}}}
        ]));

        let patch = DefaultLimitsMutator::default().compute_patch(&resource);

        assert_eq!(paths(&patch), vec!["/spec/containers/0/resources/limits"]);
        let serialized = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            serialized,
            json!([{
                "op": "add",
                "path": "/spec/containers/0/resources/limits",
                "value": {"cpu": "100m", "memory": "100Mi"}
            }])
        );
    }

    #[rstest]
    #[case::none_declared(json!([
        {"name": "a"},
        {"name": "b", "resources": {}},
        {"name": "c", "resources": {"requests": {"cpu": "1"}}}
    ]), vec![0, 1, 2])]
    #[case::all_declared(json!([
        {"name": "a", "resources": {"limits": {"cpu": "1"}}},
        {"name": "b", "resources": {"limits": {}}}
    ]), vec![])]
    #[case::interleaved(json!([
        {"name": "a", "resources": {"limits": {"memory": "1Gi"}}},
        {"name": "b"},
        {"name": "c", "resources": {"limits": {"cpu": "2"}}},
        {"name": "d"}
    ]), vec![1, 3])]
    fn one_operation_per_container_without_limits(
        #[case] containers: serde_json::Value,
        #[case] expected_indexes: Vec<usize>,
    ) {
        let mutator = DefaultLimitsMutator::default();
        let patch = mutator.compute_patch(&pod(containers));

        let expected: Vec<String> = expected_indexes
            .iter()
            .map(|i| format!("/spec/containers/{i}/resources/limits"))
            .collect();
        assert_eq!(paths(&patch), expected);

        for operation in &patch.0 {
            if let PatchOperation::Add(add) = operation {
                assert_eq!(add.value, json!({"cpu": "100m", "memory": "100Mi"}));
            }
        }
    }

    #[test]
    fn nothing_to_change_is_a_plain_approval() {
        let resource = pod(json!([
            {"name": "a", "resources": {"limits": {"cpu": "1"}}}
        ]));

        let mutator = DefaultLimitsMutator::default();
        assert!(mutator.compute_patch(&resource).0.is_empty());
        assert_eq!(mutator.mutate(&resource), Verdict::Allowed);
    }

    #[test]
    fn deployment_paths_point_inside_the_pod_template() {
        let raw = RawExtension(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web"},
            "spec": {
                "selector": {"matchLabels": {"app": "web"}},
                "template": {
                    "metadata": {"labels": {"app": "web"}},
                    "spec": {"containers": [{"name": "web", "image": "nginx"}]}
                }
            }
        }));
        let resource = TargetResource::from_raw(ResourceKind::Deployment, &raw).unwrap();

        let patch = DefaultLimitsMutator::default().compute_patch(&resource);
        assert_eq!(
            paths(&patch),
            vec!["/spec/template/spec/containers/0/resources/limits"]
        );
    }

    #[test]
    fn custom_limits() {
        let mutator = DefaultLimitsMutator::new("250m", "256Mi");
        let resource = pod(json!([{"name": "a"}]));

        let verdict = mutator.mutate(&resource);
        let Verdict::Patched(patch) = verdict else {
            panic!("expected a patch");
        };
        let serialized = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            serialized[0]["value"],
            json!({"cpu": "250m", "memory": "256Mi"})
        );
    }
}
