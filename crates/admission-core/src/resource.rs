use k8s_openapi::{
    api::{
        apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
        batch::v1::Job,
        core::v1::{Container, EphemeralContainer, Pod, PodSpec},
    },
    apimachinery::pkg::runtime::RawExtension,
};
use serde::de::DeserializeOwned;

use crate::{
    admission_request::GroupVersionResource,
    errors::{AdmissionError, Result},
};

/// The resource kinds that can be guarded. Every one of them either is a
/// pod or embeds a pod template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Pod,
    Deployment,
    ReplicaSet,
    StatefulSet,
    DaemonSet,
    Job,
}

impl ResourceKind {
    pub fn from_resource(resource: &GroupVersionResource) -> Option<ResourceKind> {
        match (
            resource.group.as_str(),
            resource.version.as_str(),
            resource.resource.as_str(),
        ) {
            ("", "v1", "pods") => Some(ResourceKind::Pod),
            ("apps", "v1", "deployments") => Some(ResourceKind::Deployment),
            ("apps", "v1", "replicasets") => Some(ResourceKind::ReplicaSet),
            ("apps", "v1", "statefulsets") => Some(ResourceKind::StatefulSet),
            ("apps", "v1", "daemonsets") => Some(ResourceKind::DaemonSet),
            ("batch", "v1", "jobs") => Some(ResourceKind::Job),
            _ => None,
        }
    }

    /// JSON pointer tokens of the container list inside the serialized object.
    pub fn containers_pointer(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Pod => &["spec", "containers"],
            _ => &["spec", "template", "spec", "containers"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "pod",
            ResourceKind::Deployment => "deployment",
            ResourceKind::ReplicaSet => "replicaset",
            ResourceKind::StatefulSet => "statefulset",
            ResourceKind::DaemonSet => "daemonset",
            ResourceKind::Job => "job",
        }
    }
}

/// The typed object embedded inside of an admission request.
#[derive(Clone, Debug)]
pub enum TargetResource {
    Pod(Pod),
    Deployment(Deployment),
    ReplicaSet(ReplicaSet),
    StatefulSet(StatefulSet),
    DaemonSet(DaemonSet),
    Job(Job),
}

impl TargetResource {
    pub fn from_raw(kind: ResourceKind, raw: &RawExtension) -> Result<TargetResource> {
        let resource = match kind {
            ResourceKind::Pod => TargetResource::Pod(decode(kind, raw)?),
            ResourceKind::Deployment => TargetResource::Deployment(decode(kind, raw)?),
            ResourceKind::ReplicaSet => TargetResource::ReplicaSet(decode(kind, raw)?),
            ResourceKind::StatefulSet => TargetResource::StatefulSet(decode(kind, raw)?),
            ResourceKind::DaemonSet => TargetResource::DaemonSet(decode(kind, raw)?),
            ResourceKind::Job => TargetResource::Job(decode(kind, raw)?),
        };
        Ok(resource)
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            TargetResource::Pod(_) => ResourceKind::Pod,
            TargetResource::Deployment(_) => ResourceKind::Deployment,
            TargetResource::ReplicaSet(_) => ResourceKind::ReplicaSet,
            TargetResource::StatefulSet(_) => ResourceKind::StatefulSet,
            TargetResource::DaemonSet(_) => ResourceKind::DaemonSet,
            TargetResource::Job(_) => ResourceKind::Job,
        }
    }

    pub fn pod_spec(&self) -> Option<&PodSpec> {
        match self {
            TargetResource::Pod(pod) => pod.spec.as_ref(),
            TargetResource::Deployment(deployment) => deployment
                .spec
                .as_ref()
                .and_then(|spec| spec.template.spec.as_ref()),
            TargetResource::ReplicaSet(replica_set) => replica_set
                .spec
                .as_ref()
                .and_then(|spec| spec.template.as_ref())
                .and_then(|template| template.spec.as_ref()),
            TargetResource::StatefulSet(stateful_set) => stateful_set
                .spec
                .as_ref()
                .and_then(|spec| spec.template.spec.as_ref()),
            TargetResource::DaemonSet(daemon_set) => daemon_set
                .spec
                .as_ref()
                .and_then(|spec| spec.template.spec.as_ref()),
            TargetResource::Job(job) => job
                .spec
                .as_ref()
                .and_then(|spec| spec.template.spec.as_ref()),
        }
    }

    pub fn containers(&self) -> &[Container] {
        self.pod_spec()
            .map(|spec| spec.containers.as_slice())
            .unwrap_or_default()
    }

    pub fn init_containers(&self) -> &[Container] {
        self.pod_spec()
            .and_then(|spec| spec.init_containers.as_deref())
            .unwrap_or_default()
    }

    pub fn ephemeral_containers(&self) -> &[EphemeralContainer] {
        self.pod_spec()
            .and_then(|spec| spec.ephemeral_containers.as_deref())
            .unwrap_or_default()
    }

    /// Every image reference declared by the resource: init containers
    /// first, then regular containers, then ephemeral ones. A container
    /// without an image yields an empty reference.
    pub fn image_references(&self) -> impl Iterator<Item = &str> {
        self.init_containers()
            .iter()
            .chain(self.containers())
            .map(|container| container.image.as_deref().unwrap_or_default())
            .chain(
                self.ephemeral_containers()
                    .iter()
                    .map(|container| container.image.as_deref().unwrap_or_default()),
            )
    }
}

fn decode<T: DeserializeOwned>(kind: ResourceKind, raw: &RawExtension) -> Result<T> {
    serde_json::from_value(raw.0.clone()).map_err(|e| AdmissionError::MalformedResource {
        resource: kind.name().to_owned(),
        reason: e.to_string(),
    })
}
