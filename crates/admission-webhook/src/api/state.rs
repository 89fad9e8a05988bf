use admission_core::{
    envelope::EnvelopeCodec, mutating::DefaultLimitsMutator, validating::ImageRegistryPolicy,
};

/// Read-only state shared by every exchange. Built once at startup.
pub(crate) struct ApiServerState {
    pub(crate) codec: EnvelopeCodec,
    pub(crate) image_registry_policy: ImageRegistryPolicy,
    pub(crate) default_limits_mutator: DefaultLimitsMutator,
}
