use tracing::debug;

use crate::{resource::TargetResource, verdict::Verdict};

pub const DEFAULT_ALLOWED_REGISTRY: &str = "docker.io";

/// Message returned on every rejection, regardless of how many images fail.
pub const IMAGE_REGISTRY_DENIAL_MESSAGE: &str =
    "container images must be pulled from the allowed registry";

/// Only admit resources whose container images all come from one registry.
///
/// The check is a literal prefix match against the full image reference.
/// Bare image names such as `nginx` are not resolved to the registry the
/// container runtime would use, so they never match.
#[derive(Clone, Debug)]
pub struct ImageRegistryPolicy {
    allowed_registry: String,
}

impl Default for ImageRegistryPolicy {
    fn default() -> Self {
        ImageRegistryPolicy::new(DEFAULT_ALLOWED_REGISTRY)
    }
}

impl ImageRegistryPolicy {
    pub fn new(allowed_registry: &str) -> Self {
        ImageRegistryPolicy {
            allowed_registry: allowed_registry.to_owned(),
        }
    }

    pub fn allowed_registry(&self) -> &str {
        &self.allowed_registry
    }

    /// Stops at the first image that does not match.
    pub fn evaluate(&self, resource: &TargetResource) -> Verdict {
        match resource
            .image_references()
            .find(|image| !image.starts_with(&self.allowed_registry))
        {
            Some(image) => {
                debug!(
                    image,
                    allowed_registry = self.allowed_registry.as_str(),
                    "image rejected"
                );
                Verdict::Denied(IMAGE_REGISTRY_DENIAL_MESSAGE.to_owned())
            }
            None => Verdict::Allowed,
        }
    }
}
