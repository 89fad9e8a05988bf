use thiserror::Error;

use crate::admission_request::GroupVersionResource;

pub type Result<T> = std::result::Result<T, AdmissionError>;

/// Failures of the admission review protocol itself.
///
/// None of these is a policy decision: a denied request is a successful
/// exchange carrying `allowed: false`, while these errors terminate the
/// exchange without producing a verdict.
#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("contentType={actual}, expected {expected}")]
    UnsupportedMediaType { actual: String, expected: String },

    #[error("can't retrieve admission review from request: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    #[error("review request is not for resource {expected}, got {actual}")]
    ResourceKindMismatch {
        expected: GroupVersionResource,
        actual: GroupVersionResource,
    },

    #[error("can't decode raw {resource} definition: {reason}")]
    MalformedResource { resource: String, reason: String },

    #[error("cannot encode admission review response: {0}")]
    EncodingFailure(String),
}
