use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{AdmissionError, Result},
    verdict::Verdict,
};

pub const ADMISSION_REVIEW_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionResponse
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    /// The type of Patch. Currently we only allow "JSONPatch".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,

    /// The patch body, base64 encoded. Currently we only support "JSONPatch"
    /// which implements RFC 6902.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    /// Status contains extra details into why an admission request was denied.
    /// This field IS NOT consulted in any way if "Allowed" is "true".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,
}

/// PatchType is the type of patch being used to represent the mutated object
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdmissionResponse {
    pub fn allow(uid: String) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: true,
            ..Default::default()
        }
    }

    pub fn reject(uid: String, message: String) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: false,
            status: Some(AdmissionResponseStatus {
                message: Some(message),
            }),
            ..Default::default()
        }
    }

    /// Build the response carrying the outcome of a handler.
    ///
    /// A denial without a message, or a patch that cannot be serialized,
    /// is reported as an encoding failure instead of a response.
    pub fn from_verdict(uid: String, verdict: &Verdict) -> Result<AdmissionResponse> {
        match verdict {
            Verdict::Allowed => Ok(AdmissionResponse::allow(uid)),
            Verdict::Denied(message) => {
                if message.is_empty() {
                    return Err(AdmissionError::EncodingFailure(
                        "denied verdict without a reason".to_owned(),
                    ));
                }
                Ok(AdmissionResponse::reject(uid, message.clone()))
            }
            Verdict::Patched(patch) => {
                if patch.0.is_empty() {
                    return Ok(AdmissionResponse::allow(uid));
                }
                let patch = serde_json::to_string(patch)
                    .map(|s| general_purpose::STANDARD.encode(s))
                    .map_err(|e| AdmissionError::EncodingFailure(e.to_string()))?;

                Ok(AdmissionResponse {
                    uid,
                    allowed: true,
                    patch_type: Some(PatchType::JSONPatch),
                    patch: Some(patch),
                    status: None,
                })
            }
        }
    }
}

/// The outbound admission/v1/AdmissionReview envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub api_version: String,
    pub kind: String,
    pub response: AdmissionResponse,
}
