use crate::{
    admission_request::{AdmissionReviewRequest, GroupVersionResource},
    admission_response::{
        ADMISSION_REVIEW_API_VERSION, ADMISSION_REVIEW_KIND, AdmissionResponse,
        AdmissionReviewResponse,
    },
    errors::{AdmissionError, Result},
    resource::{ResourceKind, TargetResource},
    verdict::Verdict,
};

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Decodes inbound AdmissionReview envelopes and encodes the outbound ones.
///
/// A codec is built once, at startup, and then shared read-only by every
/// exchange.
#[derive(Clone, Debug)]
pub struct EnvelopeCodec {
    content_type: String,
    target: GroupVersionResource,
    kind: ResourceKind,
}

impl EnvelopeCodec {
    /// Returns `None` when `target` is not a resource that embeds a pod spec.
    pub fn new(content_type: &str, target: GroupVersionResource) -> Option<Self> {
        let kind = ResourceKind::from_resource(&target)?;
        Some(EnvelopeCodec {
            content_type: content_type.to_owned(),
            target,
            kind,
        })
    }

    pub fn target(&self) -> &GroupVersionResource {
        &self.target
    }

    /// Parse and validate the envelope. The embedded object is left raw.
    pub fn decode(&self, raw: &[u8], content_type: Option<&str>) -> Result<AdmissionReviewRequest> {
        if content_type != Some(self.content_type.as_str()) {
            return Err(AdmissionError::UnsupportedMediaType {
                actual: content_type.unwrap_or_default().to_owned(),
                expected: self.content_type.clone(),
            });
        }

        let review: AdmissionReviewRequest =
            serde_json::from_slice(raw).map_err(AdmissionError::MalformedEnvelope)?;

        if review.request.resource != self.target {
            return Err(AdmissionError::ResourceKindMismatch {
                expected: self.target.clone(),
                actual: review.request.resource.clone(),
            });
        }

        Ok(review)
    }

    /// Turn the raw object carried by the request into a typed resource.
    ///
    /// Only CREATE and UPDATE requests carry an object. Anything else, a
    /// DELETE for instance, fails as a malformed resource, so the webhook
    /// must be registered for those two operations only.
    pub fn extract(&self, review: &AdmissionReviewRequest) -> Result<TargetResource> {
        let raw = review
            .request
            .object
            .as_ref()
            .ok_or_else(|| AdmissionError::MalformedResource {
                resource: self.kind.name().to_owned(),
                reason: "the request carries no object".to_owned(),
            })?;
        TargetResource::from_raw(self.kind, raw)
    }

    /// Wrap a response into an envelope that echoes the request's
    /// `apiVersion` and `kind`. The response uid is forced to the request one.
    pub fn encode_response(
        &self,
        review: &AdmissionReviewRequest,
        mut response: AdmissionResponse,
    ) -> Result<Vec<u8>> {
        response.uid = review.request.uid.clone();
        let envelope = AdmissionReviewResponse {
            api_version: review
                .api_version
                .clone()
                .unwrap_or_else(|| ADMISSION_REVIEW_API_VERSION.to_owned()),
            kind: review
                .kind
                .clone()
                .unwrap_or_else(|| ADMISSION_REVIEW_KIND.to_owned()),
            response,
        };

        serde_json::to_vec(&envelope).map_err(|e| AdmissionError::EncodingFailure(e.to_string()))
    }

    pub fn encode(&self, review: &AdmissionReviewRequest, verdict: &Verdict) -> Result<Vec<u8>> {
        let response = AdmissionResponse::from_verdict(review.request.uid.clone(), verdict)?;
        self.encode_response(review, response)
    }
}
