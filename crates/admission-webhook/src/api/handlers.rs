use std::sync::Arc;

use admission_core::{
    admission_request::AdmissionRequest, errors::AdmissionError, resource::TargetResource,
    verdict::Verdict,
};
use axum::{
    body::Bytes,
    extract,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{Span, debug, error, info, warn};

use crate::api::{api_error::ApiError, state::ApiServerState};

#[tracing::instrument(
    name = "validation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        resource_group=tracing::field::Empty,
        resource_version=tracing::field::Empty,
        resource=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Decide whether the resource is admitted, based on its container images.
pub(crate) async fn validate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    review(&state, &headers, &body, |resource| {
        state.image_registry_policy.evaluate(resource)
    })
}

#[tracing::instrument(
    name = "mutation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        resource_group=tracing::field::Empty,
        resource_version=tracing::field::Empty,
        resource=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Fill in default resource limits for the containers that lack them.
pub(crate) async fn mutate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    review(&state, &headers, &body, |resource| {
        state.default_limits_mutator.mutate(resource)
    })
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

/// Run a whole admission exchange: decode, extract, decide, encode.
fn review<F>(
    state: &ApiServerState,
    headers: &HeaderMap,
    body: &[u8],
    decide: F,
) -> Result<Response, ApiError>
where
    F: FnOnce(&TargetResource) -> Verdict,
{
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|value| value.to_str().unwrap_or_default());

    let admission_review = state
        .codec
        .decode(body, content_type)
        .map_err(handle_admission_error)?;
    debug!(admission_review = ?admission_review);

    populate_span_with_admission_request_data(&admission_review.request);

    let resource = state
        .codec
        .extract(&admission_review)
        .map_err(handle_admission_error)?;
    let verdict = decide(&resource);

    populate_span_with_verdict(&verdict);
    match &verdict {
        Verdict::Denied(message) => warn!(response_message = message.as_str(), "request denied"),
        Verdict::Patched(patch) => info!(operations = patch.0.len(), "request mutated"),
        Verdict::Allowed => debug!("request allowed"),
    }

    let payload = state
        .codec
        .encode(&admission_review, &verdict)
        .map_err(handle_admission_error)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, admission_core::envelope::CONTENT_TYPE_JSON)],
        payload,
    )
        .into_response())
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("request_uid", adm_req.uid.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("resource", adm_req.resource.resource.as_str());
    Span::current().record("resource_group", adm_req.resource.group.as_str());
    Span::current().record("resource_version", adm_req.resource.version.as_str());
}

fn populate_span_with_verdict(verdict: &Verdict) {
    Span::current().record("allowed", verdict.is_allowed());
    Span::current().record("mutated", verdict.is_mutation());
    if let Verdict::Denied(message) = verdict {
        Span::current().record("response_message", message.as_str());
    }
}

fn handle_admission_error(error: AdmissionError) -> ApiError {
    match error {
        AdmissionError::EncodingFailure(_) => error!("Admission error: {}", error),
        _ => warn!("Admission error: {}", error),
    }
    ApiError::from(error)
}
