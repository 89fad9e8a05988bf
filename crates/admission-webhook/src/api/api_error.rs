use admission_core::errors::AdmissionError;
use axum::{
    http::{StatusCode, header},
    response::IntoResponse,
};

#[derive(Debug)]
/// An error that terminates an admission exchange without a verdict.
/// It is rendered as the raw error text, with a non-2xx status code.
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl From<AdmissionError> for ApiError {
    fn from(error: AdmissionError) -> Self {
        let status = match &error {
            AdmissionError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AdmissionError::MalformedEnvelope(_)
            | AdmissionError::ResourceKindMismatch { .. }
            | AdmissionError::MalformedResource { .. } => StatusCode::BAD_REQUEST,
            AdmissionError::EncodingFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admission_core::admission_request::GroupVersionResource;
    use rstest::rstest;

    #[rstest]
    #[case::media_type(
        AdmissionError::UnsupportedMediaType {
            actual: "text/plain".to_owned(),
            expected: "application/json".to_owned(),
        },
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    )]
    #[case::kind_mismatch(
        AdmissionError::ResourceKindMismatch {
            expected: GroupVersionResource::pods(),
            actual: GroupVersionResource::new("apps", "v1", "deployments"),
        },
        StatusCode::BAD_REQUEST
    )]
    #[case::resource(
        AdmissionError::MalformedResource {
            resource: "pod".to_owned(),
            reason: "boom".to_owned(),
        },
        StatusCode::BAD_REQUEST
    )]
    #[case::encoding(
        AdmissionError::EncodingFailure("boom".to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn status_codes(#[case] error: AdmissionError, #[case] expected: StatusCode) {
        let message = error.to_string();
        let api_error = ApiError::from(error);

        assert_eq!(api_error.status, expected);
        assert_eq!(api_error.message, message);
    }

    #[test]
    fn malformed_envelope_is_a_bad_request() {
        let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let api_error = ApiError::from(AdmissionError::MalformedEnvelope(parse_error));

        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert!(api_error.message.starts_with("can't retrieve admission review"));
    }
}
