use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use keygate_core::{Denial, KeygateError};

/// `KeygateError` rendered as a JSON REST error.
#[derive(Debug)]
pub struct ApiError(pub KeygateError);

impl From<KeygateError> for ApiError {
    fn from(e: KeygateError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        json_response(status, self.0.to_json_body())
    }
}

/// Response for a denied authentication.
pub fn denial_response(denial: &Denial) -> Response {
    let status = StatusCode::from_u16(denial.status).unwrap_or(StatusCode::FORBIDDEN);
    json_response(status, denial.to_json_body())
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
