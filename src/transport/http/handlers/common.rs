use crate::app::snippet_service::ServiceError;
use crate::transport::http::auth::REALM;
use crate::transport::http::types::ApiResponse;
use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

pub const EXPECTED_SNIPPET_BODY: &str =
    "{\"code\": \"...\", \"title\": \"...\", \"linenos\": false, \"language_id\": \"python\", \"style_id\": \"friendly\"}";

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ServiceError::ValidationFailed(errors) => ApiResponse::failure(
                "Validation failed",
                Some(serde_json::json!({ "errors": errors })),
            ),
            ServiceError::Store(e) => {
                error!(error = %format!("{:#}", e), "request failed on the record store");
                ApiResponse::failure("Internal server error", None)
            }
            other => ApiResponse::failure(other.to_string(), None),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            let challenge = format!("Basic realm=\"{}\"", REALM);
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response.headers_mut().insert(WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

/// A path id that is not an integer cannot name a record.
pub fn record_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ServiceError> {
    path.map(|Path(id)| id).map_err(|_| ServiceError::NotFound)
}

pub fn ok_json<T: Serialize>(status: StatusCode, data: &T) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => (status, Json(ApiResponse::ok(value))).into_response(),
        Err(e) => {
            error!(error = %e, "response serialization failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure("Internal server error", None)),
            )
                .into_response()
        }
    }
}
