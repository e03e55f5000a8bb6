//! HTTP Basic authentication: resolves the `Authorization` header to a [`Requester`].

use crate::app::snippet_service::ServiceError;
use crate::domain::permission::Requester;
use crate::transport::http::types::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub const REALM: &str = "api";

/// Splits a `Basic <base64(username:password)>` header value.
pub fn parse_basic(header: &str) -> Result<(String, String), ServiceError> {
    let (scheme, encoded) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| invalid_header("No credentials provided."))?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(invalid_header("Unsupported authorization scheme."));
    }
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| invalid_header("Credentials not correctly base64 encoded."))?;
    let decoded =
        String::from_utf8(decoded).map_err(|_| invalid_header("Credentials not correctly base64 encoded."))?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| invalid_header("Credentials string should not contain spaces."))?;
    Ok((username.to_string(), password.to_string()))
}

fn invalid_header(detail: &str) -> ServiceError {
    ServiceError::Unauthenticated(format!("Invalid basic header. {}", detail))
}

#[async_trait]
impl FromRequestParts<AppState> for Requester {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Requester::Anonymous);
        };
        let header = header
            .to_str()
            .map_err(|_| invalid_header("Credentials not correctly encoded."))?;
        let (username, password) = parse_basic(header)?;
        state.service.authenticate(&username, &password).await
    }
}
