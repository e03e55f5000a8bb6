use crate::domain::permission::Requester;
use crate::transport::http::handlers::common::ok_json;
use crate::transport::http::links::Links;
use crate::transport::http::types::{ApiResponse, ApiRootResponse};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Entry points of the API", body = ApiResponse),
        (status = 401, description = "Invalid credentials supplied", body = ApiResponse)
    )
)]
pub async fn api_root_handler(links: Links, _requester: Requester) -> impl IntoResponse {
    ok_json(
        StatusCode::OK,
        &ApiRootResponse {
            users: links.users(),
            snippets: links.snippets(),
        },
    )
}
