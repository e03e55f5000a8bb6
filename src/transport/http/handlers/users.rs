use crate::domain::permission::Requester;
use crate::transport::http::handlers::common::{ok_json, record_id};
use crate::transport::http::links::Links;
use crate::transport::http::types::{ApiResponse, AppState, UserResponse};
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All owners with links to their snippets", body = ApiResponse),
        (status = 401, description = "Invalid credentials supplied", body = ApiResponse)
    )
)]
pub async fn list_users_handler(
    State(state): State<AppState>,
    links: Links,
    _requester: Requester,
) -> impl IntoResponse {
    match state.service.list_owners().await {
        Ok(owners) => {
            let body: Vec<UserResponse> = owners
                .iter()
                .map(|o| UserResponse::from_detail(o, &links))
                .collect();
            ok_json(StatusCode::OK, &body)
        }
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = i64, Path, description = "Owner id")
    ),
    responses(
        (status = 200, description = "Owner", body = ApiResponse),
        (status = 401, description = "Invalid credentials supplied", body = ApiResponse),
        (status = 404, description = "No such owner", body = ApiResponse)
    )
)]
pub async fn retrieve_user_handler(
    State(state): State<AppState>,
    links: Links,
    _requester: Requester,
    path: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let id = match record_id(path) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.service.retrieve_owner(id).await {
        Ok(detail) => ok_json(StatusCode::OK, &UserResponse::from_detail(&detail, &links)),
        Err(e) => e.into_response(),
    }
}
