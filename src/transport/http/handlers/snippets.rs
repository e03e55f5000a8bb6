use crate::domain::permission::{Action, Requester};
use crate::transport::http::handlers::common::{ok_json, record_id, EXPECTED_SNIPPET_BODY};
use crate::transport::http::links::Links;
use crate::transport::http::types::{json_422, ApiResponse, AppState, SnippetResponse, SnippetWrite};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::Value as JsonValue;

#[utoipa::path(
    get,
    path = "/snippets",
    responses(
        (status = 200, description = "All snippets, oldest first", body = ApiResponse)
    )
)]
pub async fn list_snippets_handler(
    State(state): State<AppState>,
    links: Links,
    requester: Requester,
) -> impl IntoResponse {
    match state.service.list(&requester).await {
        Ok(snippets) => {
            let body: Vec<SnippetResponse> = snippets
                .iter()
                .map(|s| SnippetResponse::from_snippet(s, &links))
                .collect();
            ok_json(StatusCode::OK, &body)
        }
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/snippets",
    request_body = SnippetWrite,
    responses(
        (status = 201, description = "Snippet created and owned by the caller", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Authentication required", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_snippet_handler(
    State(state): State<AppState>,
    method: Method,
    links: Links,
    requester: Requester,
    request: Result<Json<JsonValue>, JsonRejection>,
) -> impl IntoResponse {
    let Some(action @ Action::Create) = Action::from_method(&method, false) else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };
    let Json(payload) = match request {
        Ok(v) => v,
        Err(e) => return undecodable_body(&state, &requester, action, None, e).await,
    };

    let snippet = match state.service.create(&requester, &payload).await {
        Ok(s) => s,
        Err(e) => return e.into_response(),
    };
    let body = SnippetResponse::from_snippet(&snippet, &links);
    let mut response = ok_json(StatusCode::CREATED, &body);
    if let Ok(location) = HeaderValue::from_str(&body.url) {
        response.headers_mut().insert(LOCATION, location);
    }
    response
}

#[utoipa::path(
    get,
    path = "/snippets/{id}",
    params(
        ("id" = i64, Path, description = "Snippet id")
    ),
    responses(
        (status = 200, description = "Snippet", body = ApiResponse),
        (status = 404, description = "No such snippet", body = ApiResponse)
    )
)]
pub async fn retrieve_snippet_handler(
    State(state): State<AppState>,
    links: Links,
    requester: Requester,
    path: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let id = match record_id(path) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.service.retrieve(&requester, id).await {
        Ok(snippet) => ok_json(StatusCode::OK, &SnippetResponse::from_snippet(&snippet, &links)),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/snippets/{id}",
    params(
        ("id" = i64, Path, description = "Snippet id")
    ),
    request_body = SnippetWrite,
    responses(
        (status = 200, description = "Snippet replaced", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Authentication required", body = ApiResponse),
        (status = 403, description = "Caller does not own the snippet", body = ApiResponse),
        (status = 404, description = "No such snippet", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn update_snippet_handler(
    State(state): State<AppState>,
    method: Method,
    links: Links,
    requester: Requester,
    path: Result<Path<i64>, PathRejection>,
    request: Result<Json<JsonValue>, JsonRejection>,
) -> impl IntoResponse {
    write_snippet(&state, &method, &links, &requester, path, request).await
}

#[utoipa::path(
    patch,
    path = "/snippets/{id}",
    params(
        ("id" = i64, Path, description = "Snippet id")
    ),
    request_body = SnippetWrite,
    responses(
        (status = 200, description = "Snippet updated", body = ApiResponse),
        (status = 400, description = "Validation failed", body = ApiResponse),
        (status = 401, description = "Authentication required", body = ApiResponse),
        (status = 403, description = "Caller does not own the snippet", body = ApiResponse),
        (status = 404, description = "No such snippet", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn partial_update_snippet_handler(
    State(state): State<AppState>,
    method: Method,
    links: Links,
    requester: Requester,
    path: Result<Path<i64>, PathRejection>,
    request: Result<Json<JsonValue>, JsonRejection>,
) -> impl IntoResponse {
    write_snippet(&state, &method, &links, &requester, path, request).await
}

#[utoipa::path(
    delete,
    path = "/snippets/{id}",
    params(
        ("id" = i64, Path, description = "Snippet id")
    ),
    responses(
        (status = 204, description = "Snippet deleted"),
        (status = 401, description = "Authentication required", body = ApiResponse),
        (status = 403, description = "Caller does not own the snippet", body = ApiResponse),
        (status = 404, description = "No such snippet", body = ApiResponse)
    )
)]
pub async fn destroy_snippet_handler(
    State(state): State<AppState>,
    requester: Requester,
    path: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let id = match record_id(path) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.service.destroy(&requester, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/snippets/{id}/highlight",
    params(
        ("id" = i64, Path, description = "Snippet id")
    ),
    responses(
        (status = 200, description = "Rendered HTML document", content_type = "text/html", body = String),
        (status = 404, description = "No such snippet", body = ApiResponse)
    )
)]
pub async fn highlight_snippet_handler(
    State(state): State<AppState>,
    requester: Requester,
    path: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let id = match record_id(path) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    match state.service.highlight(&requester, id).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => e.into_response(),
    }
}

/// PUT and PATCH share one path; the method decides between full and partial update.
async fn write_snippet(
    state: &AppState,
    method: &Method,
    links: &Links,
    requester: &Requester,
    path: Result<Path<i64>, PathRejection>,
    request: Result<Json<JsonValue>, JsonRejection>,
) -> Response {
    let action = match Action::from_method(method, true) {
        Some(a @ (Action::Update | Action::PartialUpdate)) => a,
        _ => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };
    let id = match record_id(path) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let Json(payload) = match request {
        Ok(v) => v,
        Err(e) => return undecodable_body(state, requester, action, Some(id), e).await,
    };

    let result = if action == Action::PartialUpdate {
        state.service.partial_update(requester, id, &payload).await
    } else {
        state.service.update(requester, id, &payload).await
    };
    match result {
        Ok(snippet) => ok_json(StatusCode::OK, &SnippetResponse::from_snippet(&snippet, links)),
        Err(e) => e.into_response(),
    }
}

/// A body that is not JSON still loses to a missing record or a denied requester.
async fn undecodable_body(
    state: &AppState,
    requester: &Requester,
    action: Action,
    id: Option<i64>,
    rejection: JsonRejection,
) -> Response {
    if let Err(e) = state.service.authorize(requester, action, id).await {
        return e.into_response();
    }
    json_422(rejection, EXPECTED_SNIPPET_BODY).into_response()
}
