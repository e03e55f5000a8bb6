use crate::domain::model::{Language, Style};
use crate::transport::http::handlers::{health, root, snippets, users};
use crate::transport::http::types::{
    ApiResponse, ApiRootResponse, SnippetResponse, SnippetWrite, UserResponse,
};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        root::api_root_handler,
        health::healthcheck_handler,
        snippets::list_snippets_handler,
        snippets::create_snippet_handler,
        snippets::retrieve_snippet_handler,
        snippets::update_snippet_handler,
        snippets::partial_update_snippet_handler,
        snippets::destroy_snippet_handler,
        snippets::highlight_snippet_handler,
        users::list_users_handler,
        users::retrieve_user_handler
    ),
    components(schemas(
        ApiResponse,
        ApiRootResponse,
        SnippetWrite,
        SnippetResponse,
        UserResponse,
        Language,
        Style
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/", get(root::api_root_handler))
        .route("/health", get(health::healthcheck_handler))
        .route(
            "/snippets",
            get(snippets::list_snippets_handler).post(snippets::create_snippet_handler),
        )
        .route(
            "/snippets/:id",
            get(snippets::retrieve_snippet_handler)
                .put(snippets::update_snippet_handler)
                .patch(snippets::partial_update_snippet_handler)
                .delete(snippets::destroy_snippet_handler),
        )
        .route("/snippets/:id/highlight", get(snippets::highlight_snippet_handler))
        .route("/users", get(users::list_users_handler))
        .route("/users/:id", get(users::retrieve_user_handler))
        .with_state(app_state)
}

/// Serves `app` until `shutdown` resolves, then lets in-flight requests finish.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}
