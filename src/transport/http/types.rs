use crate::app::snippet_service::SnippetService;
use crate::domain::model::{Language, OwnerDetail, Snippet, Style};
use crate::storage::RecordStore;
use crate::transport::http::links::Links;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SnippetService>,
    /// Fallback base for hyperlinks when a request has no `Host` header.
    pub public_base_url: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, public_base_url: Option<String>) -> Self {
        Self {
            service: Arc::new(SnippetService::new(store)),
            public_base_url,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, data: Option<JsonValue>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

/// Writable snippet fields. Read-only fields sent by clients are ignored.
#[derive(Deserialize, Debug, ToSchema)]
pub struct SnippetWrite {
    /// At most 100 characters. Defaults to empty.
    pub title: Option<String>,
    /// Required on create and full update.
    pub code: Option<String>,
    /// Defaults to false.
    pub linenos: Option<bool>,
    /// Defaults to `python`.
    pub language_id: Option<Language>,
    /// Defaults to `friendly`.
    pub style_id: Option<Style>,
}

/// Hyperlinked snippet representation.
#[derive(Serialize, Debug, ToSchema)]
pub struct SnippetResponse {
    pub id: i64,
    pub url: String,
    /// Link to the rendered HTML.
    pub highlight: String,
    /// Owner username; null for snippets that predate authentication.
    pub owner: Option<String>,
    pub title: String,
    pub code: String,
    pub linenos: bool,
    pub language_id: Language,
    pub style_id: Style,
    pub created_at: DateTime<Utc>,
}

impl SnippetResponse {
    pub fn from_snippet(snippet: &Snippet, links: &Links) -> Self {
        Self {
            id: snippet.id,
            url: links.snippet(snippet.id),
            highlight: links.highlight(snippet.id),
            owner: snippet.owner.as_ref().map(|o| o.username.clone()),
            title: snippet.title.clone(),
            code: snippet.code.clone(),
            linenos: snippet.linenos,
            language_id: snippet.language,
            style_id: snippet.style,
            created_at: snippet.created_at,
        }
    }
}

/// Hyperlinked owner representation.
#[derive(Serialize, Debug, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub url: String,
    pub username: String,
    /// Links to the snippets this user owns, oldest first.
    pub snippets: Vec<String>,
}

impl UserResponse {
    pub fn from_detail(detail: &OwnerDetail, links: &Links) -> Self {
        Self {
            id: detail.owner.id,
            url: links.user(detail.owner.id),
            username: detail.owner.username.clone(),
            snippets: detail.snippet_ids.iter().map(|id| links.snippet(*id)).collect(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiRootResponse {
    pub users: String,
    pub snippets: String,
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::failure(
            format!("Invalid JSON body: {} (expected: {})", err, expected),
            None,
        )),
    )
}
