//! Absolute hyperlinks for the hyperlinked representations.

use crate::transport::http::types::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::HOST;
use axum::http::request::Parts;
use std::convert::Infallible;

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const LOCAL_BASE: &str = "http://localhost";

/// Builds resource URLs relative to the base the client reached us on.
#[derive(Debug, Clone)]
pub struct Links {
    base: String,
}

impl Links {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn snippets(&self) -> String {
        format!("{}/snippets", self.base)
    }

    pub fn snippet(&self, id: i64) -> String {
        format!("{}/snippets/{}", self.base, id)
    }

    pub fn highlight(&self, id: i64) -> String {
        format!("{}/snippets/{}/highlight", self.base, id)
    }

    pub fn users(&self) -> String {
        format!("{}/users", self.base)
    }

    pub fn user(&self, id: i64) -> String {
        format!("{}/users/{}", self.base, id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Links {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .filter(|h| !h.is_empty());

        let Some(host) = host else {
            let base = state.public_base_url.as_deref().unwrap_or(LOCAL_BASE);
            return Ok(Links::new(base));
        };

        let scheme = parts
            .headers
            .get(FORWARDED_PROTO)
            .and_then(|h| h.to_str().ok())
            .filter(|p| *p == "https" || *p == "http")
            .unwrap_or("http");
        Ok(Links::new(format!("{}://{}", scheme, host)))
    }
}
