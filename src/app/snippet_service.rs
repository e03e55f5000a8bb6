//! The Snippet Service.
//!
//! This module sits between the HTTP layer and the Record Store. It is responsible for:
//! 1.  Resolving target records and running the authorization gate before any mutation.
//! 2.  Validating payloads against the snippet field schema.
//! 3.  Keeping `highlighted` consistent with the inputs that produce it.
//!
//! Every operation takes the requester explicitly; nothing here reads ambient request state.

use crate::crypto::hashing::{hash_password, verify_password, verify_unknown_user};
use crate::domain::highlight::Highlighter;
use crate::domain::model::{NewSnippet, Owner, OwnerDetail, Snippet};
use crate::domain::permission::{check_collection, check_object, Action, Denial, Requester};
use crate::domain::schema::{validate, SnippetChanges, ValidationErrors, WriteMode};
use crate::storage::RecordStore;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found.")]
    NotFound,
    #[error("You do not have permission to perform this action.")]
    Forbidden,
    #[error("{0}")]
    Unauthenticated(String),
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),
    #[error("{0}")]
    Conflict(String),
    #[error("store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn credentials_not_provided() -> Self {
        ServiceError::Unauthenticated("Authentication credentials were not provided.".to_string())
    }

    pub fn invalid_credentials() -> Self {
        ServiceError::Unauthenticated("Invalid username/password.".to_string())
    }
}

impl From<Denial> for ServiceError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => ServiceError::credentials_not_provided(),
            Denial::Forbidden => ServiceError::Forbidden,
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::ValidationFailed(errors)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The canonical list/create/retrieve/update/partial-update/delete implementation for
/// snippets, plus the read-only owner views.
pub struct SnippetService {
    store: Arc<dyn RecordStore>,
    highlighter: Highlighter,
}

impl SnippetService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            highlighter: Highlighter::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub async fn list(&self, requester: &Requester) -> ServiceResult<Vec<Snippet>> {
        check_collection(Action::List, requester)?;
        Ok(self.store.list_snippets().await?)
    }

    /// Creates a snippet owned by `requester` with `highlighted` rendered once.
    pub async fn create(&self, requester: &Requester, payload: &JsonValue) -> ServiceResult<Snippet> {
        self.gate_collection(Action::Create, requester)?;
        let changes = validate(payload, WriteMode::Create)?;

        let title = changes.title.unwrap_or_default();
        let code = changes.code.unwrap_or_default();
        let linenos = changes.linenos.unwrap_or_default();
        let language = changes.language.unwrap_or_default();
        let style = changes.style.unwrap_or_default();
        let highlighted = self.highlighter.render(&code, language, style, linenos);

        let snippet = self
            .store
            .insert_snippet(NewSnippet {
                title,
                code,
                linenos,
                language,
                style,
                owner: requester.owner().cloned(),
                highlighted,
            })
            .await?;
        info!(snippet_id = snippet.id, owner = requester.label(), "snippet created");
        Ok(snippet)
    }

    pub async fn retrieve(&self, requester: &Requester, id: i64) -> ServiceResult<Snippet> {
        let snippet = self.fetch(id).await?;
        check_object(Action::Retrieve, requester, &snippet)?;
        Ok(snippet)
    }

    /// Full update: `code` must be supplied, omitted optional fields keep their values.
    pub async fn update(&self, requester: &Requester, id: i64, payload: &JsonValue) -> ServiceResult<Snippet> {
        self.apply_update(requester, id, payload, Action::Update, WriteMode::Replace)
            .await
    }

    pub async fn partial_update(
        &self,
        requester: &Requester,
        id: i64,
        payload: &JsonValue,
    ) -> ServiceResult<Snippet> {
        self.apply_update(requester, id, payload, Action::PartialUpdate, WriteMode::Partial)
            .await
    }

    pub async fn destroy(&self, requester: &Requester, id: i64) -> ServiceResult<()> {
        let snippet = self.fetch(id).await?;
        self.gate_object(Action::Destroy, requester, &snippet)?;
        if !self.store.delete_snippet(id).await? {
            return Err(ServiceError::NotFound);
        }
        info!(snippet_id = id, owner = requester.label(), "snippet deleted");
        Ok(())
    }

    /// The stored HTML rendering of a snippet.
    pub async fn highlight(&self, requester: &Requester, id: i64) -> ServiceResult<String> {
        let snippet = self.fetch(id).await?;
        check_object(Action::Highlight, requester, &snippet)?;
        Ok(snippet.highlighted)
    }

    /// Runs the lookup and both gates for `action` without reading a payload.
    ///
    /// Used when a request body cannot be decoded, so that a missing record or a denied
    /// requester is still reported ahead of the body error.
    pub async fn authorize(&self, requester: &Requester, action: Action, id: Option<i64>) -> ServiceResult<()> {
        match id {
            None => self.gate_collection(action, requester),
            Some(id) => {
                let snippet = self.fetch(id).await?;
                self.gate_object(action, requester, &snippet)
            }
        }
    }

    pub async fn list_owners(&self) -> ServiceResult<Vec<OwnerDetail>> {
        let owners = self.store.list_owners().await?;
        let mut details = Vec::with_capacity(owners.len());
        for owner in owners {
            let snippet_ids = self.store.snippet_ids_for_owner(owner.id).await?;
            details.push(OwnerDetail { owner, snippet_ids });
        }
        Ok(details)
    }

    pub async fn retrieve_owner(&self, id: i64) -> ServiceResult<OwnerDetail> {
        let owner = self.store.get_owner(id).await?.ok_or(ServiceError::NotFound)?;
        let snippet_ids = self.store.snippet_ids_for_owner(owner.id).await?;
        Ok(OwnerDetail { owner, snippet_ids })
    }

    /// Resolves HTTP Basic credentials to a requester.
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<Requester> {
        let credentials = self.store.find_owner_credentials(username).await?;
        let password = password.to_string();
        // Argon2 is CPU-bound; keep it off the async workers.
        let verified = tokio::task::spawn_blocking(move || match credentials {
            Some(c) if verify_password(&password, &c.password_hash) => Some(c.owner),
            Some(_) => None,
            None => {
                verify_unknown_user(&password);
                None
            }
        })
        .await
        .map_err(|e| anyhow::anyhow!("password check task failed: {}", e))?;

        match verified {
            Some(owner) => Ok(Requester::Authenticated(owner)),
            None => {
                warn!(username, "authentication failed");
                Err(ServiceError::invalid_credentials())
            }
        }
    }

    /// Registers an owner. Operator tooling only; owners are not managed over HTTP.
    pub async fn register_owner(&self, username: &str, password: &str) -> ServiceResult<Owner> {
        let mut errors = ValidationErrors::default();
        if username.trim().is_empty() {
            errors.add("username", "This field may not be blank.");
        }
        if password.is_empty() {
            errors.add("password", "This field may not be blank.");
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;
        let owner = self
            .store
            .insert_owner(username, &password_hash)
            .await?
            .ok_or_else(|| ServiceError::Conflict(format!("Username '{}' is already taken.", username)))?;
        info!(owner_id = owner.id, username, "owner registered");
        Ok(owner)
    }

    async fn apply_update(
        &self,
        requester: &Requester,
        id: i64,
        payload: &JsonValue,
        action: Action,
        mode: WriteMode,
    ) -> ServiceResult<Snippet> {
        let current = self.fetch(id).await?;
        self.gate_object(action, requester, &current)?;
        let changes = validate(payload, mode)?;

        let mut next = current.clone();
        apply_changes(&mut next, changes);
        if next.highlight_inputs_differ(&current) {
            next.highlighted = self
                .highlighter
                .render(&next.code, next.language, next.style, next.linenos);
        }

        let saved = self
            .store
            .save_snippet(&next)
            .await?
            .ok_or(ServiceError::NotFound)?;
        info!(snippet_id = id, owner = requester.label(), ?action, "snippet updated");
        Ok(saved)
    }

    async fn fetch(&self, id: i64) -> ServiceResult<Snippet> {
        self.store
            .get_snippet(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    fn gate_collection(&self, action: Action, requester: &Requester) -> ServiceResult<()> {
        check_collection(action, requester).map_err(|denial| {
            warn!(?action, requester = requester.label(), ?denial, "write denied");
            ServiceError::from(denial)
        })
    }

    fn gate_object(&self, action: Action, requester: &Requester, snippet: &Snippet) -> ServiceResult<()> {
        check_object(action, requester, snippet).map_err(|denial| {
            warn!(?action, snippet_id = snippet.id, requester = requester.label(), ?denial, "write denied");
            ServiceError::from(denial)
        })
    }
}

/// Copies supplied fields onto `snippet`. Identity fields are not part of `SnippetChanges`.
fn apply_changes(snippet: &mut Snippet, changes: SnippetChanges) {
    if let Some(title) = changes.title {
        snippet.title = title;
    }
    if let Some(code) = changes.code {
        snippet.code = code;
    }
    if let Some(linenos) = changes.linenos {
        snippet.linenos = linenos;
    }
    if let Some(language) = changes.language {
        snippet.language = language;
    }
    if let Some(style) = changes.style {
        snippet.style = style;
    }
}
