//! Record Store: durable storage and identity assignment for snippets and owners.

use crate::domain::model::{NewSnippet, Owner, OwnerCredentials, Snippet};
use crate::infra::config::{Config, StoreBackend};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Contract every storage backend fulfils.
///
/// Snippet listings are ordered by `created_at`, then `id`. Writes to the same row are
/// last-write-wins; the store adds no versioning of its own.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Cheap reachability check used by `/health`.
    async fn ping(&self) -> anyhow::Result<()>;

    async fn list_snippets(&self) -> anyhow::Result<Vec<Snippet>>;

    async fn get_snippet(&self, id: i64) -> anyhow::Result<Option<Snippet>>;

    /// Inserts a new row, assigning `id` and `created_at`.
    async fn insert_snippet(&self, snippet: NewSnippet) -> anyhow::Result<Snippet>;

    /// Persists the mutable fields of `snippet` (`title`, `code`, `linenos`, `language`,
    /// `style`, `highlighted`). `id`, `created_at` and `owner` are never written.
    ///
    /// Returns `None` if the row no longer exists.
    async fn save_snippet(&self, snippet: &Snippet) -> anyhow::Result<Option<Snippet>>;

    /// Returns whether a row was removed.
    async fn delete_snippet(&self, id: i64) -> anyhow::Result<bool>;

    async fn list_owners(&self) -> anyhow::Result<Vec<Owner>>;

    async fn get_owner(&self, id: i64) -> anyhow::Result<Option<Owner>>;

    /// Ids of the snippets owned by `owner_id`, oldest first.
    async fn snippet_ids_for_owner(&self, owner_id: i64) -> anyhow::Result<Vec<i64>>;

    async fn find_owner_credentials(&self, username: &str) -> anyhow::Result<Option<OwnerCredentials>>;

    /// Returns `None` if the username is already taken.
    async fn insert_owner(&self, username: &str, password_hash: &str) -> anyhow::Result<Option<Owner>>;
}

/// Opens the backend selected by `config`.
pub async fn open(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORE_BACKEND is postgres")?;
            Ok(Arc::new(PostgresStore::connect(url, config.max_connections).await?))
        }
    }
}
