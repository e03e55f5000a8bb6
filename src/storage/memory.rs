//! In-process store with the same semantics as the Postgres one.

use crate::domain::model::{NewSnippet, Owner, OwnerCredentials, Snippet};
use crate::storage::RecordStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    owners: BTreeMap<i64, OwnerCredentials>,
    snippets: BTreeMap<i64, Snippet>,
    next_owner_id: i64,
    next_snippet_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list_snippets(&self) -> anyhow::Result<Vec<Snippet>> {
        let tables = self.tables.read().await;
        let mut snippets: Vec<Snippet> = tables.snippets.values().cloned().collect();
        snippets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(snippets)
    }

    async fn get_snippet(&self, id: i64) -> anyhow::Result<Option<Snippet>> {
        Ok(self.tables.read().await.snippets.get(&id).cloned())
    }

    async fn insert_snippet(&self, new: NewSnippet) -> anyhow::Result<Snippet> {
        let mut tables = self.tables.write().await;
        if let Some(owner) = &new.owner {
            if !tables.owners.contains_key(&owner.id) {
                anyhow::bail!("owner {} does not exist", owner.id);
            }
        }
        tables.next_snippet_id += 1;
        let snippet = Snippet {
            id: tables.next_snippet_id,
            created_at: Utc::now(),
            title: new.title,
            code: new.code,
            linenos: new.linenos,
            language: new.language,
            style: new.style,
            owner: new.owner,
            highlighted: new.highlighted,
        };
        tables.snippets.insert(snippet.id, snippet.clone());
        Ok(snippet)
    }

    async fn save_snippet(&self, snippet: &Snippet) -> anyhow::Result<Option<Snippet>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.snippets.get_mut(&snippet.id) else {
            return Ok(None);
        };
        row.title = snippet.title.clone();
        row.code = snippet.code.clone();
        row.linenos = snippet.linenos;
        row.language = snippet.language;
        row.style = snippet.style;
        row.highlighted = snippet.highlighted.clone();
        Ok(Some(row.clone()))
    }

    async fn delete_snippet(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.tables.write().await.snippets.remove(&id).is_some())
    }

    async fn list_owners(&self) -> anyhow::Result<Vec<Owner>> {
        let tables = self.tables.read().await;
        Ok(tables.owners.values().map(|c| c.owner.clone()).collect())
    }

    async fn get_owner(&self, id: i64) -> anyhow::Result<Option<Owner>> {
        let tables = self.tables.read().await;
        Ok(tables.owners.get(&id).map(|c| c.owner.clone()))
    }

    async fn snippet_ids_for_owner(&self, owner_id: i64) -> anyhow::Result<Vec<i64>> {
        let tables = self.tables.read().await;
        let mut owned: Vec<&Snippet> = tables
            .snippets
            .values()
            .filter(|s| s.owner.as_ref().map(|o| o.id) == Some(owner_id))
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(owned.into_iter().map(|s| s.id).collect())
    }

    async fn find_owner_credentials(&self, username: &str) -> anyhow::Result<Option<OwnerCredentials>> {
        let tables = self.tables.read().await;
        Ok(tables
            .owners
            .values()
            .find(|c| c.owner.username == username)
            .cloned())
    }

    async fn insert_owner(&self, username: &str, password_hash: &str) -> anyhow::Result<Option<Owner>> {
        let mut tables = self.tables.write().await;
        if tables.owners.values().any(|c| c.owner.username == username) {
            return Ok(None);
        }
        tables.next_owner_id += 1;
        let owner = Owner {
            id: tables.next_owner_id,
            username: username.to_string(),
        };
        tables.owners.insert(
            owner.id,
            OwnerCredentials {
                owner: owner.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(Some(owner))
    }
}
