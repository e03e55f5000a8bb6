//! PostgreSQL-backed Record Store.

use crate::domain::model::{Language, NewSnippet, Owner, OwnerCredentials, Snippet, Style};
use crate::storage::RecordStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

// Every snippet read joins the owner so `Snippet::owner` arrives resolved.
const SNIPPET_SELECT: &str = "SELECT s.id, s.created_at, s.title, s.code, s.linenos, s.language, s.style, \
     s.highlighted, s.owner_id, u.username AS owner_username \
     FROM snippets s LEFT JOIN auth_users u ON u.id = s.owner_id";

/// A Record Store that uses a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects and brings the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connecting to DATABASE_URL")?;
        Self::new_with_pool(pool).await
    }

    pub async fn new_with_pool(pool: PgPool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("applying migrations")?;
        Ok(Self { pool })
    }
}

fn snippet_from_row(row: &PgRow) -> Result<Snippet> {
    let language: String = row.try_get("language")?;
    let style: String = row.try_get("style")?;
    let owner_id: Option<i64> = row.try_get("owner_id")?;
    let owner_username: Option<String> = row.try_get("owner_username")?;
    let owner = match (owner_id, owner_username) {
        (Some(id), Some(username)) => Some(Owner { id, username }),
        _ => None,
    };
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Snippet {
        id: row.try_get("id")?,
        created_at,
        title: row.try_get("title")?,
        code: row.try_get("code")?,
        linenos: row.try_get("linenos")?,
        language: language
            .parse::<Language>()
            .with_context(|| format!("stored language '{}'", language))?,
        style: style
            .parse::<Style>()
            .with_context(|| format!("stored style '{}'", style))?,
        owner,
        highlighted: row.try_get("highlighted")?,
    })
}

fn owner_from_row(row: &PgRow) -> Result<Owner> {
    Ok(Owner {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
    })
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_snippets(&self) -> Result<Vec<Snippet>> {
        let sql = format!("{} ORDER BY s.created_at ASC, s.id ASC", SNIPPET_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(snippet_from_row).collect()
    }

    async fn get_snippet(&self, id: i64) -> Result<Option<Snippet>> {
        let sql = format!("{} WHERE s.id = $1", SNIPPET_SELECT);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(snippet_from_row).transpose()
    }

    async fn insert_snippet(&self, new: NewSnippet) -> Result<Snippet> {
        let row = sqlx::query(
            "INSERT INTO snippets (title, code, linenos, language, style, owner_id, highlighted)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, created_at",
        )
        .bind(&new.title)
        .bind(&new.code)
        .bind(new.linenos)
        .bind(new.language.id())
        .bind(new.style.id())
        .bind(new.owner.as_ref().map(|o| o.id))
        .bind(&new.highlighted)
        .fetch_one(&self.pool)
        .await?;

        Ok(Snippet {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            title: new.title,
            code: new.code,
            linenos: new.linenos,
            language: new.language,
            style: new.style,
            owner: new.owner,
            highlighted: new.highlighted,
        })
    }

    async fn save_snippet(&self, snippet: &Snippet) -> Result<Option<Snippet>> {
        let updated = sqlx::query(
            "UPDATE snippets
                SET title = $2, code = $3, linenos = $4, language = $5, style = $6, highlighted = $7
              WHERE id = $1",
        )
        .bind(snippet.id)
        .bind(&snippet.title)
        .bind(&snippet.code)
        .bind(snippet.linenos)
        .bind(snippet.language.id())
        .bind(snippet.style.id())
        .bind(&snippet.highlighted)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_snippet(snippet.id).await
    }

    async fn delete_snippet(&self, id: i64) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM snippets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected() > 0)
    }

    async fn list_owners(&self) -> Result<Vec<Owner>> {
        let rows = sqlx::query("SELECT id, username FROM auth_users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(owner_from_row).collect()
    }

    async fn get_owner(&self, id: i64) -> Result<Option<Owner>> {
        let row = sqlx::query("SELECT id, username FROM auth_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(owner_from_row).transpose()
    }

    async fn snippet_ids_for_owner(&self, owner_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM snippets WHERE owner_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn find_owner_credentials(&self, username: &str) -> Result<Option<OwnerCredentials>> {
        let row = sqlx::query("SELECT id, username, password_hash FROM auth_users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(r) => Ok(Some(OwnerCredentials {
                owner: owner_from_row(&r)?,
                password_hash: r.try_get("password_hash")?,
            })),
            None => Ok(None),
        }
    }

    async fn insert_owner(&self, username: &str, password_hash: &str) -> Result<Option<Owner>> {
        let row = sqlx::query(
            "INSERT INTO auth_users (username, password_hash) VALUES ($1, $2)
             ON CONFLICT (username) DO NOTHING
             RETURNING id, username",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(owner_from_row).transpose()
    }
}
