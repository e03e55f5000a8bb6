//! Record types for snippets and their owners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod choices;

pub use choices::{Language, Style};

/// The identity that created a snippet and may mutate it.
///
/// Two owners are the same owner when their store-assigned ids match; the
/// username is display data only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Owner {
    pub id: i64,
    pub username: String,
}

impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Owner {}

/// An owner together with the ids of the snippets it owns, oldest first.
#[derive(Debug, Clone)]
pub struct OwnerDetail {
    pub owner: Owner,
    pub snippet_ids: Vec<i64>,
}

/// A stored code fragment with its highlighting metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub code: String,
    pub linenos: bool,
    pub language: Language,
    pub style: Style,
    /// `None` only for rows that predate authentication.
    pub owner: Option<Owner>,
    /// HTML rendering of `code` under `language`/`style`/`linenos`.
    pub highlighted: String,
}

impl Snippet {
    /// Whether `other` differs from `self` in any input of the highlighting derivation.
    pub fn highlight_inputs_differ(&self, other: &Snippet) -> bool {
        self.code != other.code
            || self.language != other.language
            || self.style != other.style
            || self.linenos != other.linenos
    }
}

/// A validated snippet ready to be inserted; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub title: String,
    pub code: String,
    pub linenos: bool,
    pub language: Language,
    pub style: Style,
    pub owner: Option<Owner>,
    pub highlighted: String,
}

/// Stored credentials for an owner (see `crypto::hashing`).
#[derive(Debug, Clone)]
pub struct OwnerCredentials {
    pub owner: Owner,
    pub password_hash: String,
}
