pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::snippet_service::{ServiceError, SnippetService};
pub use domain::model::{Language, Owner, Snippet, Style};
pub use domain::permission::{Action, Requester};
pub use infra::config::Config;
pub use storage::{MemoryStore, PostgresStore, RecordStore};
