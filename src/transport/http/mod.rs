pub mod auth;
pub mod links;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod common;
    pub mod health;
    pub mod root;
    pub mod snippets;
    pub mod users;
}

pub use router::{create_router, serve, ApiDoc};
pub use types::AppState;
