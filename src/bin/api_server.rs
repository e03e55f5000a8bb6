// src/bin/api_server.rs

use snippets_api::infra::{config::Config, logging};
use snippets_api::{storage, transport};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    logging::init(config.log_format);

    // --- Record Store Initialization ---
    info!(backend = ?config.store_backend, "opening record store");
    let store = storage::open(&config).await?;
    store.ping().await?;
    info!("record store ready");

    let app_state = transport::http::AppState::new(store, config.public_base_url.clone());

    // --- API Server Initialization ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "API server listening");
    info!("Swagger UI available at /swagger-ui");

    if let Err(e) = transport::http::serve(listener, app, shutdown_signal()).await {
        error!(error = %e, "server stopped");
        return Err(e.into());
    }

    info!("graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        // No handler: serve until killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received (Ctrl+C), draining in-flight requests");
}
