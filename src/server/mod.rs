//! HTTP front end
//!
//! Routes:
//! - `POST /` upload and convert
//! - `POST /reprocess` convert an earlier upload with new settings
//! - `GET /download/:filename`, `GET /output/:filename`, `GET /uploads/:filename`
//! - `GET /healthz`

pub mod error;
pub mod form;
pub mod handlers;

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::processor::ConversionPipeline;
use crate::services::Janitor;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use self::error::ApiError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ConversionPipeline>,
}

/// Build the application router
pub fn router(pipeline: Arc<ConversionPipeline>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", post(handlers::upload))
        .route("/reprocess", post(handlers::reprocess))
        .route("/download/:filename", get(handlers::download))
        .route("/uploads/:filename", get(handlers::uploaded_file))
        .route("/output/:filename", get(handlers::output_file))
        .route("/healthz", get(handlers::healthz))
        .with_state(AppState { pipeline })
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Run the service until Ctrl-C
///
/// Creates the storage directories, starts the periodic janitor and serves
/// on the configured address.
///
/// # Errors
/// - Invalid configuration or unusable storage directories
/// - The bind address cannot be bound
pub async fn serve(config: ServiceConfig) -> Result<()> {
    let pipeline = Arc::new(ConversionPipeline::new(&config)?);

    let janitor = Arc::new(Janitor::new(&config.storage)).spawn_periodic(config.server.sweep_interval());

    let app = router(pipeline, config.server.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        addr = %listener.local_addr()?,
        max_age_secs = config.storage.max_age_secs,
        sweep_interval_secs = config.server.sweep_interval_secs,
        "Listening"
    );

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    janitor.abort();
    result?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
