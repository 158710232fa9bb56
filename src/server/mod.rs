//! HTTP front end.
//!
//! `POST /translate` and `POST /preview` drive the pipeline; the public
//! directory (page, preview clips, generated translations) is served as
//! static files.

pub mod error;
pub mod handlers;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::pipeline::Pipeline;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Target language when a request does not name one.
    pub default_target: String,
}

/// Build the application router.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let index = ServeFile::new(server.public_dir.join("index.html"));
    let public = ServeDir::new(&server.public_dir);

    Router::new()
        .route_service("/", index)
        .route("/translate", post(handlers::translate))
        .route("/preview", post(handlers::preview))
        .nest_service(&server.public_url_prefix, public)
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down HTTP server");
        })
        .await?;
    Ok(())
}
