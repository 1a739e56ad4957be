//! HTTP server for the graph viewer

use axum::{routing::get, Router};
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::handler::{graph_handler, index_handler, script_handler, stats_handler, VizState};
use crate::config::ServerConfig;

/// Routes for the viewer page and its JSON API
pub fn router(graph_path: PathBuf) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/app.js", get(script_handler))
        .route("/api/graph", get(graph_handler))
        .route("/api/stats", get(stats_handler))
        .layer(CorsLayer::permissive())
        .with_state(VizState::new(graph_path))
}

/// Serves an exported graph document to the browser
pub struct HttpServer {
    config: ServerConfig,
    graph_path: PathBuf,
}

impl HttpServer {
    pub fn new(config: ServerConfig, graph_path: PathBuf) -> Self {
        Self { config, graph_path }
    }

    /// Bind and serve until the process is stopped
    pub async fn start(&self) -> std::io::Result<()> {
        let app = router(self.graph_path.clone());

        let addr = format!("{}:{}", self.config.address, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Serving {} from {}", self.graph_path.display(), addr);
        info!("Viewer available at http://localhost:{}", self.config.port);

        axum::serve(listener, app).await
    }
}
