//! HTTP handlers for the graph viewer

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use rust_embed::RustEmbed;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use crate::graph::GraphDocument;

#[derive(RustEmbed)]
#[folder = "src/http/static/"]
struct Assets;

/// Shared handler state
#[derive(Clone)]
pub struct VizState {
    graph_path: Arc<PathBuf>,
}

impl VizState {
    pub fn new(graph_path: PathBuf) -> Self {
        Self {
            graph_path: Arc::new(graph_path),
        }
    }

    /// The document is re-read on every request so a fresh export shows up
    /// without restarting the server.
    fn load(&self) -> Result<GraphDocument, String> {
        GraphDocument::read_from(self.graph_path.as_path()).map_err(|e| {
            error!("Failed to load {}: {}", self.graph_path.display(), e);
            e.to_string()
        })
    }
}

fn asset(name: &str, content_type: mime::Mime) -> Response {
    match Assets::get(name) {
        Some(file) => (
            [(header::CONTENT_TYPE, content_type.to_string())],
            file.data.into_owned(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn index_handler() -> Response {
    asset("index.html", mime::TEXT_HTML_UTF_8)
}

pub async fn script_handler() -> Response {
    asset("app.js", mime::APPLICATION_JAVASCRIPT_UTF_8)
}

/// The full node/edge document
pub async fn graph_handler(State(state): State<VizState>) -> Response {
    match state.load() {
        Ok(doc) => Json(doc).into_response(),
        Err(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "failed to load graph data", "message": message })),
        )
            .into_response(),
    }
}

/// Node, edge and distinct type counts
pub async fn stats_handler(State(state): State<VizState>) -> Response {
    match state.load() {
        Ok(doc) => Json(doc.stats()).into_response(),
        Err(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "failed to compute stats", "message": message })),
        )
            .into_response(),
    }
}
