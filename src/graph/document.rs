//! Renderer-ready graph document
//!
//! Field names are consumed by the Sigma.js front end and must stay as they are.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum characters kept from an entity description
pub const NODE_DESCRIPTION_LIMIT: usize = 500;

/// Maximum characters kept from a relationship description
pub const EDGE_LABEL_LIMIT: usize = 100;

/// Tag used for entities without a type
pub const UNKNOWN_TAG: &str = "UNKNOWN";

/// Errors raised while persisting or loading a document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// A node as drawn by the visualizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Entity id
    pub key: String,
    /// Entity title
    pub label: String,
    /// Entity type
    pub tag: String,
    pub description: String,
    pub degree: i64,
}

/// An edge as drawn by the visualizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// `edge_<n>`, sequential over emitted edges
    pub key: String,
    /// Resolved source entity id
    pub source: String,
    /// Resolved target entity id
    pub target: String,
    pub label: String,
    pub weight: f64,
}

/// Summary counts served at `/api/stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    /// Number of distinct node tags
    pub types: usize,
}

/// Nodes and edges in export order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
    /// Node count per tag, in first-seen order
    pub fn tag_counts(&self) -> IndexMap<&str, usize> {
        let mut counts = IndexMap::new();
        for node in &self.nodes {
            *counts.entry(node.tag.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            types: self.tag_counts().len(),
        }
    }

    /// Pretty-printed JSON with non-ASCII text kept verbatim
    pub fn to_json_pretty(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document to `path`, replacing any existing file.
    ///
    /// The parent directory is created when missing. Content goes to a
    /// sibling temporary file first and is renamed into place, so a failed
    /// write never leaves a truncated document behind.
    pub fn write_to(&self, path: impl AsRef<Path>) -> DocumentResult<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;

        let write_err = |source| DocumentError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        if let Err(e) = fs::write(&tmp_path, json).and_then(|_| fs::rename(&tmp_path, path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(e));
        }

        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Keep at most `max` characters (not bytes) of `text`
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
