//! GraphRAG Viz
//!
//! Operator tooling around a GraphRAG knowledge-graph index.
//!
//! # Components
//!
//! - `graph`: converts the pipeline's entity and relationship tables into a
//!   node/edge document for the Sigma.js viewer
//! - `http`: serves the viewer and the exported document
//! - `probe`: connectivity diagnostics against the hosted chat completion API
//! - `query`: the external query engine seam and canned example queries
//! - `task`: child-process contract used for indexing and querying
//! - `workspace`: environment and artifact checks for the project directory
//! - `config`: the single configuration object passed to all of the above
//!
//! Indexing, retrieval and prompting live in the external GraphRAG library;
//! nothing here ranks or embeds.
//!
//! ## Example Usage
//!
//! ```rust
//! use graphrag_viz::graph::{
//!     EntityRecord, EntityTable, GraphExporter, RelationshipRecord, RelationshipTable,
//! };
//!
//! let entities = EntityTable::new(vec![
//!     EntityRecord::new("e1", "郑庄公").with_degree(5),
//!     EntityRecord::new("e2", "共叔段"),
//! ]);
//! let relationships = RelationshipTable::new(vec![
//!     RelationshipRecord::new("郑庄公", "共叔段").with_weight(2.0),
//!     RelationshipRecord::new("郑庄公", "颍考叔"),
//! ]);
//!
//! let doc = GraphExporter::build(&entities, &relationships);
//! assert_eq!(doc.nodes.len(), 2);
//! assert_eq!(doc.edges.len(), 1);
//! assert_eq!(doc.edges[0].key, "edge_0");
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod graph;
pub mod http;
pub mod probe;
pub mod query;
pub mod task;
pub mod workspace;

// Re-export main types for convenience
pub use config::{
    ConfigError, ConfigResult, ExportConfig, IndexingConfig, LLMProvider, LlmConfig,
    QueryConfig, ServerConfig, ToolkitConfig, WorkspaceConfig,
};

pub use graph::{
    EntityRecord, EntityTable, ExportError, ExportResult, ExportSummary, GraphDocument,
    GraphEdge, GraphExporter, GraphNode, GraphStats, RelationshipRecord, RelationshipTable,
};

pub use http::HttpServer;

pub use probe::{CheckOutcome, ConnectivityProbe, ProbeError, ProbeReport, ProbeResult};

pub use query::{
    CommandQueryEngine, QueryEngine, QueryError, QueryOutcome, QueryResult, SearchType,
};

pub use task::{ExternalTask, IndexingJob, TaskError, TaskOutput, TaskResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
