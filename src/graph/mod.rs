//! Graph export for the visualizer
//!
//! This module converts the indexing pipeline's tables into the node/edge
//! document drawn by the front end:
//! - `table`: entity and relationship tables read from parquet
//! - `document`: the serialized node/edge document
//! - `exporter`: title resolution, defaults and truncation

pub mod document;
pub mod exporter;
pub mod table;

// Re-export main types
pub use document::{
    truncate_chars, DocumentError, DocumentResult, GraphDocument, GraphEdge, GraphNode,
    GraphStats, EDGE_LABEL_LIMIT, NODE_DESCRIPTION_LIMIT, UNKNOWN_TAG,
};
pub use exporter::{ExportError, ExportResult, ExportSummary, GraphExporter, TitleIndex};
pub use table::{
    EntityRecord, EntityTable, RelationshipRecord, RelationshipTable, TableError, TableResult,
};
