//! Graph export
//!
//! Turns the entity and relationship tables into a [`GraphDocument`]:
//! - every entity becomes a node, in table order
//! - a relationship becomes an edge only when both endpoint titles resolve
//! - edge keys are allocated sequentially over emitted edges

use super::document::{
    truncate_chars, DocumentError, GraphDocument, GraphEdge, GraphNode, EDGE_LABEL_LIMIT,
    NODE_DESCRIPTION_LIMIT, UNKNOWN_TAG,
};
use super::table::{EntityTable, RelationshipTable, TableError};
use crate::config::ExportConfig;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// An input table is absent or unreadable; nothing is written
    #[error("Missing input table '{table}': {source}")]
    MissingInput {
        table: &'static str,
        #[source]
        source: TableError,
    },

    /// The document could not be persisted
    #[error("Serialization failed: {0}")]
    Serialization(#[from] DocumentError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Title to entity id lookup.
///
/// When several entities share a title the first row in table order wins.
/// Entities without a title are not indexed.
#[derive(Debug)]
pub struct TitleIndex<'a> {
    ids: FxHashMap<&'a str, &'a str>,
    duplicates: usize,
}

impl<'a> TitleIndex<'a> {
    pub fn build(entities: &'a EntityTable) -> Self {
        let mut ids = FxHashMap::default();
        let mut duplicates = 0;
        for entity in entities.iter() {
            let Some(title) = entity.title.as_deref() else {
                continue;
            };
            if ids.contains_key(title) {
                duplicates += 1;
            } else {
                ids.insert(title, entity.id.as_str());
            }
        }
        Self { ids, duplicates }
    }

    pub fn resolve(&self, title: &str) -> Option<&'a str> {
        self.ids.get(title).copied()
    }

    /// Resolve a nullable endpoint; a null title never matches
    fn resolve_endpoint(&self, title: Option<&str>) -> Option<&'a str> {
        title.and_then(|t| self.resolve(t))
    }

    /// Rows whose title was already taken by an earlier row
    pub fn duplicate_titles(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Outcome of a completed export
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub document: GraphDocument,
    /// Destination file
    pub path: PathBuf,
    pub relationships_read: usize,
    /// Relationships skipped because an endpoint did not resolve
    pub dropped: usize,
}

/// Reads the pipeline tables and writes the visualization document
pub struct GraphExporter {
    config: ExportConfig,
}

impl GraphExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Build the document in memory
    pub fn build(entities: &EntityTable, relationships: &RelationshipTable) -> GraphDocument {
        let nodes: Vec<GraphNode> = entities
            .iter()
            .map(|entity| GraphNode {
                key: entity.id.clone(),
                label: entity.title.clone().unwrap_or_default(),
                tag: entity
                    .entity_type
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_TAG.to_string()),
                description: truncate_chars(
                    entity.description.as_deref().unwrap_or_default(),
                    NODE_DESCRIPTION_LIMIT,
                ),
                degree: entity.degree.map(|d| d.max(0)).unwrap_or(1),
            })
            .collect();

        let index = TitleIndex::build(entities);
        if index.duplicate_titles() > 0 {
            warn!(
                "{} entities share a title with an earlier row; edges resolve to the first",
                index.duplicate_titles()
            );
        }

        let mut edges = Vec::new();
        for relationship in relationships.iter() {
            let (Some(source), Some(target)) = (
                index.resolve_endpoint(relationship.source.as_deref()),
                index.resolve_endpoint(relationship.target.as_deref()),
            ) else {
                debug!(
                    "Skipping relationship {:?} -> {:?}: unresolved title",
                    relationship.source, relationship.target
                );
                continue;
            };

            edges.push(GraphEdge {
                key: format!("edge_{}", edges.len()),
                source: source.to_string(),
                target: target.to_string(),
                label: truncate_chars(
                    relationship.description.as_deref().unwrap_or_default(),
                    EDGE_LABEL_LIMIT,
                ),
                // NaN and infinities count as missing; JSON has no encoding for them
                weight: relationship
                    .weight
                    .filter(|w| w.is_finite())
                    .unwrap_or(1.0),
            });
        }

        GraphDocument { nodes, edges }
    }

    /// Read both tables from the configured output directory and export them
    pub fn export(&self) -> ExportResult<ExportSummary> {
        let entities_path = self.config.entities_path();
        let entities = EntityTable::from_parquet(&entities_path).map_err(|source| {
            ExportError::MissingInput {
                table: "entities",
                source,
            }
        })?;
        info!("Read {} entities from {}", entities.len(), entities_path.display());

        let relationships_path = self.config.relationships_path();
        let relationships = RelationshipTable::from_parquet(&relationships_path).map_err(
            |source| ExportError::MissingInput {
                table: "relationships",
                source,
            },
        )?;
        info!(
            "Read {} relationships from {}",
            relationships.len(),
            relationships_path.display()
        );

        self.export_tables(&entities, &relationships)
    }

    /// Export tables that are already in memory
    pub fn export_tables(
        &self,
        entities: &EntityTable,
        relationships: &RelationshipTable,
    ) -> ExportResult<ExportSummary> {
        let document = Self::build(entities, relationships);
        let path = self.config.graph_path();
        document.write_to(&path)?;

        let dropped = relationships.len() - document.edges.len();
        info!(
            "Exported {} nodes, {} edges to {} ({} relationships dropped)",
            document.nodes.len(),
            document.edges.len(),
            path.display(),
            dropped
        );

        Ok(ExportSummary {
            document,
            path,
            relationships_read: relationships.len(),
            dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::table::{EntityRecord, RelationshipRecord};
    use tempfile::TempDir;

    fn scenario() -> (EntityTable, RelationshipTable) {
        let entities = EntityTable::new(vec![
            EntityRecord::new("e1", "郑庄公").with_degree(5),
            EntityRecord::new("e2", "共叔段"),
        ]);
        let relationships = RelationshipTable::new(vec![
            RelationshipRecord::new("郑庄公", "共叔段").with_weight(2.0),
            RelationshipRecord::new("郑庄公", "颍考叔"),
        ]);
        (entities, relationships)
    }

    #[test]
    fn test_reference_scenario() {
        let (entities, relationships) = scenario();
        let doc = GraphExporter::build(&entities, &relationships);

        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].key, "e1");
        assert_eq!(doc.nodes[0].degree, 5);
        assert_eq!(doc.nodes[1].key, "e2");
        assert_eq!(doc.nodes[1].degree, 1);
        assert_eq!(doc.nodes[1].tag, "UNKNOWN");
        assert_eq!(doc.nodes[1].description, "");

        assert_eq!(doc.edges.len(), 1);
        let edge = &doc.edges[0];
        assert_eq!(edge.key, "edge_0");
        assert_eq!(edge.source, "e1");
        assert_eq!(edge.target, "e2");
        assert_eq!(edge.weight, 2.0);
        assert_eq!(edge.label, "");
    }

    #[test]
    fn test_dropped_rows_do_not_consume_keys() {
        let entities = EntityTable::new(vec![
            EntityRecord::new("a", "A"),
            EntityRecord::new("b", "B"),
        ]);
        let relationships = RelationshipTable::new(vec![
            RelationshipRecord::new("Ghost", "B"),
            RelationshipRecord::new("A", "B"),
            RelationshipRecord::new("A", "Nobody"),
            RelationshipRecord::new("B", "A"),
        ]);

        let doc = GraphExporter::build(&entities, &relationships);
        let keys: Vec<_> = doc.edges.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["edge_0", "edge_1"]);
        assert_eq!(doc.edges[0].source, "a");
        assert_eq!(doc.edges[1].source, "b");
    }

    #[test]
    fn test_truncation_limits() {
        let long_desc = "史".repeat(NODE_DESCRIPTION_LIMIT + 20);
        let long_label = "x".repeat(EDGE_LABEL_LIMIT + 1);
        let entities = EntityTable::new(vec![
            EntityRecord::new("a", "A").with_description(long_desc),
            EntityRecord::new("b", "B").with_description("short"),
        ]);
        let relationships = RelationshipTable::new(vec![
            RelationshipRecord::new("A", "B").with_description(long_label),
        ]);

        let doc = GraphExporter::build(&entities, &relationships);
        assert_eq!(doc.nodes[0].description.chars().count(), NODE_DESCRIPTION_LIMIT);
        assert_eq!(doc.nodes[1].description, "short");
        assert_eq!(doc.edges[0].label.chars().count(), EDGE_LABEL_LIMIT);
    }

    #[test]
    fn test_duplicate_titles_resolve_to_first_row() {
        let entities = EntityTable::new(vec![
            EntityRecord::new("first", "晋"),
            EntityRecord::new("second", "晋"),
            EntityRecord::new("q", "齐"),
        ]);
        let index = TitleIndex::build(&entities);
        assert_eq!(index.resolve("晋"), Some("first"));
        assert_eq!(index.duplicate_titles(), 1);
        assert_eq!(index.len(), 2);

        let relationships = RelationshipTable::new(vec![RelationshipRecord::new("齐", "晋")]);
        let doc = GraphExporter::build(&entities, &relationships);
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.edges[0].target, "first");
    }

    #[test]
    fn test_negative_degree_clamped() {
        let entities = EntityTable::new(vec![EntityRecord::new("a", "A").with_degree(-4)]);
        let doc = GraphExporter::build(&entities, &RelationshipTable::default());
        assert_eq!(doc.nodes[0].degree, 0);
    }

    #[test]
    fn test_export_tables_writes_document() {
        let tmp = TempDir::new().unwrap();
        let config = ExportConfig::default().rooted(tmp.path());
        let exporter = GraphExporter::new(config);

        let (entities, relationships) = scenario();
        let summary = exporter.export_tables(&entities, &relationships).unwrap();

        assert_eq!(summary.path, tmp.path().join("viz_data").join("graph.json"));
        assert_eq!(summary.relationships_read, 2);
        assert_eq!(summary.dropped, 1);

        let on_disk = GraphDocument::read_from(&summary.path).unwrap();
        assert_eq!(on_disk, summary.document);
    }

    #[test]
    fn test_export_without_tables_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let exporter = GraphExporter::new(ExportConfig::default().rooted(tmp.path()));

        let err = exporter.export().unwrap_err();
        assert!(matches!(
            err,
            ExportError::MissingInput { table: "entities", .. }
        ));
        assert!(!exporter.config().graph_path().exists());
        assert!(!tmp.path().join("viz_data").exists());
    }

    #[test]
    fn test_null_titles_never_join() {
        let untitled = EntityRecord {
            id: "e1".to_string(),
            title: None,
            ..Default::default()
        };
        let entities = EntityTable::new(vec![untitled, EntityRecord::new("e2", "B")]);
        let relationships = RelationshipTable::new(vec![
            RelationshipRecord {
                source: None,
                target: Some("B".to_string()),
                ..Default::default()
            },
            RelationshipRecord {
                source: Some("B".to_string()),
                target: None,
                ..Default::default()
            },
            RelationshipRecord::new("", "B"),
        ]);

        let index = TitleIndex::build(&entities);
        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve(""), None);

        let doc = GraphExporter::build(&entities, &relationships);
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].label, "");
        assert!(doc.edges.is_empty());
    }

    #[test]
    fn test_non_finite_weight_defaults_and_round_trips() {
        let entities = EntityTable::new(vec![
            EntityRecord::new("a", "A"),
            EntityRecord::new("b", "B"),
        ]);
        let relationships = RelationshipTable::new(vec![
            RelationshipRecord::new("A", "B").with_weight(f64::NAN),
            RelationshipRecord::new("B", "A").with_weight(f64::INFINITY),
            RelationshipRecord::new("A", "A").with_weight(0.5),
        ]);

        let tmp = TempDir::new().unwrap();
        let exporter = GraphExporter::new(ExportConfig::default().rooted(tmp.path()));
        let summary = exporter.export_tables(&entities, &relationships).unwrap();

        let weights: Vec<f64> = summary.document.edges.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![1.0, 1.0, 0.5]);

        let on_disk = GraphDocument::read_from(&summary.path).unwrap();
        assert_eq!(on_disk, summary.document);
    }
}
