use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use graphrag_viz::graph::{ExportError, GraphDocument, GraphExporter};
use graphrag_viz::ExportConfig;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_parquet(path: &Path, columns: Vec<(&str, DataType, ArrayRef)>) {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, dt, _)| Field::new(*name, dt.clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, _, a)| a).collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();

    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn strings(values: &[Option<&str>]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

fn write_entities(dir: &Path) {
    write_parquet(
        &dir.join("entities.parquet"),
        vec![
            ("id", DataType::Utf8, strings(&[Some("e1"), Some("e2"), Some("e3")])),
            (
                "title",
                DataType::Utf8,
                strings(&[Some("郑庄公"), Some("共叔段"), Some("武姜")]),
            ),
            (
                "type",
                DataType::Utf8,
                strings(&[Some("PERSON"), Some("PERSON"), None]),
            ),
            (
                "description",
                DataType::Utf8,
                strings(&[Some("郑国国君"), None, Some("郑武公夫人")]),
            ),
            (
                "degree",
                DataType::Int64,
                Arc::new(Int64Array::from(vec![Some(5), None, Some(2)])),
            ),
        ],
    );
}

fn write_relationships(dir: &Path) {
    write_parquet(
        &dir.join("relationships.parquet"),
        vec![
            (
                "source",
                DataType::Utf8,
                strings(&[Some("郑庄公"), Some("郑庄公"), Some("武姜")]),
            ),
            (
                "target",
                DataType::Utf8,
                strings(&[Some("共叔段"), Some("颍考叔"), Some("共叔段")]),
            ),
            (
                "description",
                DataType::Utf8,
                strings(&[Some("兄弟"), Some("君臣"), None]),
            ),
            (
                "weight",
                DataType::Float64,
                Arc::new(Float64Array::from(vec![Some(2.0), Some(1.0), None])),
            ),
        ],
    );
}

fn exporter_for(dir: &TempDir) -> GraphExporter {
    GraphExporter::new(ExportConfig::default().rooted(dir.path()))
}

#[test]
fn test_export_from_parquet() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("output")).unwrap();
    write_entities(&dir.path().join("output"));
    write_relationships(&dir.path().join("output"));

    let summary = exporter_for(&dir).export().unwrap();
    let doc = &summary.document;

    assert_eq!(summary.path, dir.path().join("viz_data").join("graph.json"));
    assert_eq!(summary.relationships_read, 3);
    assert_eq!(summary.dropped, 1);

    assert_eq!(doc.nodes.len(), 3);
    assert_eq!(doc.nodes[0].key, "e1");
    assert_eq!(doc.nodes[0].label, "郑庄公");
    assert_eq!(doc.nodes[0].tag, "PERSON");
    assert_eq!(doc.nodes[0].degree, 5);
    assert_eq!(doc.nodes[1].description, "");
    assert_eq!(doc.nodes[1].degree, 1);
    assert_eq!(doc.nodes[2].tag, "UNKNOWN");

    // 颍考叔 is not an entity, so the second relationship is dropped
    assert_eq!(doc.edges.len(), 2);
    assert_eq!(doc.edges[0].key, "edge_0");
    assert_eq!(doc.edges[0].source, "e1");
    assert_eq!(doc.edges[0].target, "e2");
    assert_eq!(doc.edges[0].label, "兄弟");
    assert_eq!(doc.edges[0].weight, 2.0);
    assert_eq!(doc.edges[1].key, "edge_1");
    assert_eq!(doc.edges[1].source, "e3");
    assert_eq!(doc.edges[1].label, "");
    assert_eq!(doc.edges[1].weight, 1.0);

    let written = GraphDocument::read_from(&summary.path).unwrap();
    assert_eq!(&written, doc);
}

#[test]
fn test_written_file_is_pretty_and_keeps_cjk() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("output")).unwrap();
    write_entities(&dir.path().join("output"));
    write_relationships(&dir.path().join("output"));

    let summary = exporter_for(&dir).export().unwrap();
    let text = std::fs::read_to_string(&summary.path).unwrap();

    assert!(text.starts_with("{\n  \"nodes\": ["));
    assert!(text.contains("郑庄公"));
    assert!(!text.contains("\\u"));
}

#[test]
fn test_optional_columns_may_be_absent() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    std::fs::create_dir_all(&output).unwrap();

    write_parquet(
        &output.join("entities.parquet"),
        vec![
            ("id", DataType::Utf8, strings(&[Some("a"), Some("b")])),
            ("title", DataType::Utf8, strings(&[Some("A"), Some("B")])),
        ],
    );
    write_parquet(
        &output.join("relationships.parquet"),
        vec![
            ("source", DataType::Utf8, strings(&[Some("A")])),
            ("target", DataType::Utf8, strings(&[Some("B")])),
        ],
    );

    let doc = exporter_for(&dir).export().unwrap().document;
    assert!(doc.nodes.iter().all(|n| n.tag == "UNKNOWN" && n.degree == 1));
    assert_eq!(doc.edges.len(), 1);
    assert_eq!(doc.edges[0].weight, 1.0);
    assert_eq!(doc.edges[0].label, "");
}

#[test]
fn test_long_text_is_truncated() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    std::fs::create_dir_all(&output).unwrap();

    let long_description = "春".repeat(800);
    let long_label = "秋".repeat(150);
    write_parquet(
        &output.join("entities.parquet"),
        vec![
            ("id", DataType::Utf8, strings(&[Some("a"), Some("b")])),
            ("title", DataType::Utf8, strings(&[Some("A"), Some("B")])),
            (
                "description",
                DataType::Utf8,
                strings(&[Some(long_description.as_str()), Some("short")]),
            ),
        ],
    );
    write_parquet(
        &output.join("relationships.parquet"),
        vec![
            ("source", DataType::Utf8, strings(&[Some("A")])),
            ("target", DataType::Utf8, strings(&[Some("B")])),
            (
                "description",
                DataType::Utf8,
                strings(&[Some(long_label.as_str())]),
            ),
        ],
    );

    let doc = exporter_for(&dir).export().unwrap().document;
    assert_eq!(doc.nodes[0].description.chars().count(), 500);
    assert_eq!(doc.nodes[1].description, "short");
    assert_eq!(doc.edges[0].label.chars().count(), 100);
}

#[test]
fn test_missing_relationships_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    std::fs::create_dir_all(&output).unwrap();
    write_entities(&output);

    let err = exporter_for(&dir).export().unwrap_err();
    match err {
        ExportError::MissingInput { table, .. } => assert_eq!(table, "relationships"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join("viz_data").join("graph.json").exists());
}

#[test]
fn test_missing_entities_file() {
    let dir = TempDir::new().unwrap();

    let err = exporter_for(&dir).export().unwrap_err();
    assert!(matches!(
        err,
        ExportError::MissingInput { table: "entities", .. }
    ));
}

#[test]
fn test_missing_required_column() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    std::fs::create_dir_all(&output).unwrap();

    write_parquet(
        &output.join("entities.parquet"),
        vec![("id", DataType::Utf8, strings(&[Some("a")]))],
    );
    write_relationships(&output);

    let err = exporter_for(&dir).export().unwrap_err();
    assert!(matches!(
        err,
        ExportError::MissingInput { table: "entities", .. }
    ));
}

#[test]
fn test_reexport_overwrites_previous_document() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    std::fs::create_dir_all(&output).unwrap();
    write_entities(&output);
    write_relationships(&output);

    let exporter = exporter_for(&dir);
    let first = exporter.export().unwrap();

    write_parquet(
        &output.join("relationships.parquet"),
        vec![
            ("source", DataType::Utf8, strings(&[])),
            ("target", DataType::Utf8, strings(&[])),
        ],
    );
    let second = exporter.export().unwrap();

    assert_eq!(first.path, second.path);
    let written = GraphDocument::read_from(&second.path).unwrap();
    assert_eq!(written.nodes.len(), 3);
    assert!(written.edges.is_empty());
}

#[test]
fn test_nan_weight_exports_as_default() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    std::fs::create_dir_all(&output).unwrap();
    write_entities(&output);
    write_parquet(
        &output.join("relationships.parquet"),
        vec![
            ("source", DataType::Utf8, strings(&[Some("郑庄公")])),
            ("target", DataType::Utf8, strings(&[Some("共叔段")])),
            (
                "weight",
                DataType::Float64,
                Arc::new(Float64Array::from(vec![Some(f64::NAN)])),
            ),
        ],
    );

    let summary = exporter_for(&dir).export().unwrap();
    assert_eq!(summary.document.edges[0].weight, 1.0);

    let written = GraphDocument::read_from(&summary.path).unwrap();
    assert_eq!(written, summary.document);
}

#[test]
fn test_null_title_and_null_endpoint_do_not_join() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output");
    std::fs::create_dir_all(&output).unwrap();

    write_parquet(
        &output.join("entities.parquet"),
        vec![
            ("id", DataType::Utf8, strings(&[Some("e1"), Some("e2")])),
            ("title", DataType::Utf8, strings(&[None, Some("B")])),
        ],
    );
    write_parquet(
        &output.join("relationships.parquet"),
        vec![
            ("source", DataType::Utf8, strings(&[None, Some("B")])),
            ("target", DataType::Utf8, strings(&[Some("B"), None])),
        ],
    );

    let summary = exporter_for(&dir).export().unwrap();
    assert_eq!(summary.document.nodes.len(), 2);
    assert_eq!(summary.document.nodes[0].label, "");
    assert!(summary.document.edges.is_empty());
    assert_eq!(summary.dropped, 2);
}
