//! Entity and relationship tables produced by the indexing pipeline
//!
//! The pipeline writes `entities.parquet` and `relationships.parquet`. Only
//! the columns needed for export are decoded; optional columns may be missing
//! entirely or contain nulls, and numeric columns may use any numeric Arrow
//! type.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a table
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Table file not found: {0}")]
    NotFound(PathBuf),

    #[error("Cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid parquet file {path}: {source}")]
    Parquet {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },

    #[error("Cannot decode {path}: {source}")]
    Arrow {
        path: PathBuf,
        #[source]
        source: ArrowError,
    },

    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
}

pub type TableResult<T> = Result<T, TableError>;

/// One row of the entity table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityRecord {
    /// Opaque identifier, compared as a string
    pub id: String,
    /// Display title; relationships refer to entities by title. A null
    /// title is never matched by any relationship.
    pub title: Option<String>,
    /// Category such as PERSON or GEO
    pub entity_type: Option<String>,
    pub description: Option<String>,
    /// Centrality measure computed by the pipeline
    pub degree: Option<i64>,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_degree(mut self, degree: i64) -> Self {
        self.degree = Some(degree);
        self
    }
}

/// One row of the relationship table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelationshipRecord {
    /// Title of the source entity
    pub source: Option<String>,
    /// Title of the target entity
    pub target: Option<String>,
    pub description: Option<String>,
    pub weight: Option<f64>,
}

impl RelationshipRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Entity rows in table order
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    rows: Vec<EntityRecord>,
}

impl EntityTable {
    const REQUIRED: [&'static str; 2] = ["id", "title"];

    pub fn new(rows: Vec<EntityRecord>) -> Self {
        Self { rows }
    }

    /// Read an entities parquet file
    pub fn from_parquet(path: impl AsRef<Path>) -> TableResult<Self> {
        let path = path.as_ref();
        let batches = read_batches(path, &Self::REQUIRED)?;
        let table = Self::from_batches(&batches).map_err(|source| TableError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Decoded {} entities from {}", table.len(), path.display());
        Ok(table)
    }

    /// Decode record batches that carry at least the `id` and `title` columns
    pub fn from_batches(batches: &[RecordBatch]) -> Result<Self, ArrowError> {
        let mut rows = Vec::new();
        for batch in batches {
            let ids = string_column(batch, "id")?;
            let titles = string_column(batch, "title")?;
            let types = string_column(batch, "type")?;
            let descriptions = string_column(batch, "description")?;
            let degrees = int_column(batch, "degree")?;

            for i in 0..batch.num_rows() {
                rows.push(EntityRecord {
                    id: string_at(&ids, i).unwrap_or_default(),
                    title: string_at(&titles, i),
                    entity_type: string_at(&types, i),
                    description: string_at(&descriptions, i),
                    degree: degrees
                        .as_ref()
                        .filter(|a| a.is_valid(i))
                        .map(|a| a.value(i)),
                });
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[EntityRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Relationship rows in table order
#[derive(Debug, Clone, Default)]
pub struct RelationshipTable {
    rows: Vec<RelationshipRecord>,
}

impl RelationshipTable {
    const REQUIRED: [&'static str; 2] = ["source", "target"];

    pub fn new(rows: Vec<RelationshipRecord>) -> Self {
        Self { rows }
    }

    /// Read a relationships parquet file
    pub fn from_parquet(path: impl AsRef<Path>) -> TableResult<Self> {
        let path = path.as_ref();
        let batches = read_batches(path, &Self::REQUIRED)?;
        let table = Self::from_batches(&batches).map_err(|source| TableError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Decoded {} relationships from {}", table.len(), path.display());
        Ok(table)
    }

    /// Decode record batches that carry at least the `source` and `target` columns
    pub fn from_batches(batches: &[RecordBatch]) -> Result<Self, ArrowError> {
        let mut rows = Vec::new();
        for batch in batches {
            let sources = string_column(batch, "source")?;
            let targets = string_column(batch, "target")?;
            let descriptions = string_column(batch, "description")?;
            let weights = float_column(batch, "weight")?;

            for i in 0..batch.num_rows() {
                rows.push(RelationshipRecord {
                    source: string_at(&sources, i),
                    target: string_at(&targets, i),
                    description: string_at(&descriptions, i),
                    weight: weights
                        .as_ref()
                        .filter(|a| a.is_valid(i))
                        .map(|a| a.value(i)),
                });
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[RelationshipRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelationshipRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn read_batches(path: &Path, required: &[&'static str]) -> TableResult<Vec<RecordBatch>> {
    if !path.is_file() {
        return Err(TableError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parquet_err = |source| TableError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    check_columns(builder.schema(), path, required)?;

    let reader = builder.build().map_err(parquet_err)?;
    reader
        .collect::<Result<Vec<_>, ArrowError>>()
        .map_err(|source| TableError::Arrow {
            path: path.to_path_buf(),
            source,
        })
}

fn check_columns(schema: &Schema, path: &Path, required: &[&'static str]) -> TableResult<()> {
    for column in required {
        if schema.index_of(column).is_err() {
            return Err(TableError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }
    Ok(())
}

fn cast_column(batch: &RecordBatch, name: &str, to: &DataType) -> Result<Option<ArrayRef>, ArrowError> {
    batch
        .column_by_name(name)
        .map(|column| cast(column, to))
        .transpose()
}

fn string_column(batch: &RecordBatch, name: &str) -> Result<Option<StringArray>, ArrowError> {
    Ok(cast_column(batch, name, &DataType::Utf8)?
        .and_then(|a| a.as_any().downcast_ref::<StringArray>().cloned()))
}

fn int_column(batch: &RecordBatch, name: &str) -> Result<Option<Int64Array>, ArrowError> {
    Ok(cast_column(batch, name, &DataType::Int64)?
        .and_then(|a| a.as_any().downcast_ref::<Int64Array>().cloned()))
}

fn float_column(batch: &RecordBatch, name: &str) -> Result<Option<Float64Array>, ArrowError> {
    Ok(cast_column(batch, name, &DataType::Float64)?
        .and_then(|a| a.as_any().downcast_ref::<Float64Array>().cloned()))
}

fn string_at(column: &Option<StringArray>, i: usize) -> Option<String> {
    column
        .as_ref()
        .filter(|a| a.is_valid(i))
        .map(|a| a.value(i).to_string())
}
