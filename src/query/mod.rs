//! Query engine collaborator
//!
//! Retrieval itself happens in the external GraphRAG library. This module
//! defines the seam (`QueryEngine`), a process-backed implementation, and the
//! canned example queries used by the operator CLI.

pub mod engine;
pub mod examples;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::task::TaskError;

pub use engine::CommandQueryEngine;
pub use examples::{render_result, run_examples, ExampleOutcome, ExampleQuery, RenderLimits, EXAMPLE_QUERIES};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Unknown search type: {0} (expected local, global or basic)")]
    InvalidSearchType(String),

    #[error("Query engine failed: {0}")]
    Engine(#[from] TaskError),
}

pub type QueryOutcome<T> = Result<T, QueryError>;

/// Retrieval mode requested from the external engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Entity-centred search over specific facts
    #[default]
    Local,
    /// Community-report aggregation for broad questions
    Global,
    /// Plain vector retrieval
    Basic,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Local => "local",
            SearchType::Global => "global",
            SearchType::Basic => "basic",
        }
    }

    /// Map an interactive menu choice; anything unrecognised means local
    pub fn from_menu_choice(choice: &str) -> Self {
        match choice.trim() {
            "2" => SearchType::Global,
            "3" => SearchType::Basic,
            _ => SearchType::Local,
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(SearchType::Local),
            "global" => Ok(SearchType::Global),
            "basic" => Ok(SearchType::Basic),
            other => Err(QueryError::InvalidSearchType(other.to_string())),
        }
    }
}

/// What the engine returned. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryResult {
    pub answer: Option<String>,
    /// Supporting text snippets, most relevant first
    pub context: Vec<String>,
    /// Names of entities involved in the answer
    pub entities: Vec<String>,
}

impl QueryResult {
    pub fn has_answer(&self) -> bool {
        self.answer.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

/// The external question-answering engine
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn query(&self, question: &str, search_type: SearchType) -> QueryOutcome<QueryResult>;
}
