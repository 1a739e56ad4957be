//! Process-backed query engine
//!
//! Invokes the GraphRAG query CLI:
//! `<python> -m graphrag query --root <root> --method <type> --query <question>`

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::{QueryEngine, QueryOutcome, QueryResult, SearchType};
use crate::config::ToolkitConfig;
use crate::task::ExternalTask;

pub struct CommandQueryEngine {
    program: String,
    prefix_args: Vec<String>,
    root: PathBuf,
    timeout: Duration,
}

impl CommandQueryEngine {
    pub fn from_config(config: &ToolkitConfig) -> Self {
        Self {
            program: config.query.python.clone(),
            prefix_args: vec!["-m".to_string(), config.query.module.clone()],
            root: config.workspace.root.clone(),
            timeout: Duration::from_secs(config.query.timeout_secs),
        }
    }

    /// Use an arbitrary launcher; `prefix_args` come before the `query` subcommand
    pub fn with_command(
        program: impl Into<String>,
        prefix_args: Vec<String>,
        root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            prefix_args,
            root: root.into(),
            timeout,
        }
    }

    fn task(&self, question: &str, search_type: SearchType) -> ExternalTask {
        ExternalTask::new(&self.program)
            .args(self.prefix_args.iter().cloned())
            .arg("query")
            .arg("--root")
            .arg(self.root.to_string_lossy())
            .args(["--method", search_type.as_str(), "--query", question])
            .current_dir(&self.root)
            .timeout(self.timeout)
    }
}

#[async_trait]
impl QueryEngine for CommandQueryEngine {
    async fn query(&self, question: &str, search_type: SearchType) -> QueryOutcome<QueryResult> {
        let task = self.task(question, search_type);
        debug!("Query ({}): {}", search_type, question);
        let output = task.run().await?;
        Ok(parse_output(&output.stdout))
    }
}

/// Interpret CLI output: a JSON object with `answer`/`context`/`entities`,
/// or plain text after an optional `SUCCESS: ... Response:` banner.
pub fn parse_output(stdout: &str) -> QueryResult {
    let trimmed = stdout.trim();
    if trimmed.starts_with('{') {
        if let Ok(result) = serde_json::from_str::<QueryResult>(trimmed) {
            return result;
        }
    }

    let body = match trimmed.split_once('\n') {
        Some((first, rest)) if first.starts_with("SUCCESS:") => rest.trim(),
        _ if trimmed.starts_with("SUCCESS:") => "",
        _ => trimmed,
    };

    QueryResult {
        answer: (!body.is_empty()).then(|| body.to_string()),
        ..Default::default()
    }
}
