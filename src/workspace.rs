//! Project directory checks
//!
//! Reports whether the GraphRAG project is ready to index and which pipeline
//! artifacts exist. Checks only inspect the filesystem.

use crate::config::WorkspaceConfig;
use serde::Serialize;
use std::path::PathBuf;

/// Tables written by a complete indexing run
pub const PIPELINE_OUTPUTS: [&str; 6] = [
    "entities.parquet",
    "relationships.parquet",
    "communities.parquet",
    "community_reports.parquet",
    "documents.parquet",
    "text_units.parquet",
];

pub const STATS_FILE: &str = "stats.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    /// Indexing cannot start without it
    Required,
    /// Reported, but does not block indexing
    Advisory,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentCheck {
    pub name: &'static str,
    pub path: PathBuf,
    pub present: bool,
    pub requirement: Requirement,
    /// Shown when the item is missing
    pub hint: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub checks: Vec<EnvironmentCheck>,
}

impl EnvironmentReport {
    /// All required items are present
    pub fn ready(&self) -> bool {
        self.checks
            .iter()
            .filter(|c| c.requirement == Requirement::Required)
            .all(|c| c.present)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &EnvironmentCheck> {
        self.checks
            .iter()
            .filter(|c| c.requirement == Requirement::Advisory && !c.present)
    }
}

pub fn check_environment(config: &WorkspaceConfig) -> EnvironmentReport {
    let venv = config.path(&config.venv_dir);
    let settings = config.path(&config.settings_file);
    let env_file = config.path(&config.env_file);
    let input = config.path(&config.input_file);

    let checks = vec![
        EnvironmentCheck {
            name: "virtual environment",
            present: venv.is_dir(),
            path: venv,
            requirement: Requirement::Required,
            hint: "create it with `python -m venv graphrag_env` and install graphrag",
        },
        EnvironmentCheck {
            name: "settings file",
            present: settings.is_file(),
            path: settings,
            requirement: Requirement::Required,
            hint: "run `graphrag init` to generate settings.yaml",
        },
        EnvironmentCheck {
            name: "env file",
            present: env_file.is_file(),
            path: env_file,
            requirement: Requirement::Advisory,
            hint: "add GRAPHRAG_API_KEY=<DeepSeek key> and OPENAI_API_KEY=<OpenAI key>",
        },
        EnvironmentCheck {
            name: "input corpus",
            present: input.is_file(),
            path: input,
            requirement: Requirement::Advisory,
            hint: "place the source text under input/",
        },
    ];

    EnvironmentReport { checks }
}

/// One pipeline artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub name: String,
    pub path: PathBuf,
    /// Size in bytes, `None` when absent
    pub size: Option<u64>,
}

impl ArtifactStatus {
    pub fn exists(&self) -> bool {
        self.size.is_some()
    }
}

/// Pipeline outputs followed by the stats file
pub fn project_status(config: &WorkspaceConfig) -> Vec<ArtifactStatus> {
    let output_dir = config.path(&config.output_dir);
    PIPELINE_OUTPUTS
        .iter()
        .chain(std::iter::once(&STATS_FILE))
        .map(|name| {
            let path = output_dir.join(name);
            let size = std::fs::metadata(&path)
                .ok()
                .filter(|m| m.is_file())
                .map(|m| m.len());
            ArtifactStatus {
                name: name.to_string(),
                path,
                size,
            }
        })
        .collect()
}

/// Whether an index exists to query against
pub fn has_index(config: &WorkspaceConfig) -> bool {
    config
        .path(&config.output_dir)
        .join(PIPELINE_OUTPUTS[0])
        .is_file()
}
