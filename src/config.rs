//! Toolkit configuration
//!
//! A single [`ToolkitConfig`] is loaded once by the binary (YAML file plus a
//! small environment overlay) and handed to every entry point. Library code
//! never reads the process environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for this schema
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// LLM Provider options
///
/// All providers are reached through the OpenAI-compatible chat completion API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LLMProvider {
    DeepSeek,
    OpenAI,
    Ollama,
}

impl LLMProvider {
    /// Base URL used when `api_base_url` is not configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::DeepSeek => "https://api.deepseek.com",
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Ollama => "http://localhost:11434/v1",
        }
    }

    /// Whether requests must carry a bearer token
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

/// Hosted LLM settings used by the connectivity probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// The LLM provider to use
    pub provider: LLMProvider,
    /// Model name (e.g., "deepseek-chat", "gpt-4o-mini")
    pub model: String,
    /// API Key (usually supplied through `GRAPHRAG_API_KEY`)
    pub api_key: Option<String>,
    /// API Base URL, overrides the provider default
    pub api_base_url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Prompt sent by the chat completion check
    pub probe_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::DeepSeek,
            model: "deepseek-chat".to_string(),
            api_key: None,
            api_base_url: None,
            timeout_secs: 30,
            probe_prompt: "你好".to_string(),
        }
    }
}

impl LlmConfig {
    /// Effective base URL without a trailing slash
    pub fn base_url(&self) -> String {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Layout of the GraphRAG project directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Project root; every other path is relative to it
    pub root: PathBuf,
    /// Python virtual environment directory
    pub venv_dir: PathBuf,
    /// GraphRAG settings file passed to the indexer
    pub settings_file: PathBuf,
    /// Dotenv file holding API keys for the indexer
    pub env_file: PathBuf,
    /// Source corpus fed to the indexer
    pub input_file: PathBuf,
    /// Directory the indexer writes its tables to
    pub output_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            venv_dir: PathBuf::from("graphrag_env"),
            settings_file: PathBuf::from("settings.yaml"),
            env_file: PathBuf::from(".env"),
            input_file: PathBuf::from("input/zuozhuan_full.txt"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl WorkspaceConfig {
    /// Resolve a workspace-relative path
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

/// Where the exporter reads tables from and writes the graph document to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory holding the input tables. Not read from YAML: the toolkit
    /// fills it from `workspace.output_dir`.
    #[serde(skip)]
    pub output_dir: PathBuf,
    pub entities_file: String,
    pub relationships_file: String,
    pub viz_dir: PathBuf,
    pub graph_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            entities_file: "entities.parquet".to_string(),
            relationships_file: "relationships.parquet".to_string(),
            viz_dir: PathBuf::from("viz_data"),
            graph_file: "graph.json".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn entities_path(&self) -> PathBuf {
        self.output_dir.join(&self.entities_file)
    }

    pub fn relationships_path(&self) -> PathBuf {
        self.output_dir.join(&self.relationships_file)
    }

    pub fn graph_path(&self) -> PathBuf {
        self.viz_dir.join(&self.graph_file)
    }

    /// Same layout with both directories placed under `root`
    pub fn rooted(&self, root: &Path) -> Self {
        Self {
            output_dir: root.join(&self.output_dir),
            viz_dir: root.join(&self.viz_dir),
            ..self.clone()
        }
    }
}

/// Indexing job invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Python interpreter
    pub python: String,
    /// Module run with `-m`
    pub module: String,
    /// Timeout in seconds
    pub timeout_secs: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            module: "graphrag.index".to_string(),
            timeout_secs: 1800,
        }
    }
}

/// External query engine invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub python: String,
    pub module: String,
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            module: "graphrag".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Visualizer server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: String,
    /// Port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Complete toolkit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub workspace: WorkspaceConfig,
    pub export: ExportConfig,
    pub llm: LlmConfig,
    pub indexing: IndexingConfig,
    pub query: QueryConfig,
    pub server: ServerConfig,
}

impl ToolkitConfig {
    /// Parse a YAML document; omitted sections keep their defaults
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_yaml_str(&text)
    }

    /// Load from `path` when given, otherwise start from defaults
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup
    ///
    /// Recognised keys: `GRAPHRAG_API_KEY`, `GRAPHRAG_API_BASE`, `GRAPHRAG_LLM_MODEL`.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GRAPHRAG_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(base) = non_empty("GRAPHRAG_API_BASE") {
            self.llm.api_base_url = Some(base);
        }
        if let Some(model) = non_empty("GRAPHRAG_LLM_MODEL") {
            self.llm.model = model;
        }
    }

    /// Export layout resolved against the workspace root, reading tables
    /// from the same directory the indexer writes to
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            output_dir: self.workspace.output_dir.clone(),
            ..self.export.clone()
        }
        .rooted(&self.workspace.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ToolkitConfig::default();
        assert_eq!(config.llm.base_url(), "https://api.deepseek.com");
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.indexing.timeout_secs, 1800);
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.export.graph_path(),
            PathBuf::from("viz_data").join("graph.json")
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
llm:
  provider: OpenAI
  model: gpt-4o-mini
  api_base_url: "https://proxy.example.com/v1/"
server:
  port: 8088
"#;
        let config = ToolkitConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
        assert_eq!(config.llm.base_url(), "https://proxy.example.com/v1");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.address, "0.0.0.0");
        assert_eq!(config.export.entities_file, "entities.parquet");
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = [
            ("GRAPHRAG_API_KEY", "sk-test"),
            ("GRAPHRAG_API_BASE", "  "),
            ("GRAPHRAG_LLM_MODEL", "deepseek-reasoner"),
        ]
        .into_iter()
        .collect();

        let mut config = ToolkitConfig::default();
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.api_base_url, None);
        assert_eq!(config.llm.model, "deepseek-reasoner");
    }

    #[test]
    fn test_missing_file() {
        let err = ToolkitConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_export_config_rooted() {
        let mut config = ToolkitConfig::default();
        config.workspace.root = PathBuf::from("/srv/zuozhuan");
        let export = config.export_config();
        assert_eq!(
            export.entities_path(),
            PathBuf::from("/srv/zuozhuan/output/entities.parquet")
        );
        assert_eq!(
            export.graph_path(),
            PathBuf::from("/srv/zuozhuan/viz_data/graph.json")
        );
    }

    #[test]
    fn test_ollama_needs_no_key() {
        assert!(!LLMProvider::Ollama.requires_api_key());
        assert!(LLMProvider::DeepSeek.requires_api_key());
    }

    #[test]
    fn test_export_reads_from_workspace_output_dir() {
        let yaml = r#"
workspace:
  root: /srv/zuozhuan
  output_dir: artifacts
"#;
        let config = ToolkitConfig::from_yaml_str(yaml).unwrap();
        let export = config.export_config();
        assert_eq!(
            export.entities_path(),
            PathBuf::from("/srv/zuozhuan/artifacts/entities.parquet")
        );
        assert_eq!(
            export.relationships_path(),
            PathBuf::from("/srv/zuozhuan/artifacts/relationships.parquet")
        );
        assert_eq!(
            export.entities_path().parent(),
            Some(config.workspace.path(&config.workspace.output_dir).as_path())
        );
    }
}
