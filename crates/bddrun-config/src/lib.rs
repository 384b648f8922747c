//! Configuration for bddrun.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Command-line flags are applied on top by the CLI.

use anyhow::{Context, Result};
use bddrun_logging::LoggingConfig;
use bddrun_output_layout::WorkspacePaths;
use bddrun_tags::TagVocabulary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY: usize = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    #[default]
    Yaml,
}

impl ConfigFormat {
    /// `.json` is JSON; anything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    #[default]
    Json,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BddrunConfig {
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
    /// Where the API description lives. Defaults to `<workspace>/output`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi_dir: Option<PathBuf>,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

impl Default for BddrunConfig {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            openapi_dir: None,
            execution: ExecutionConfig::default(),
            vocabulary: VocabularyConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BddrunConfig {
    pub fn paths(&self) -> WorkspacePaths {
        WorkspacePaths::new(&self.workspace)
    }

    pub fn openapi_dir(&self) -> PathBuf {
        self.openapi_dir
            .clone()
            .unwrap_or_else(|| self.paths().openapi_dir())
    }

    /// Built-in vocabulary with the configured entries merged over it.
    pub fn vocabulary(&self) -> Result<TagVocabulary> {
        TagVocabulary::builtin()
            .extend(&self.vocabulary.labels, &self.vocabulary.non_functional)
            .context("invalid vocabulary configuration")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Scenarios executed at once. 0 is treated as 1.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub renderer: RendererKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            renderer: RendererKind::Json,
            user_agent: None,
        }
    }
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Extra title label -> tag entries, e.g. `Accessibility: "@a11y"`.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Extra tags routed to the non-functional bucket.
    #[serde(default)]
    pub non_functional: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_header")]
    pub header: String,
}

fn default_token_env() -> String {
    bddrun_auth::DEFAULT_TOKEN_ENV.to_string()
}

fn default_header() -> String {
    bddrun_auth::DEFAULT_HEADER.to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            header: default_header(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<BddrunConfig> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("read {path:?}"))?;
    match ConfigFormat::from_path(path) {
        ConfigFormat::Json => {
            serde_json::from_str(&contents).with_context(|| format!("parse JSON config {path:?}"))
        }
        ConfigFormat::Yaml => {
            // An empty YAML document is `null`, not an empty mapping.
            if contents.trim().is_empty() {
                return Ok(BddrunConfig::default());
            }
            serde_yaml::from_str(&contents).with_context(|| format!("parse YAML config {path:?}"))
        }
    }
}

/// `load_config` when a path is given, defaults otherwise.
pub fn load_or_default(path: Option<&Path>) -> Result<BddrunConfig> {
    match path {
        Some(p) => load_config(p),
        None => Ok(BddrunConfig::default()),
    }
}

pub fn save_config(config: &BddrunConfig, path: &Path) -> Result<()> {
    let contents = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::to_string_pretty(config).context("serialize JSON config")?,
        ConfigFormat::Yaml => serde_yaml::to_string(config).context("serialize YAML config")?,
    };
    std::fs::write(path, contents).with_context(|| format!("write {path:?}"))?;
    Ok(())
}
