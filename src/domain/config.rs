//! # Configuration
//!
//! Manages loading of the application's configuration file (`data/config.yaml`) and the `.env`
//! overrides. Every component receives an `AppConfig` at construction instead of reading the
//! environment ad hoc.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::paths;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`; every section is optional.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

/// Gemini connection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_thinking_temperature")]
    pub thinking_temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout: u64,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            endpoint: None,
            temperature: default_temperature(),
            thinking_temperature: default_thinking_temperature(),
            timeout: default_llm_timeout(),
            embedding_model: default_embedding_model(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_api_key_env() -> String {
    paths::API_KEY_ENV.to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_thinking_temperature() -> f32 {
    0.3
}
fn default_llm_timeout() -> u64 {
    120
}
fn default_embedding_model() -> String {
    "gemini-embedding-001".to_string()
}

/// Agent loop settings.
#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_mode")]
    pub default_mode: String,
    #[serde(default = "default_memory_k")]
    pub memory_k: usize,
    /// Attempts made by the error handler's retry strategy
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
    /// Base backoff delay in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            default_mode: default_mode(),
            memory_k: default_memory_k(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_max_iterations() -> usize {
    3
}
fn default_mode() -> String {
    "autonomous".to_string()
}
fn default_memory_k() -> usize {
    4
}
fn default_retry_attempts() -> usize {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    1000
}

/// Filesystem locations. Relative paths resolve against the working directory.
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: String,
    #[serde(default = "default_vectorstore_dir")]
    pub vectorstore_dir: String,
    #[serde(default = "default_todo_file")]
    pub todo_file: String,
    #[serde(default = "default_env_file")]
    pub env_file: String,
    #[serde(default = "default_seed_memory")]
    pub seed_memory: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            workspace_dir: default_workspace_dir(),
            vectorstore_dir: default_vectorstore_dir(),
            todo_file: default_todo_file(),
            env_file: default_env_file(),
            seed_memory: default_seed_memory(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}
fn default_workspace_dir() -> String {
    "data/agent_workspace".to_string()
}
fn default_vectorstore_dir() -> String {
    "data/vectorstore".to_string()
}
fn default_todo_file() -> String {
    "todo_data.json".to_string()
}
fn default_env_file() -> String {
    ".env".to_string()
}
fn default_seed_memory() -> String {
    "data/seed_memory.txt".to_string()
}

/// HTTP settings for search and scraping tools.
#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_browser_agent")]
    pub browser_agent: String,
    #[serde(default = "default_search_timeout")]
    pub search_timeout: u64,
    #[serde(default = "default_page_timeout")]
    pub page_timeout: u64,
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout: u64,
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            browser_agent: default_browser_agent(),
            search_timeout: default_search_timeout(),
            page_timeout: default_page_timeout(),
            scrape_timeout: default_scrape_timeout(),
            page_limit: default_page_limit(),
        }
    }
}

fn default_user_agent() -> String {
    "ADE-Agent/1.0".to_string()
}
fn default_browser_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}
fn default_search_timeout() -> u64 {
    8
}
fn default_page_timeout() -> u64 {
    10
}
fn default_scrape_timeout() -> u64 {
    15
}
fn default_page_limit() -> usize {
    3000
}

/// Settings for the local tools (Python sandbox, file access).
#[derive(Debug, Deserialize, Clone)]
pub struct ToolsConfig {
    #[serde(default)]
    pub python: Option<String>,
    #[serde(default = "default_python_timeout")]
    pub python_timeout: u64,
    #[serde(default = "default_read_limit")]
    pub file_read_limit: usize,
    #[serde(default = "default_max_lines")]
    pub analyzer_max_lines: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python: None,
            python_timeout: default_python_timeout(),
            file_read_limit: default_read_limit(),
            analyzer_max_lines: default_max_lines(),
        }
    }
}

fn default_python_timeout() -> u64 {
    10
}
fn default_read_limit() -> usize {
    10_000
}
fn default_max_lines() -> usize {
    200
}

impl ToolsConfig {
    /// Resolves the Python interpreter: the configured one, else `python3`/`python` on PATH.
    pub fn python_command(&self) -> Option<PathBuf> {
        if let Some(configured) = &self.python {
            return Some(PathBuf::from(configured));
        }
        which::which("python3")
            .or_else(|_| which::which("python"))
            .ok()
    }
}

/// Settings for the permission probes and their fixes.
#[derive(Debug, Deserialize, Clone)]
pub struct PermissionsConfig {
    #[serde(default = "default_probe_url")]
    pub network_probe_url: String,
    #[serde(default = "default_network_timeout")]
    pub network_timeout: u64,
    #[serde(default = "default_probe_dir")]
    pub probe_dir: String,
    #[serde(default = "default_required_packages")]
    pub required_packages: Vec<String>,
    #[serde(default = "default_fallback_packages")]
    pub fallback_packages: Vec<String>,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            network_probe_url: default_probe_url(),
            network_timeout: default_network_timeout(),
            probe_dir: default_probe_dir(),
            required_packages: default_required_packages(),
            fallback_packages: default_fallback_packages(),
        }
    }
}

fn default_probe_url() -> String {
    "https://www.google.com".to_string()
}
fn default_network_timeout() -> u64 {
    5
}
fn default_probe_dir() -> String {
    ".ade_permission_test".to_string()
}
fn default_required_packages() -> Vec<String> {
    vec!["requests".to_string(), "bs4".to_string()]
}
fn default_fallback_packages() -> Vec<String> {
    vec![
        "requests>=2.31.0".to_string(),
        "beautifulsoup4>=4.13.5".to_string(),
    ]
}

impl AppConfig {
    /// Loads the YAML config if present (defaults otherwise) and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_yaml::from_str::<AppConfig>(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            AppConfig::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// `GEMINI_MODEL` overrides the configured model, as written by the API key setup.
    pub fn apply_env(&mut self) {
        if let Ok(model) = std::env::var(paths::MODEL_ENV) {
            let model = model.trim();
            if !model.is_empty() {
                self.llm.model = model.to_string();
            }
        }
    }

    /// API key from the config file, falling back to the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        if let Some(key) = &self.llm.api_key {
            if !key.trim().is_empty() {
                return Some(key.trim().to_string());
            }
        }
        std::env::var(&self.llm.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    pub fn workspace_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.workspace_dir)
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.data_dir)
    }

    pub fn vectorstore_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.vectorstore_dir)
    }

    /// Rebases every relative path onto `root`.
    pub fn rooted(mut self, root: &Path) -> Self {
        let rebase = |p: &str| -> String {
            let path = Path::new(p);
            if path.is_absolute() {
                p.to_string()
            } else {
                root.join(path).to_string_lossy().to_string()
            }
        };
        self.paths.data_dir = rebase(&self.paths.data_dir);
        self.paths.workspace_dir = rebase(&self.paths.workspace_dir);
        self.paths.vectorstore_dir = rebase(&self.paths.vectorstore_dir);
        self.paths.todo_file = rebase(&self.paths.todo_file);
        self.paths.env_file = rebase(&self.paths.env_file);
        self.paths.seed_memory = rebase(&self.paths.seed_memory);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.memory_k, 4);
        assert_eq!(config.paths.workspace_dir, "data/agent_workspace");
        assert_eq!(config.web.page_limit, 3000);
        assert_eq!(config.permissions.network_timeout, 5);
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "agent:\n  max_iterations: 5\nweb:\n  page_limit: 100\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.default_mode, "autonomous");
        assert_eq!(config.web.page_limit, 100);
        assert_eq!(config.web.search_timeout, 8);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "agent: [not, a, map").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("  key-from-file ".to_string());
        assert_eq!(config.api_key().as_deref(), Some("key-from-file"));
    }

    #[test]
    fn test_rooted_rebases_relative_paths() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::default().rooted(dir.path());
        assert!(config.workspace_dir().starts_with(dir.path()));
        assert!(Path::new(&config.paths.env_file).starts_with(dir.path()));
    }
}
