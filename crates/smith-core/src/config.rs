//! Configuration management for smith
//!
//! Every path the tools read or write is named here instead of being
//! hard-coded at the call site, so tests (and unusual repository layouts)
//! can point the tools somewhere else. Paths are relative to the working
//! directory the tool runs in.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Result, SmithError};

/// Location of the optional config file, relative to the working directory
pub const CONFIG_FILE: &str = ".smith/config.toml";

/// Repository-level smith configuration
///
/// Loaded from `.smith/config.toml` in the working directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmithConfig {
    /// Template substituter sources
    #[serde(default)]
    pub template: TemplateConfig,

    /// Issue implementer inputs, outputs and write policy
    #[serde(default)]
    pub implementer: ImplementerConfig,

    /// Chat-completion request tuning
    #[serde(default)]
    pub request: RequestConfig,
}

/// File sources for the file-backed placeholders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Source for `{{BACKEND_SPEC}}`
    #[serde(default = "default_backend_spec")]
    pub backend_spec: PathBuf,

    /// Source for `{{BACKEND_CLAUDE_MD}}`
    #[serde(default = "default_backend_claude_md")]
    pub backend_claude_md: PathBuf,
}

/// Paths and policy for the issue implementer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementerConfig {
    /// Required task description
    #[serde(default = "default_task_document")]
    pub task_document: PathBuf,

    /// Optional agent protocol rules included in the prompt
    #[serde(default = "default_protocol_document")]
    pub protocol_document: PathBuf,

    /// Optional project plan included in the prompt
    #[serde(default = "default_project_plan_document")]
    pub project_plan_document: PathBuf,

    /// README updated by the offline fallback
    #[serde(default = "default_readme_document")]
    pub readme_document: PathBuf,

    /// Optional daily checklist template read by the offline fallback
    #[serde(default = "default_checklist_template")]
    pub checklist_template: PathBuf,

    /// Generated execution-plan summary
    #[serde(default = "default_exec_plan_document")]
    pub exec_plan_document: PathBuf,

    /// Confine generated files to the working directory subtree
    #[serde(default = "default_restrict_writes")]
    pub restrict_writes: bool,

    /// File or directory names generated output may never touch
    #[serde(default = "default_protected_files")]
    pub protected_files: Vec<String>,
}

/// Chat-completion request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for HTTP 429 and 5xx responses; 0 sends a single request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between retries, doubled each attempt
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Endpoint base URL replacing the provider's own
    #[serde(default)]
    pub base_url: Option<String>,
}

// Default value providers
fn default_backend_spec() -> PathBuf {
    PathBuf::from("BACKEND_SPEC.md")
}

fn default_backend_claude_md() -> PathBuf {
    PathBuf::from("backend/CLAUDE.md")
}

fn default_task_document() -> PathBuf {
    PathBuf::from("ISSUE.md")
}

fn default_protocol_document() -> PathBuf {
    PathBuf::from("AGENT_PROTOCOL.md")
}

fn default_project_plan_document() -> PathBuf {
    PathBuf::from("PROJECT_PLAN.md")
}

fn default_readme_document() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_checklist_template() -> PathBuf {
    PathBuf::from("templates/daily_checklist.md")
}

fn default_exec_plan_document() -> PathBuf {
    PathBuf::from("EXEC_PLAN.md")
}

fn default_restrict_writes() -> bool {
    true
}

fn default_protected_files() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".env".to_string(),
        ".secrets".to_string(),
        "Cargo.lock".to_string(),
        ".gitignore".to_string(),
    ]
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    0
}

fn default_backoff_secs() -> u64 {
    5
}

impl SmithConfig {
    /// Load configuration from `.smith/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content).map_err(|e| {
            SmithError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            backend_spec: default_backend_spec(),
            backend_claude_md: default_backend_claude_md(),
        }
    }
}

impl Default for ImplementerConfig {
    fn default() -> Self {
        Self {
            task_document: default_task_document(),
            protocol_document: default_protocol_document(),
            project_plan_document: default_project_plan_document(),
            readme_document: default_readme_document(),
            checklist_template: default_checklist_template(),
            exec_plan_document: default_exec_plan_document(),
            restrict_writes: default_restrict_writes(),
            protected_files: default_protected_files(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_secs: default_backoff_secs(),
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SmithConfig::default();
        assert_eq!(config.implementer.task_document, PathBuf::from("ISSUE.md"));
        assert_eq!(config.implementer.exec_plan_document, PathBuf::from("EXEC_PLAN.md"));
        assert_eq!(config.template.backend_claude_md, PathBuf::from("backend/CLAUDE.md"));
        assert!(config.implementer.restrict_writes);
        assert_eq!(config.request.max_tokens, 4000);
        assert_eq!(config.request.max_retries, 0);
        assert!(config.request.base_url.is_none());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let config = SmithConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.request.timeout_secs, 300);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".smith")).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[implementer]\ntask_document = \"docs/TASK.md\"\nrestrict_writes = false\n\n[request]\nmax_retries = 2\nbase_url = \"http://127.0.0.1:8080/v1\"\n",
        )
        .unwrap();

        let config = SmithConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.implementer.task_document, PathBuf::from("docs/TASK.md"));
        assert!(!config.implementer.restrict_writes);
        assert_eq!(config.implementer.exec_plan_document, PathBuf::from("EXEC_PLAN.md"));
        assert_eq!(config.request.max_retries, 2);
        assert_eq!(config.request.base_url.as_deref(), Some("http://127.0.0.1:8080/v1"));
        assert_eq!(config.request.max_tokens, 4000);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[request\nmax_tokens = ").unwrap();

        let err = SmithConfig::load(&path).unwrap_err();
        assert!(matches!(err, SmithError::Config(_)));
    }
}
