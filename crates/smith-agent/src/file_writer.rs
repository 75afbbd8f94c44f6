//! File writer - puts generated files on disk under the working directory
//!
//! Paths come straight from model output. With the default policy they are
//! confined to the working directory: absolute paths, `..` components and
//! protected names are rejected. The unrestricted policy writes wherever the
//! path points.

use crate::types::GeneratedFile;
use smith_core::{ImplementerConfig, Result, SmithError};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Which paths generated output may write to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePolicy {
    /// Relative paths inside the working directory, minus protected names
    Restricted { protected: Vec<String> },
    /// Any path
    Unrestricted,
}

impl WritePolicy {
    pub fn from_config(config: &ImplementerConfig) -> Self {
        if config.restrict_writes {
            WritePolicy::Restricted {
                protected: config.protected_files.clone(),
            }
        } else {
            WritePolicy::Unrestricted
        }
    }
}

impl Default for WritePolicy {
    fn default() -> Self {
        WritePolicy::from_config(&ImplementerConfig::default())
    }
}

/// Whether a write created a new file or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Modify,
}

impl std::fmt::Display for WriteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteAction::Create => write!(f, "create"),
            WriteAction::Modify => write!(f, "modify"),
        }
    }
}

/// Outcome of writing a batch of generated files
#[derive(Debug, Default)]
pub struct WriteReport {
    /// Files that were created
    pub files_created: Vec<String>,
    /// Files that were modified
    pub files_modified: Vec<String>,
    /// Errors encountered while writing
    pub errors: Vec<String>,
}

impl WriteReport {
    /// Generate a summary string
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.files_created.is_empty() {
            parts.push(format!("{} created", self.files_created.len()));
        }
        if !self.files_modified.is_empty() {
            parts.push(format!("{} modified", self.files_modified.len()));
        }
        if !self.errors.is_empty() {
            parts.push(format!("{} errors", self.errors.len()));
        }

        if parts.is_empty() {
            "no files written".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// Number of files actually written
    pub fn written(&self) -> usize {
        self.files_created.len() + self.files_modified.len()
    }

    pub fn record(&mut self, path: &str, action: WriteAction) {
        match action {
            WriteAction::Create => self.files_created.push(path.to_string()),
            WriteAction::Modify => self.files_modified.push(path.to_string()),
        }
    }
}

/// Writes generated files relative to a root directory
#[derive(Debug, Clone)]
pub struct FileWriter {
    root: PathBuf,
    policy: WritePolicy,
}

impl FileWriter {
    pub fn new(root: impl Into<PathBuf>, policy: WritePolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check a path against the policy and resolve it under the root
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        match &self.policy {
            WritePolicy::Restricted { protected } => {
                let relative = validate_path(path, protected)?;
                Ok(self.root.join(relative))
            }
            WritePolicy::Unrestricted => Ok(self.root.join(path)),
        }
    }

    /// Write one file, creating parent directories as needed
    pub fn write(&self, file: &GeneratedFile) -> Result<WriteAction> {
        let target = self.resolve(&file.path)?;
        let action = if target.exists() {
            WriteAction::Modify
        } else {
            WriteAction::Create
        };

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                tracing::debug!("Created directory: {}", parent.display());
            }
        }

        fs::write(&target, &file.content)?;

        match action {
            WriteAction::Create => tracing::info!("Created file: {}", file.path),
            WriteAction::Modify => tracing::info!("Modified file: {}", file.path),
        }

        Ok(action)
    }

    /// Write every file, collecting failures instead of stopping at the first
    pub fn write_all(&self, files: &[GeneratedFile]) -> WriteReport {
        let mut report = WriteReport::default();

        for file in files {
            match self.write(file) {
                Ok(action) => report.record(&file.path, action),
                Err(e) => {
                    tracing::warn!("Failed to write {}: {}", file.path, e);
                    report
                        .errors
                        .push(format!("Failed to write {}: {}", file.path, e));
                }
            }
        }

        report
    }
}

/// Validate that a path is safe to write to
pub fn validate_path(path: &str, protected: &[String]) -> Result<PathBuf> {
    let path = Path::new(path);

    if path.as_os_str().is_empty() {
        return Err(SmithError::PathValidation("Empty path".to_string()));
    }

    // Reject absolute paths
    if path.is_absolute() || path.has_root() {
        return Err(SmithError::PathValidation(format!(
            "Absolute paths not allowed: {}",
            path.display()
        )));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(SmithError::PathValidation(format!(
                    "Path traversal not allowed: {}",
                    path.display()
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(SmithError::PathValidation(format!(
                    "Absolute paths not allowed: {}",
                    path.display()
                )));
            }
            Component::Normal(name) => {
                if let Some(name) = name.to_str() {
                    if protected.iter().any(|p| p == name) {
                        return Err(SmithError::PathValidation(format!(
                            "Cannot write to protected path: {}",
                            path.display()
                        )));
                    }
                }
            }
            Component::CurDir => {}
        }
    }

    Ok(path.to_path_buf())
}
