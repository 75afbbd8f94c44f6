//! Placeholder substitution for CI prompt templates
//!
//! Templates carry `{{NAME}}` markers. Six names are recognized; their values
//! come from repository files or from environment variables set by the CI
//! job. Anything else that looks like a marker is copied through untouched.
//!
//! Substitution is a single pass over the template: text inserted for one
//! marker is never scanned again, so a value that itself contains
//! `{{ISSUE_TITLE}}` lands in the output verbatim.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use crate::config::TemplateConfig;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("Invalid placeholder regex"));

/// The fixed set of recognized placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    BackendSpec,
    BackendClaudeMd,
    IssueTitle,
    IssueBody,
    IssueComments,
    ExistingFiles,
}

/// Where a placeholder's value is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// A repository file, configured in [`TemplateConfig`]
    File,
    /// A process environment variable of the same name
    Env(&'static str),
}

impl Placeholder {
    pub const ALL: [Placeholder; 6] = [
        Placeholder::BackendSpec,
        Placeholder::BackendClaudeMd,
        Placeholder::IssueTitle,
        Placeholder::IssueBody,
        Placeholder::IssueComments,
        Placeholder::ExistingFiles,
    ];

    /// Name between the braces
    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::BackendSpec => "BACKEND_SPEC",
            Placeholder::BackendClaudeMd => "BACKEND_CLAUDE_MD",
            Placeholder::IssueTitle => "ISSUE_TITLE",
            Placeholder::IssueBody => "ISSUE_BODY",
            Placeholder::IssueComments => "ISSUE_COMMENTS",
            Placeholder::ExistingFiles => "EXISTING_FILES",
        }
    }

    /// Full marker as it appears in a template
    pub fn token(&self) -> String {
        format!("{{{{{}}}}}", self.name())
    }

    pub fn source(&self) -> ValueSource {
        match self {
            Placeholder::BackendSpec | Placeholder::BackendClaudeMd => ValueSource::File,
            Placeholder::IssueTitle => ValueSource::Env("ISSUE_TITLE"),
            Placeholder::IssueBody => ValueSource::Env("ISSUE_BODY"),
            Placeholder::IssueComments => ValueSource::Env("ISSUE_COMMENTS"),
            Placeholder::ExistingFiles => ValueSource::Env("EXISTING_FILES"),
        }
    }

    /// Look up a placeholder by the name between the braces
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Resolved values for every recognized placeholder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderTable {
    values: HashMap<Placeholder, String>,
}

impl PlaceholderTable {
    /// Resolve all values from files under `root` and an environment lookup
    ///
    /// Missing files and unset variables resolve to the empty string.
    pub fn load<F>(root: &Path, config: &TemplateConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut table = Self::default();

        for placeholder in Placeholder::ALL {
            let value = match placeholder.source() {
                ValueSource::File => {
                    let path = match placeholder {
                        Placeholder::BackendClaudeMd => &config.backend_claude_md,
                        _ => &config.backend_spec,
                    };
                    read_file_or_empty(&root.join(path))
                }
                ValueSource::Env(var) => lookup(var).unwrap_or_default(),
            };
            table.set(placeholder, value);
        }

        table
    }

    /// Resolve values from the real process environment
    pub fn from_env(root: &Path, config: &TemplateConfig) -> Self {
        Self::load(root, config, |key| std::env::var(key).ok())
    }

    pub fn set(&mut self, placeholder: Placeholder, value: impl Into<String>) {
        self.values.insert(placeholder, value.into());
    }

    pub fn get(&self, placeholder: Placeholder) -> &str {
        self.values.get(&placeholder).map(String::as_str).unwrap_or("")
    }

    /// Replace every recognized marker in `template`
    pub fn substitute(&self, template: &str) -> String {
        TOKEN_RE
            .replace_all(template, |caps: &Captures| match Placeholder::from_name(&caps[1]) {
                Some(placeholder) => self.get(placeholder).to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Read a file, returning an empty string when it is missing or unreadable
pub fn read_file_or_empty(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("No value from {}: {}", path.display(), e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table_with(pairs: &[(Placeholder, &str)]) -> PlaceholderTable {
        let mut table = PlaceholderTable::default();
        for (placeholder, value) in pairs {
            table.set(*placeholder, *value);
        }
        table
    }

    #[test]
    fn test_tokens() {
        assert_eq!(Placeholder::IssueTitle.token(), "{{ISSUE_TITLE}}");
        assert_eq!(Placeholder::from_name("EXISTING_FILES"), Some(Placeholder::ExistingFiles));
        assert_eq!(Placeholder::from_name("issue_title"), None);
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let table = table_with(&[(Placeholder::IssueTitle, "Add login")]);
        let out = table.substitute("# {{ISSUE_TITLE}}\n\nWork on {{ISSUE_TITLE}}.");
        assert_eq!(out, "# Add login\n\nWork on Add login.");
    }

    #[test]
    fn test_unknown_tokens_untouched() {
        let table = table_with(&[(Placeholder::IssueBody, "body")]);
        let out = table.substitute("{{ISSUE_BODY}} {{UNKNOWN}} {{ lower }} {single}");
        assert_eq!(out, "body {{UNKNOWN}} {{ lower }} {single}");
    }

    #[test]
    fn test_unset_values_are_empty() {
        let table = PlaceholderTable::default();
        assert_eq!(table.substitute("[{{ISSUE_COMMENTS}}]"), "[]");
    }

    #[test]
    fn test_inserted_values_are_not_rescanned() {
        let table = table_with(&[
            (Placeholder::IssueBody, "see {{ISSUE_TITLE}}"),
            (Placeholder::IssueTitle, "title"),
        ]);
        let out = table.substitute("{{ISSUE_BODY}}");
        assert_eq!(out, "see {{ISSUE_TITLE}}");
    }

    #[test]
    fn test_second_pass_is_noop() {
        let table = table_with(&[
            (Placeholder::IssueTitle, "T"),
            (Placeholder::ExistingFiles, "src/main.rs\nsrc/lib.rs"),
        ]);
        let once = table.substitute("{{ISSUE_TITLE}}: {{EXISTING_FILES}} {{OTHER}}");
        let twice = table.substitute(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_multiline_and_special_characters() {
        let value = "line 1\nline 2 with $dollar and \\backslash and ${braces}";
        let table = table_with(&[(Placeholder::IssueBody, value)]);
        assert_eq!(table.substitute("<{{ISSUE_BODY}}>"), format!("<{}>", value));
    }

    #[test]
    fn test_load_from_files_and_lookup() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("BACKEND_SPEC.md"), "spec text").unwrap();

        let table = PlaceholderTable::load(dir.path(), &TemplateConfig::default(), |key| {
            match key {
                "ISSUE_TITLE" => Some("Title".to_string()),
                _ => None,
            }
        });

        assert_eq!(table.get(Placeholder::BackendSpec), "spec text");
        assert_eq!(table.get(Placeholder::BackendClaudeMd), "");
        assert_eq!(table.get(Placeholder::IssueTitle), "Title");
        assert_eq!(table.get(Placeholder::IssueBody), "");
    }
}
