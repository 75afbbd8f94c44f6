//! Execution-plan document
//!
//! A markdown summary of what a run did, overwritten on every run. CI jobs
//! read it to describe the change in the pull request.

use crate::file_writer::{WriteAction, WriteReport};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Longest error text put on a single plan line
const MAX_LINE_CHARS: usize = 160;

/// How the files in the plan were produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanMode {
    /// Parsed from a model reply
    Model,
    /// Written without a model after the completion failed
    Offline { error: String },
}

/// One file listed in the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub path: String,
    pub action: WriteAction,
    /// Extra annotation, e.g. "minimal example"
    pub note: Option<String>,
}

/// Builder and renderer for `EXEC_PLAN.md`
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    goal: Option<String>,
    mode: PlanMode,
    task_name: String,
    protocol_name: String,
    protocol_read: bool,
    entries: Vec<PlanEntry>,
    errors: Vec<String>,
    generated_at: DateTime<Utc>,
}

impl ExecutionPlan {
    /// Start a plan; `task_name` and `protocol_name` label the status items
    pub fn new(mode: PlanMode, task_name: impl Into<String>, protocol_name: impl Into<String>) -> Self {
        Self {
            goal: None,
            mode,
            task_name: task_name.into(),
            protocol_name: protocol_name.into(),
            protocol_read: false,
            entries: Vec::new(),
            errors: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Use the model's plan text as the goal; blank text keeps the default
    pub fn with_goal(mut self, goal: Option<&str>) -> Self {
        self.goal = goal
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_protocol_read(mut self, read: bool) -> Self {
        self.protocol_read = read;
        self
    }

    pub fn add(&mut self, path: impl Into<String>, action: WriteAction, note: Option<&str>) {
        self.entries.push(PlanEntry {
            path: path.into(),
            action,
            note: note.map(str::to_string),
        });
    }

    /// Record every file and error from a write report
    pub fn add_report(&mut self, report: &WriteReport, note: Option<&str>) {
        for path in &report.files_created {
            self.add(path.clone(), WriteAction::Create, note);
        }
        for path in &report.files_modified {
            self.add(path.clone(), WriteAction::Modify, note);
        }
        self.errors.extend(report.errors.iter().cloned());
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn mode(&self) -> &PlanMode {
        &self.mode
    }

    fn goal_text(&self) -> String {
        match (&self.goal, &self.mode) {
            (Some(goal), _) => goal.clone(),
            (None, PlanMode::Model) => format!("Implement requirements from {}", self.task_name),
            (None, PlanMode::Offline { .. }) => {
                format!("Implement requirements from {} (fallback mode)", self.task_name)
            }
        }
    }

    /// Render the markdown document
    pub fn render(&self) -> String {
        let mut doc = String::new();
        let check = |done: bool| if done { "[x]" } else { "[ ]" };

        doc.push_str("# Execution Plan\n\n");

        doc.push_str("## Goal\n");
        doc.push_str(&self.goal_text());
        doc.push_str("\n\n");

        doc.push_str("## Status\n");
        let _ = writeln!(doc, "- [x] Read {}", self.task_name);
        let _ = writeln!(doc, "- {} Read {}", check(self.protocol_read), self.protocol_name);
        doc.push_str("- [x] Create execution plan\n");
        match &self.mode {
            PlanMode::Model => {
                let _ = writeln!(doc, "- {} Implement code changes", check(!self.entries.is_empty()));
                doc.push_str("- [ ] Run tests (if available)\n");
            }
            PlanMode::Offline { error } => {
                let _ = writeln!(
                    doc,
                    "- [ ] Implementation failed, using fallback ({})",
                    single_line(error)
                );
            }
        }
        doc.push('\n');

        doc.push_str("## Files to Create/Modify\n");
        if self.entries.is_empty() {
            doc.push_str("- (none)\n");
        }
        for entry in &self.entries {
            match &entry.note {
                Some(note) => {
                    let _ = writeln!(doc, "- {} ({} - {})", entry.path, entry.action, note);
                }
                None => {
                    let _ = writeln!(doc, "- {} ({})", entry.path, entry.action);
                }
            }
        }

        if !self.errors.is_empty() {
            doc.push_str("\n## Errors\n");
            for error in &self.errors {
                let _ = writeln!(doc, "- {}", single_line(error));
            }
        }

        let mode = match self.mode {
            PlanMode::Model => "model",
            PlanMode::Offline { .. } => "offline fallback",
        };
        let _ = write!(
            doc,
            "\n_Generated {} ({})_\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            mode
        );

        doc
    }

    /// Write the rendered document, replacing any previous one
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.render())?;
        tracing::info!("Wrote execution plan: {}", path.display());
        Ok(())
    }
}

/// First non-blank line of `text`, shortened to fit a list item
fn single_line(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    let multi_line = text.trim().lines().nth(1).is_some();

    if line.chars().count() > MAX_LINE_CHARS {
        let short: String = line.chars().take(MAX_LINE_CHARS).collect();
        format!("{}...", short)
    } else if multi_line {
        format!("{} ...", line)
    } else {
        line.to_string()
    }
}
