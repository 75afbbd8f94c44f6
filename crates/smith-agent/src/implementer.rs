//! Issue implementer - turns a task document into files on disk
//!
//! One run is: read documents, send one completion request, extract files
//! from the reply, write them, write the execution plan. When the reply
//! yields nothing the run degrades through three tiers:
//!
//! 1. `## File N: <path>` sections
//! 2. the first code block anywhere, at a path inferred from the task
//! 3. a minimal placeholder file
//!
//! When the completion itself fails the run takes the offline fallback
//! instead. Either way the plan is written; files that cannot be written
//! are listed as errors in it.

use crate::client::CompletionBackend;
use crate::exec_plan::{ExecutionPlan, PlanEntry, PlanMode};
use crate::fallback;
use crate::file_writer::{FileWriter, WriteAction, WritePolicy};
use crate::prompt::{build_messages, PromptContext};
use crate::response::parse_response;
use crate::types::{ChatRequest, CompletionError, GeneratedFile};
use smith_core::fail_open::fail_open;
use smith_core::{Result, SmithConfig, SmithError};
use std::fs;
use std::path::{Path, PathBuf};

/// Which extraction tier produced the files of a model-backed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTier {
    FileSections,
    CodeBlock,
    Placeholder,
}

impl std::fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionTier::FileSections => write!(f, "file sections"),
            ExtractionTier::CodeBlock => write!(f, "first code block"),
            ExtractionTier::Placeholder => write!(f, "minimal placeholder"),
        }
    }
}

/// How a run produced its files
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Model { tier: ExtractionTier },
    Offline { error: CompletionError },
}

/// Result of one implementer run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Files written, in order
    pub entries: Vec<PlanEntry>,
    /// Per-file write failures
    pub errors: Vec<String>,
    /// Where the execution plan was written
    pub plan_path: PathBuf,
}

impl RunReport {
    /// One-line summary for the console
    pub fn summary(&self) -> String {
        let how = match &self.outcome {
            RunOutcome::Model { tier } => format!("model reply ({})", tier),
            RunOutcome::Offline { .. } => "offline fallback".to_string(),
        };
        let mut summary = format!("{} file(s) written via {}", self.entries.len(), how);
        if !self.errors.is_empty() {
            summary.push_str(&format!(", {} write error(s)", self.errors.len()));
        }
        summary
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }
}

/// Documents and settings for one run
#[derive(Debug, Clone)]
pub struct Implementer {
    root: PathBuf,
    config: SmithConfig,
    context: PromptContext,
}

impl Implementer {
    /// Read the task document and optional context documents under `root`
    ///
    /// Fails with [`SmithError::MissingTaskDocument`] when the task document
    /// is missing or blank.
    pub fn prepare(root: impl Into<PathBuf>, config: SmithConfig) -> Result<Self> {
        let root = root.into();
        let task_path = root.join(&config.implementer.task_document);

        let task = match fs::read_to_string(&task_path) {
            Ok(text) if !text.trim().is_empty() => text,
            _ => return Err(SmithError::MissingTaskDocument(task_path)),
        };
        tracing::info!("Read {}", config.implementer.task_document.display());

        let protocol = read_optional(&root.join(&config.implementer.protocol_document));
        let project_plan = read_optional(&root.join(&config.implementer.project_plan_document));

        Ok(Self {
            root,
            config,
            context: PromptContext {
                task,
                protocol,
                project_plan,
            },
        })
    }

    pub fn context(&self) -> &PromptContext {
        &self.context
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The single request sent for this run
    pub fn request(&self, model: &str) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            messages: build_messages(&self.context),
            temperature: self.config.request.temperature,
            max_tokens: self.config.request.max_tokens,
        }
    }

    /// Run against a backend, falling back offline if the completion fails
    pub async fn run(&self, backend: &dyn CompletionBackend) -> Result<RunReport> {
        let request = self.request(backend.model());

        match backend.complete(&request).await {
            Ok(completion) => {
                tracing::info!("Received reply from {}", completion.model);
                self.apply_reply(&completion.text)
            }
            Err(e) => {
                tracing::error!("Completion failed: {}", e);
                self.offline_fallback(e)
            }
        }
    }

    /// Extract files from a reply, write them and the plan
    pub fn apply_reply(&self, reply: &str) -> Result<RunReport> {
        let parsed = parse_response(reply);
        for skipped in &parsed.skipped {
            tracing::warn!("Skipped section '{}': {}", skipped.heading, skipped.reason);
        }

        let writer = self.writer();
        let mut plan = self
            .plan(PlanMode::Model)
            .with_goal(parsed.plan.as_deref());

        let report = writer.write_all(&parsed.files);
        plan.add_report(&report, None);
        let mut errors = report.errors.clone();
        let mut written = report.written();
        let mut tier = ExtractionTier::FileSections;

        if written == 0 {
            if let Some(block) = parsed.first_code_block() {
                tier = ExtractionTier::CodeBlock;
                let file = GeneratedFile::new(
                    fallback::infer_code_block_path(&self.context.task),
                    block,
                );
                tracing::warn!(
                    "No file sections in reply, writing first code block to {}",
                    file.path
                );
                if write_recorded(&writer, &file, None, &mut plan, &mut errors) {
                    written += 1;
                }
            }
        }

        if written == 0 {
            tier = ExtractionTier::Placeholder;
            let file = fallback::minimal_placeholder(&self.context.task);
            tracing::warn!("No code in reply, writing placeholder {}", file.path);
            write_recorded(&writer, &file, Some("minimal example"), &mut plan, &mut errors);
        }

        self.finish(plan, RunOutcome::Model { tier }, errors)
    }

    /// Write canned files without a model
    pub fn offline_fallback(&self, error: CompletionError) -> Result<RunReport> {
        tracing::warn!("Using offline fallback");
        let writer = self.writer();
        let mut plan = self.plan(PlanMode::Offline {
            error: error.to_string(),
        });

        let mut errors = Vec::new();

        if fallback::is_todo_task(&self.context.task) {
            let template = read_optional(&self.root.join(&self.config.implementer.checklist_template));
            let script = fallback::todo_script(&fallback::checklist_items(template.as_deref()));
            write_recorded(&writer, &script, Some("offline fallback"), &mut plan, &mut errors);

            if let Some(Some(action)) = fail_open("readme_update", || self.update_readme()) {
                let readme = self.config.implementer.readme_document.display().to_string();
                plan.add(readme, action, Some("usage section"));
            }
        } else {
            let script = fallback::fallback_script();
            write_recorded(&writer, &script, Some("fallback file"), &mut plan, &mut errors);
        }

        self.finish(plan, RunOutcome::Offline { error }, errors)
    }

    /// Append the TODO generator section to the README
    ///
    /// Returns `None` when the README already documents it.
    fn update_readme(&self) -> Result<Option<WriteAction>> {
        let path = self.root.join(&self.config.implementer.readme_document);
        let existing = fs::read_to_string(&path).ok();

        let Some(updated) = fallback::readme_with_todo_section(existing.as_deref()) else {
            tracing::debug!("README already documents the TODO generator");
            return Ok(None);
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, updated)?;
        tracing::info!("Updated {}", path.display());

        Ok(Some(if existing.is_some() {
            WriteAction::Modify
        } else {
            WriteAction::Create
        }))
    }

    fn writer(&self) -> FileWriter {
        FileWriter::new(&self.root, WritePolicy::from_config(&self.config.implementer))
    }

    fn plan(&self, mode: PlanMode) -> ExecutionPlan {
        ExecutionPlan::new(
            mode,
            self.config.implementer.task_document.display().to_string(),
            self.config.implementer.protocol_document.display().to_string(),
        )
        .with_protocol_read(self.context.protocol.is_some())
    }

    fn finish(
        &self,
        plan: ExecutionPlan,
        outcome: RunOutcome,
        errors: Vec<String>,
    ) -> Result<RunReport> {
        let plan_path = self.root.join(&self.config.implementer.exec_plan_document);
        plan.write_to(&plan_path)?;

        Ok(RunReport {
            outcome,
            entries: plan.entries().to_vec(),
            errors,
            plan_path,
        })
    }
}

/// Write one file, recording it in the plan or as a write error
///
/// Returns whether the file landed on disk.
fn write_recorded(
    writer: &FileWriter,
    file: &GeneratedFile,
    note: Option<&str>,
    plan: &mut ExecutionPlan,
    errors: &mut Vec<String>,
) -> bool {
    match writer.write(file) {
        Ok(action) => {
            plan.add(file.path.as_str(), action, note);
            true
        }
        Err(e) => {
            let message = format!("Failed to write {}: {}", file.path, e);
            tracing::error!("{}", message);
            plan.add_error(message.as_str());
            errors.push(message);
            false
        }
    }
}

/// Read an optional document; missing or blank documents are `None`
fn read_optional(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .filter(|text| !text.trim().is_empty())
}
