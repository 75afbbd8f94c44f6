//! # smith-agent
//!
//! Chat-completion client and file extraction for the issue implementer.
//!
//! A run sends one request to an OpenAI-compatible endpoint (OpenRouter or
//! OpenAI, chosen by which key is set), parses the reply with a small
//! line-oriented grammar, and writes the files it names under the working
//! directory.
//!
//! ## Degradation
//!
//! Nothing after the precondition checks fails a run:
//! - malformed file sections are skipped
//! - no file sections: the first code block is written at an inferred path
//! - no code at all: a minimal placeholder is written
//! - no reply: the offline fallback writes canned files
//!
//! The execution plan (`EXEC_PLAN.md`) is written in every case.

mod client;
pub mod exec_plan;
pub mod fallback;
mod file_writer;
mod implementer;
mod prompt;
mod provider;
pub mod response;
mod types;

pub use client::{CompletionBackend, HttpBackend};
pub use exec_plan::{ExecutionPlan, PlanEntry, PlanMode};
pub use file_writer::{validate_path, FileWriter, WriteAction, WritePolicy, WriteReport};
pub use implementer::{ExtractionTier, Implementer, RunOutcome, RunReport};
pub use prompt::{build_messages, build_prompt, response_format_instructions, PromptContext};
pub use provider::{
    credentials_from_env, resolve_credentials, Credentials, Provider, ProviderSettings,
};
pub use response::{parse_response, ParsedResponse, SkipReason, SkippedSection};
pub use types::*;
