//! # smith-core
//!
//! Shared building blocks for the smith CI automation tools:
//!
//! - [`SmithError`] and the crate-wide [`Result`] alias
//! - [`SmithConfig`], loaded from `.smith/config.toml` with defaults
//! - [`PlaceholderTable`], the `{{NAME}}` template substituter
//! - [`fail_open`], for best-effort side effects

pub mod config;
mod error;
pub mod fail_open;
pub mod template;

pub use config::{ImplementerConfig, RequestConfig, SmithConfig, TemplateConfig};
pub use error::{Result, SmithError};
pub use template::{read_file_or_empty, Placeholder, PlaceholderTable, ValueSource};
