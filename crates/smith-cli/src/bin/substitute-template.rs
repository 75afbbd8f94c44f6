//! substitute-template - fill `{{NAME}}` placeholders in a CI prompt template
//!
//! Usage:
//!   substitute-template <TEMPLATE>
//!
//! Values come from BACKEND_SPEC.md, backend/CLAUDE.md and the ISSUE_TITLE,
//! ISSUE_BODY, ISSUE_COMMENTS and EXISTING_FILES environment variables.
//! The result is printed to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use smith_core::{read_file_or_empty, PlaceholderTable};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "substitute-template")]
#[command(author, version, about = "Substitute placeholders in a prompt template")]
struct Cli {
    /// Template file to read
    template: PathBuf,

    /// Directory the placeholder source files are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to <root>/.smith/config.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    smith_cli::init_tracing(cli.verbose)?;

    let config = smith_cli::load_config(&cli.root, cli.config.as_deref());

    if !cli.template.exists() {
        warn!("Template {} not found, treating it as empty", cli.template.display());
    }
    let template = read_file_or_empty(&cli.template);

    let table = PlaceholderTable::from_env(&cli.root, &config.template);
    let result = table.substitute(&template);
    debug!("Rendered {} bytes from {}", result.len(), cli.template.display());

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(result.as_bytes())
        .context("Failed to write result")?;
    stdout.flush()?;

    Ok(())
}
