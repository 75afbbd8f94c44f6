//! Shared setup for the smith binaries

use smith_core::SmithConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber
///
/// Stdout is left alone: `substitute-template` prints its result there.
/// `RUST_LOG` takes precedence over `verbose`.
pub fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Load configuration, falling back to defaults when it cannot be read
///
/// A broken config file is not one of the tools' failure conditions, so it
/// is logged and ignored. `explicit` is the `--config` argument, if any.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> SmithConfig {
    let loaded = match explicit {
        Some(path) => SmithConfig::load(path),
        None => SmithConfig::load_or_default(root),
    };

    loaded.unwrap_or_else(|e| {
        tracing::warn!("Ignoring configuration, using defaults: {}", e);
        SmithConfig::default()
    })
}
