//! Fail-open helper for best-effort side effects
//!
//! Use for work whose failure must not change the outcome of a run, such as
//! appending usage notes to a README. Never use it for the generated files or
//! the execution plan themselves.

use tracing::warn;

use crate::Result;

/// Run an operation that should fail open
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// ```
/// use smith_core::fail_open::fail_open;
/// use smith_core::{Result, SmithError};
///
/// fn update_readme() -> Result<()> {
///     Err(SmithError::PathValidation("README.md is protected".to_string()))
/// }
///
/// assert_eq!(fail_open("readme_update", update_readme), None);
/// ```
pub fn fail_open<F, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T>,
{
    match f() {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}
