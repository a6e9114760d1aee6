//! Error formatting utilities.
//!
//! Fatal errors surface in `main` as a single line, so the whole cause chain
//! (for example the Vault API message behind a failed fetch) has to be visible.

use anyhow::Error;

/// Format an error and its source chain into a single line.
///
/// Each cause is joined with " → ", outermost first.
///
/// # Example
///
/// ```
/// use anyhow::anyhow;
/// use vault_interpolate::error::format_error_chain;
///
/// let err = anyhow!("permission denied")
///     .context("Failed to fetch secret at path 'secret/db'")
///     .context("Failed to render config.yml");
/// assert_eq!(
///     format_error_chain(&err),
///     "Failed to render config.yml → Failed to fetch secret at path 'secret/db' → permission denied"
/// );
/// ```
pub fn format_error_chain(error: &Error) -> String {
    error
        .chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(" → ")
}
