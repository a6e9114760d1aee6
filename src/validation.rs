//! Input validation utilities.
//!
//! This module validates the Vault connection settings gathered from the
//! config file and environment before any request is made.

use anyhow::{Context, Result};
use url::Url;

/// Validate a Vault server address.
///
/// # Errors
///
/// Returns an error if:
/// - The address is empty
/// - The address is not an absolute URL
/// - The scheme is neither `http` nor `https`
/// - The URL has no host
pub fn validate_vault_address(address: &str) -> Result<()> {
    let trimmed = address.trim();

    if trimmed.is_empty() {
        anyhow::bail!("Vault address cannot be empty");
    }

    let url = Url::parse(trimmed)
        .with_context(|| format!("Vault address is not a valid URL: '{}'", trimmed))?;

    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!(
            "Vault address must use http or https. Got: '{}'",
            url.scheme()
        );
    }

    if url.host_str().is_none() {
        anyhow::bail!("Vault address has no host: '{}'", trimmed);
    }

    Ok(())
}

/// Validate that a credential value is present and not blank.
///
/// `name` is only used in the error message.
pub fn validate_credential(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }

    if value.chars().any(char::is_control) {
        anyhow::bail!("{} contains control characters", name);
    }

    Ok(())
}

/// Validate an AppRole credential pair. Both halves must be set together.
pub fn validate_approle(role_id: Option<&str>, secret_id: Option<&str>) -> Result<()> {
    match (role_id, secret_id) {
        (Some(role_id), Some(secret_id)) => {
            validate_credential("AppRole role id", role_id)?;
            validate_credential("AppRole secret id", secret_id)
        }
        (Some(_), None) => anyhow::bail!("AppRole role id is set but secret id is missing"),
        (None, Some(_)) => anyhow::bail!("AppRole secret id is set but role id is missing"),
        (None, None) => anyhow::bail!("No AppRole credentials provided"),
    }
}

/// Validate an HTTP client timeout in seconds.
pub fn validate_timeout(timeout_secs: u64) -> Result<()> {
    if timeout_secs == 0 {
        anyhow::bail!("Vault client timeout must be at least 1 second");
    }
    Ok(())
}
