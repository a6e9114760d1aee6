//! Configuration file parsing and validation.
//!
//! Settings come from an optional TOML file, overridden by the standard Vault
//! environment variables. [`Config::vault_config`] turns the merged settings
//! into the validated [`VaultConfig`] used to build the Vault client.

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constants::config as keys;
use crate::resolver::MissingKeyPolicy;
use crate::validation;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Vault connection settings.
    #[serde(default)]
    pub vault: VaultSettings,
    /// Interpolation behavior.
    #[serde(default)]
    pub interpolation: InterpolationSettings,
}

/// `[vault]` section. Every field may also come from the environment.
#[derive(Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct VaultSettings {
    /// Server address, e.g. `https://vault.example.com:8200`.
    pub address: Option<String>,
    /// Static Vault token.
    pub token: Option<String>,
    /// AppRole role id.
    pub role_id: Option<String>,
    /// AppRole secret id.
    pub secret_id: Option<String>,
    /// Vault Enterprise namespace.
    pub namespace: Option<String>,
    /// HTTP client timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Accept invalid TLS certificates. Development only.
    pub skip_verify: Option<bool>,
}

impl fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultSettings")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("role_id", &self.role_id)
            .field("secret_id", &self.secret_id.as_ref().map(|_| "<redacted>"))
            .field("namespace", &self.namespace)
            .field("timeout_secs", &self.timeout_secs)
            .field("skip_verify", &self.skip_verify)
            .finish()
    }
}

/// `[interpolation]` section.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct InterpolationSettings {
    /// Fail when a referenced key is missing from its secret instead of
    /// substituting an empty string.
    #[serde(default)]
    pub strict: bool,
}

impl InterpolationSettings {
    pub fn missing_key_policy(&self) -> MissingKeyPolicy {
        if self.strict {
            MissingKeyPolicy::Error
        } else {
            MissingKeyPolicy::Empty
        }
    }
}

/// How the client authenticates with Vault.
#[derive(Clone, PartialEq, Eq)]
pub enum VaultAuth {
    /// Static token, used as-is.
    Token(String),
    /// AppRole login performed when the client is built.
    AppRole { role_id: String, secret_id: String },
}

impl fmt::Debug for VaultAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::AppRole { role_id, .. } => f
                .debug_struct("AppRole")
                .field("role_id", role_id)
                .field("secret_id", &"<redacted>")
                .finish(),
        }
    }
}

/// Validated settings for the Vault client.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub address: String,
    pub auth: VaultAuth,
    pub namespace: Option<String>,
    pub timeout: Duration,
    pub skip_verify: bool,
}

impl VaultConfig {
    pub fn new(address: impl Into<String>, auth: VaultAuth) -> Self {
        Self {
            address: address.into().trim_end_matches('/').to_string(),
            auth,
            namespace: None,
            timeout: Duration::from_secs(keys::DEFAULT_TIMEOUT_SECS),
            skip_verify: false,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accept self-signed TLS certificates. **Only for development.**
    pub fn with_skip_verify(mut self) -> Self {
        self.skip_verify = true;
        self
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the config file (if any) and apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match crate::paths::find_config_file(explicit) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override file settings with the standard Vault environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        let vault = &mut self.vault;

        if let Some(address) = env_value(keys::ENV_VAULT_ADDR) {
            vault.address = Some(address);
        }
        if let Some(token) = env_value(keys::ENV_VAULT_TOKEN) {
            vault.token = Some(token);
        }
        if let Some(role_id) = env_value(keys::ENV_VAULT_ROLE_ID) {
            vault.role_id = Some(role_id);
        }
        if let Some(secret_id) = env_value(keys::ENV_VAULT_SECRET_ID) {
            vault.secret_id = Some(secret_id);
        }
        if let Some(namespace) = env_value(keys::ENV_VAULT_NAMESPACE) {
            vault.namespace = Some(namespace);
        }
        if let Some(timeout) = env_value(keys::ENV_VAULT_TIMEOUT) {
            vault.timeout_secs = Some(parse_timeout(&timeout).with_context(|| {
                format!("Invalid {}: '{}'", keys::ENV_VAULT_TIMEOUT, timeout)
            })?);
        }
        if let Some(skip_verify) = env_value(keys::ENV_VAULT_SKIP_VERIFY) {
            vault.skip_verify = Some(parse_flag(&skip_verify));
        }

        Ok(())
    }

    /// Build the validated client settings.
    ///
    /// AppRole credentials take precedence over a token when both are set.
    pub fn vault_config(&self) -> Result<VaultConfig> {
        let vault = &self.vault;

        let address = vault
            .address
            .clone()
            .unwrap_or_else(|| keys::DEFAULT_VAULT_ADDR.to_string());
        validation::validate_vault_address(&address)?;

        let auth = if vault.role_id.is_some() || vault.secret_id.is_some() {
            validation::validate_approle(vault.role_id.as_deref(), vault.secret_id.as_deref())?;
            VaultAuth::AppRole {
                role_id: vault.role_id.clone().unwrap_or_default(),
                secret_id: vault.secret_id.clone().unwrap_or_default(),
            }
        } else if let Some(token) = &vault.token {
            validation::validate_credential("Vault token", token)?;
            VaultAuth::Token(token.clone())
        } else {
            anyhow::bail!(
                "No Vault credentials configured: set {} or {}/{}",
                keys::ENV_VAULT_TOKEN,
                keys::ENV_VAULT_ROLE_ID,
                keys::ENV_VAULT_SECRET_ID
            );
        };

        let timeout_secs = vault.timeout_secs.unwrap_or(keys::DEFAULT_TIMEOUT_SECS);
        validation::validate_timeout(timeout_secs)?;

        let mut config =
            VaultConfig::new(address, auth).with_timeout(Duration::from_secs(timeout_secs));
        if let Some(namespace) = vault.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            config = config.with_namespace(namespace);
        }
        if vault.skip_verify.unwrap_or(false) {
            config = config.with_skip_verify();
        }

        Ok(config)
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Parse a timeout given as whole seconds, optionally suffixed with `s`.
fn parse_timeout(value: &str) -> Result<u64> {
    let trimmed = value.trim();
    let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
    digits
        .parse::<u64>()
        .context("expected a number of seconds")
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings_with_token() -> Config {
        Config {
            vault: VaultSettings {
                token: Some("hvs.test".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_from_file_full() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[vault]
address = "https://vault.example.com:8200"
token = "hvs.file"
namespace = "team-a"
timeout_secs = 5

[interpolation]
strict = true
"#,
        )
        .unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(
            config.vault.address.as_deref(),
            Some("https://vault.example.com:8200")
        );
        assert_eq!(config.vault.namespace.as_deref(), Some("team-a"));
        assert_eq!(config.vault.timeout_secs, Some(5));
        assert_eq!(
            config.interpolation.missing_key_policy(),
            MissingKeyPolicy::Error
        );
    }

    #[test]
    fn test_from_file_empty_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "").unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert!(config.vault.address.is_none());
        assert!(!config.interpolation.strict);
    }

    #[test]
    fn test_from_file_rejects_unknown_fields() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[vault]\nadress = \"http://x\"\n").unwrap();

        assert!(Config::from_file(&config_path).is_err());
    }

    #[test]
    fn test_vault_config_defaults() {
        let vault_config = settings_with_token().vault_config().unwrap();
        assert_eq!(vault_config.address, "http://127.0.0.1:8200");
        assert_eq!(vault_config.auth, VaultAuth::Token("hvs.test".to_string()));
        assert_eq!(vault_config.timeout, Duration::from_secs(30));
        assert!(vault_config.namespace.is_none());
        assert!(!vault_config.skip_verify);
    }

    #[test]
    fn test_vault_config_prefers_approle() {
        let mut config = settings_with_token();
        config.vault.role_id = Some("role".to_string());
        config.vault.secret_id = Some("secret".to_string());

        let vault_config = config.vault_config().unwrap();
        assert_eq!(
            vault_config.auth,
            VaultAuth::AppRole {
                role_id: "role".to_string(),
                secret_id: "secret".to_string(),
            }
        );
    }

    #[test]
    fn test_vault_config_requires_credentials() {
        let err = Config::default().vault_config().unwrap_err();
        assert!(err.to_string().contains("No Vault credentials configured"));
    }

    #[test]
    fn test_vault_config_rejects_half_approle() {
        let mut config = Config::default();
        config.vault.role_id = Some("role".to_string());
        assert!(config.vault_config().is_err());
    }

    #[test]
    fn test_vault_config_strips_trailing_slash() {
        let mut config = settings_with_token();
        config.vault.address = Some("https://vault.example.com/".to_string());
        assert_eq!(
            config.vault_config().unwrap().address,
            "https://vault.example.com"
        );
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("10").unwrap(), 10);
        assert_eq!(parse_timeout("10s").unwrap(), 10);
        assert!(parse_timeout("ten").is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let mut config = settings_with_token();
        config.vault.secret_id = Some("top-secret".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hvs.test"));
        assert!(!rendered.contains("top-secret"));
        assert!(format!("{:?}", VaultAuth::Token("hvs.x".to_string())).contains("redacted"));
    }
}
