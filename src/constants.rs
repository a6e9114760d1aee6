//! Application constants for token syntax, Vault endpoints, and configuration.
//!
//! This module contains all constant values used throughout the application,
//! including the secret-reference syntax, Vault API paths, and environment
//! variable names.

/// Secret-reference token syntax.
pub mod token {
    /// Pattern matching a `(( path[:key] ))` reference.
    ///
    /// `((`, at least one space, a body containing a `/`, at least one space, `))`.
    /// The `.*` runs are greedy, so several references on one line collapse into
    /// the widest match.
    pub const TOKEN_PATTERN: &str = r"\(\( +.*/.* +\)\)";

    /// Opening delimiter.
    pub const OPEN_DELIMITER: &str = "((";

    /// Closing delimiter.
    pub const CLOSE_DELIMITER: &str = "))";

    /// Separator between the secret path and the key inside a reference body.
    pub const KEY_SEPARATOR: char = ':';

    /// Key used when a reference does not name one.
    pub const DEFAULT_KEY: &str = "value";
}

/// Vault HTTP API paths.
pub mod api {
    /// Token introspection, used for the startup authentication check.
    pub const LOOKUP_SELF_PATH: &str = "/v1/auth/token/lookup-self";

    /// AppRole login endpoint.
    pub const APPROLE_LOGIN_PATH: &str = "/v1/auth/approle/login";

    /// Mount introspection, used to detect the KV engine version of a path.
    pub const MOUNTS_PATH: &str = "/v1/sys/internal/ui/mounts";

    /// Header carrying the Vault token.
    pub const TOKEN_HEADER: &str = "X-Vault-Token";

    /// Header carrying the Vault Enterprise namespace.
    pub const NAMESPACE_HEADER: &str = "X-Vault-Namespace";
}

/// Configuration defaults and environment variable names.
pub mod config {
    /// Vault address used when neither the config file nor `VAULT_ADDR` set one.
    pub const DEFAULT_VAULT_ADDR: &str = "http://127.0.0.1:8200";

    /// HTTP client timeout (in seconds) used when none is configured.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Application directory name under the XDG config home.
    pub const APP_DIR: &str = "vault-interpolate";

    /// Config file name inside the application directory.
    pub const CONFIG_FILE: &str = "config.toml";

    /// Config file name looked up in the current directory.
    pub const LOCAL_CONFIG_FILE: &str = "vault-interpolate.toml";

    pub const ENV_CONFIG_PATH: &str = "VAULT_INTERPOLATE_CONFIG";
    pub const ENV_VAULT_ADDR: &str = "VAULT_ADDR";
    pub const ENV_VAULT_TOKEN: &str = "VAULT_TOKEN";
    pub const ENV_VAULT_ROLE_ID: &str = "VAULT_ROLEID";
    pub const ENV_VAULT_SECRET_ID: &str = "VAULT_SECRETID";
    pub const ENV_VAULT_NAMESPACE: &str = "VAULT_NAMESPACE";
    pub const ENV_VAULT_TIMEOUT: &str = "VAULT_CLIENT_TIMEOUT";
    pub const ENV_VAULT_SKIP_VERIFY: &str = "VAULT_SKIP_VERIFY";
}
