//! XDG-compliant path resolution for configuration files.
//!
//! This module locates the optional config file and `.env` file following the
//! XDG Base Directory Specification, with the current directory taking priority.

use std::env;
use std::path::{Path, PathBuf};

use crate::constants::config::{APP_DIR, CONFIG_FILE, ENV_CONFIG_PATH, LOCAL_CONFIG_FILE};

/// Find the config file.
///
/// Priority:
/// 1. `explicit` (the `--config` flag), returned even if it does not exist so
///    the caller reports the missing file
/// 2. `VAULT_INTERPOLATE_CONFIG` from environment (if set and the file exists)
/// 3. Current directory/vault-interpolate.toml
/// 4. XDG_CONFIG_HOME/vault-interpolate/config.toml (if XDG_CONFIG_HOME is set)
/// 5. ~/.config/vault-interpolate/config.toml
///
/// Returns `None` when no config file is present; defaults apply then.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(config_path) = env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(current_dir) = env::current_dir() {
        let local = current_dir.join(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
    }

    config_dirs()
        .into_iter()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|path| path.exists())
}

/// Find and load a `.env` file.
///
/// Priority:
/// 1. Current directory/.env
/// 2. XDG_CONFIG_HOME/vault-interpolate/.env (if XDG_CONFIG_HOME is set)
/// 3. ~/.config/vault-interpolate/.env
///
/// Variables already present in the environment are never overridden.
/// Returns the path that was loaded, if any.
pub fn load_env_file() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(".env")];
    candidates.extend(config_dirs().into_iter().map(|dir| dir.join(".env")));

    let path = candidates.into_iter().find(|path| path.exists())?;
    match dotenv::from_path(&path) {
        Ok(()) => Some(path),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to load .env file");
            None
        }
    }
}

/// Application config directories in lookup order.
fn config_dirs() -> Vec<PathBuf> {
    let mut found = Vec::new();

    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
        found.push(PathBuf::from(xdg_config_home).join(APP_DIR));
    }

    if let Some(home) = dirs::home_dir() {
        let default_xdg = home.join(".config").join(APP_DIR);
        if !found.contains(&default_xdg) {
            found.push(default_xdg);
        }
    }

    found
}
