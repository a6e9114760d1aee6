//! Decomposition of a token into a Vault path and a key.

use crate::constants::token::{CLOSE_DELIMITER, DEFAULT_KEY, KEY_SEPARATOR, OPEN_DELIMITER};
use crate::tokenizer::Token;

/// A secret path plus the key to read from the secret stored there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    pub path: String,
    pub key: String,
}

impl SecretReference {
    /// Parse a token such as `(( secret/db:password ))`.
    pub fn parse(token: &Token) -> Self {
        Self::from_body(strip_delimiters(token.as_str()))
    }

    /// Split a reference body on `:`.
    ///
    /// Only a body with exactly one separator names a key; anything else is
    /// taken whole as the path and reads the default key.
    pub fn from_body(body: &str) -> Self {
        let segments: Vec<&str> = body.split(KEY_SEPARATOR).collect();
        match segments.as_slice() {
            [path, key] => Self {
                path: (*path).to_string(),
                key: (*key).to_string(),
            },
            _ => Self {
                path: body.to_string(),
                key: DEFAULT_KEY.to_string(),
            },
        }
    }

    /// Whether the key was left out of the reference.
    pub fn uses_default_key(&self) -> bool {
        self.key == DEFAULT_KEY
    }
}

/// Remove the outer `((`/`))` and the spaces right next to them.
pub fn strip_delimiters(token: &str) -> &str {
    let body = token.strip_prefix(OPEN_DELIMITER).unwrap_or(token);
    let body = body.strip_suffix(CLOSE_DELIMITER).unwrap_or(body);
    body.trim_start_matches(' ').trim_end_matches(' ')
}
