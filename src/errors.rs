use thiserror::Error;

/// Errors that can occur when talking to the secret backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Vault API error (status {status}): {}", .errors.join(", "))]
    Api { status: u16, errors: Vec<String> },
    #[error("No secret found at path '{0}'")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Vault authentication failed: {0}")]
    Auth(String),
    #[error("Unexpected Vault response: {0}")]
    Deserialize(String),
}

/// Errors that can occur while resolving and substituting references in a line.
#[derive(Error, Debug)]
pub enum InterpolateError {
    #[error("Failed to fetch secret at path '{path}'")]
    SecretFetch {
        path: String,
        #[source]
        source: BackendError,
    },
    #[error("Key '{key}' not found in secret at path '{path}'")]
    MissingKey { path: String, key: String },
    #[error("Secret reference {token} has an empty path")]
    InvalidReference { token: String },
    #[error("Secret reference {token} is not valid UTF-8")]
    InvalidEncoding { token: String },
}

/// Errors raised by the driver before any file is processed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Couldn't communicate with Vault at {address}: Unauthorized")]
    Unauthenticated { address: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Deserialize(err.to_string())
        } else {
            BackendError::Http(err.to_string())
        }
    }
}
