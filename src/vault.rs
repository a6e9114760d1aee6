//! HashiCorp Vault client for reading KV secrets.
//!
//! Supports both KV engine versions. The version of the mount holding a path is
//! looked up through `sys/internal/ui/mounts`; when that endpoint is not
//! readable the path is treated as a KV v1 path.

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::app_deps::SecretBundle;
use crate::config::{VaultAuth, VaultConfig};
use crate::constants::api;
use crate::errors::BackendError;

#[derive(Debug, Deserialize)]
struct MountResponse {
    data: MountInfo,
}

#[derive(Debug, Deserialize)]
struct MountInfo {
    path: String,
    #[serde(default)]
    options: Option<MountOptions>,
}

#[derive(Debug, Deserialize)]
struct MountOptions {
    version: Option<String>,
}

/// Where a secret path lives and how its payload is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvPath {
    V1 { path: String },
    V2 { mount: String, rest: String },
}

impl KvPath {
    /// Secret path (relative to `/v1/`) used to read the secret.
    pub fn read_path(&self) -> String {
        match self {
            KvPath::V1 { path } => path.clone(),
            KvPath::V2 { mount, rest } => {
                format!("{}/data/{}", mount.trim_end_matches('/'), rest)
            }
        }
    }

    /// JSON pointer to the key/value object in the read response.
    fn data_pointer(&self) -> &'static str {
        match self {
            KvPath::V1 { .. } => "/data",
            KvPath::V2 { .. } => "/data/data",
        }
    }
}

pub struct VaultClient {
    client: Client,
    base: Url,
    token: String,
    namespace: Option<String>,
}

impl VaultClient {
    /// Build the HTTP client and log in.
    ///
    /// Token auth makes no request here; AppRole performs a login.
    pub async fn new(config: VaultConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.skip_verify)
            .build()
            .context("Failed to create HTTP client")?;

        let base = Url::parse(&config.address)
            .with_context(|| format!("Invalid Vault address: {}", config.address))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Invalid Vault address: {}", config.address);
        }

        let token = match &config.auth {
            VaultAuth::Token(token) => token.clone(),
            VaultAuth::AppRole { role_id, secret_id } => approle_login(
                &client,
                &base,
                config.namespace.as_deref(),
                role_id,
                secret_id,
            )
            .await
            .context("Failed to log in to Vault with AppRole")?,
        };

        Ok(Self {
            client,
            base,
            token,
            namespace: config.namespace,
        })
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(api::TOKEN_HEADER, &self.token);
        match &self.namespace {
            Some(namespace) => request.header(api::NAMESPACE_HEADER, namespace),
            None => request,
        }
    }

    /// Whether the configured token is accepted by Vault.
    pub async fn is_authenticated(&self) -> bool {
        let url = match endpoint(&self.base, api::LOOKUP_SELF_PATH, "") {
            Ok(url) => url,
            Err(err) => {
                debug!(error = %err, "vault token lookup failed");
                return false;
            }
        };
        match self.get(url).send().await {
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), "vault token lookup");
                resp.status().is_success()
            }
            Err(err) => {
                debug!(error = %err, "vault token lookup failed");
                false
            }
        }
    }

    /// Work out which KV engine version serves `path`.
    pub async fn resolve_kv_path(&self, path: &str) -> KvPath {
        let fallback = KvPath::V1 {
            path: path.to_string(),
        };

        let url = match endpoint(&self.base, api::MOUNTS_PATH, path) {
            Ok(url) => url,
            Err(err) => {
                debug!(path, error = %err, "mount lookup failed, assuming kv v1");
                return fallback;
            }
        };

        let resp = match self.get(url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!(path, status = resp.status().as_u16(), "mount lookup refused, assuming kv v1");
                return fallback;
            }
            Err(err) => {
                debug!(path, error = %err, "mount lookup failed, assuming kv v1");
                return fallback;
            }
        };

        let mount = match resp.json::<MountResponse>().await {
            Ok(mount) => mount.data,
            Err(err) => {
                debug!(path, error = %err, "unreadable mount info, assuming kv v1");
                return fallback;
            }
        };

        let is_v2 = mount
            .options
            .and_then(|options| options.version)
            .is_some_and(|version| version == "2");

        match path.strip_prefix(mount.path.as_str()) {
            Some(rest) if is_v2 => KvPath::V2 {
                mount: mount.path.clone(),
                rest: rest.to_string(),
            },
            _ => fallback,
        }
    }

    /// Read every key stored at `path`.
    pub async fn get_secret(&self, path: &str) -> Result<SecretBundle, BackendError> {
        let kv_path = self.resolve_kv_path(path).await;
        debug!(path, kv = ?kv_path, "reading secret");

        let url = endpoint(&self.base, "/v1", &kv_path.read_path())?;
        let resp = self.get(url).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(api_error(resp).await);
        }

        let body: Value = resp.json().await?;
        match body.pointer(kv_path.data_pointer()) {
            Some(Value::Object(data)) => Ok(data
                .iter()
                .map(|(key, value)| (key.clone(), render_value(value)))
                .collect()),
            Some(Value::Null) | None => Err(BackendError::NotFound(path.to_string())),
            Some(other) => Err(BackendError::Deserialize(format!(
                "expected an object of secret values, got {}",
                other
            ))),
        }
    }
}

/// Join an API path and a secret path onto the Vault address.
///
/// Every secret path segment is percent-encoded, so `?`, `#` and spaces stay
/// part of the path. A path prefix on the address is kept.
fn endpoint(base: &Url, api_path: &str, secret_path: &str) -> Result<Url, BackendError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BackendError::Http(format!("Invalid Vault address: {}", base)))?
        .pop_if_empty()
        .extend(api_path.split('/').filter(|s| !s.is_empty()))
        .extend(secret_path.split('/').filter(|s| !s.is_empty()));
    Ok(url)
}

async fn approle_login(
    client: &Client,
    base: &Url,
    namespace: Option<&str>,
    role_id: &str,
    secret_id: &str,
) -> Result<String, BackendError> {
    let body = serde_json::json!({"role_id": role_id, "secret_id": secret_id});
    let mut request = client
        .post(endpoint(base, api::APPROLE_LOGIN_PATH, "")?)
        .json(&body);
    if let Some(namespace) = namespace {
        request = request.header(api::NAMESPACE_HEADER, namespace);
    }

    let resp = request.send().await?;
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }

    let json: Value = resp.json().await?;
    json.pointer("/auth/client_token")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| BackendError::Auth("missing client_token in AppRole login response".into()))
}

async fn api_error(resp: Response) -> BackendError {
    let status = resp.status().as_u16();
    let errors = resp
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| {
            v.get("errors")?.as_array().map(|arr| {
                arr.iter()
                    .filter_map(|e| e.as_str().map(String::from))
                    .collect()
            })
        })
        .unwrap_or_default();
    BackendError::Api { status, errors }
}

/// Secret values are normally strings; anything else is kept as JSON text.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
