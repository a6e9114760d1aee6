use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::VaultConfig;
use crate::errors::BackendError;
use crate::vault;

/// Key/value pairs stored at a single secret path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretBundle {
    values: HashMap<String, String>,
}

impl SecretBundle {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
pub trait SecretBackend: Send + Sync {
    async fn is_authenticated(&self) -> bool;
    async fn fetch_secret(&self, path: &str) -> Result<SecretBundle, BackendError>;
}

#[async_trait]
pub trait SecretBackendFactory: Send + Sync {
    async fn create(&self, config: VaultConfig) -> Result<Box<dyn SecretBackend>>;
}

pub struct RealVaultBackend {
    inner: vault::VaultClient,
}

#[async_trait]
impl SecretBackend for RealVaultBackend {
    async fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated().await
    }

    async fn fetch_secret(&self, path: &str) -> Result<SecretBundle, BackendError> {
        self.inner.get_secret(path).await
    }
}

pub struct RealVaultBackendFactory;

#[async_trait]
impl SecretBackendFactory for RealVaultBackendFactory {
    async fn create(&self, config: VaultConfig) -> Result<Box<dyn SecretBackend>> {
        let client = vault::VaultClient::new(config).await?;
        Ok(Box::new(RealVaultBackend { inner: client }))
    }
}
