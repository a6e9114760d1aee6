//! Resolution and substitution of secret references.
//!
//! A [`Resolver`] owns the [`ResolutionCache`] for a run and borrows the secret
//! backend. Each distinct token text is fetched at most once; every later
//! occurrence, on any line of any file, reuses the cached value.

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::app_deps::SecretBackend;
use crate::cache::ResolutionCache;
use crate::errors::InterpolateError;
use crate::reference::SecretReference;
use crate::tokenizer::{self, Token};

/// What to do when a secret exists but lacks the referenced key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingKeyPolicy {
    /// Substitute an empty string.
    #[default]
    Empty,
    /// Fail with [`InterpolateError::MissingKey`].
    Error,
}

pub struct Resolver<'a> {
    backend: &'a dyn SecretBackend,
    cache: ResolutionCache,
    missing_keys: MissingKeyPolicy,
    fetches: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(backend: &'a dyn SecretBackend) -> Self {
        Self {
            backend,
            cache: ResolutionCache::new(),
            missing_keys: MissingKeyPolicy::default(),
            fetches: 0,
        }
    }

    pub fn with_missing_key_policy(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_keys = policy;
        self
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Number of backend fetches performed so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    /// Resolve a single token to its secret value, fetching it on a cache miss.
    pub async fn resolve(&mut self, token: &Token) -> Result<String, InterpolateError> {
        if let Some(value) = self.cache.lookup(token) {
            debug!(token = %token, "secret already in cache");
            return Ok(value.to_string());
        }

        let reference = SecretReference::parse(token);
        if reference.path.is_empty() {
            return Err(InterpolateError::InvalidReference {
                token: token.to_string(),
            });
        }
        if reference.uses_default_key() && reference.path.contains(':') {
            debug!(path = %reference.path, "reference has several ':' separators, reading whole body as path");
        }
        debug!(path = %reference.path, key = %reference.key, "fetching secret");

        self.fetches += 1;
        let bundle = self
            .backend
            .fetch_secret(&reference.path)
            .await
            .map_err(|source| InterpolateError::SecretFetch {
                path: reference.path.clone(),
                source,
            })?;

        let value = match bundle.get(&reference.key) {
            Some(value) => value.to_string(),
            None => match self.missing_keys {
                MissingKeyPolicy::Empty => {
                    warn!(
                        path = %reference.path,
                        key = %reference.key,
                        "key not found in secret, substituting empty value"
                    );
                    String::new()
                }
                MissingKeyPolicy::Error => {
                    return Err(InterpolateError::MissingKey {
                        path: reference.path,
                        key: reference.key,
                    });
                }
            },
        };

        Ok(self.cache.insert(token, value).to_string())
    }

    /// Replace every token in `line` with its resolved value.
    ///
    /// Tokens are handled in order and each replaces all of its literal
    /// occurrences. If any token fails, the error is returned and no part of
    /// the line is substituted.
    pub async fn substitute(
        &mut self,
        line: &str,
        tokens: &[Token],
    ) -> Result<String, InterpolateError> {
        let mut new_line = line.to_string();
        for token in tokens {
            let value = self.resolve(token).await?;
            new_line = new_line.replace(token.as_str(), &value);
        }
        Ok(new_line)
    }

    /// Tokenize and substitute a single line.
    ///
    /// Returns the line borrowed when it holds no reference.
    pub async fn interpolate_line<'l>(
        &mut self,
        line: &'l str,
    ) -> Result<Cow<'l, str>, InterpolateError> {
        let tokens = tokenizer::extract_tokens(line);
        if tokens.is_empty() {
            return Ok(Cow::Borrowed(line));
        }
        debug!(tokens = tokens.len(), "found secret references in line");
        self.substitute(line, &tokens).await.map(Cow::Owned)
    }

    /// Like [`interpolate_line`](Self::interpolate_line) for raw bytes.
    ///
    /// Lines that are not valid UTF-8 keep every byte outside the references.
    pub async fn interpolate_bytes<'l>(
        &mut self,
        line: &'l [u8],
    ) -> Result<Cow<'l, [u8]>, InterpolateError> {
        if let Ok(text) = std::str::from_utf8(line) {
            return Ok(match self.interpolate_line(text).await? {
                Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
                Cow::Owned(text) => Cow::Owned(text.into_bytes()),
            });
        }

        let tokens = tokenizer::extract_tokens_from_bytes(line)?;
        if tokens.is_empty() {
            return Ok(Cow::Borrowed(line));
        }
        debug!(tokens = tokens.len(), "found secret references in non UTF-8 line");

        let mut new_line = line.to_vec();
        for token in &tokens {
            let value = self.resolve(token).await?;
            new_line = replace_bytes(&new_line, token.as_str().as_bytes(), value.as_bytes());
        }
        Ok(Cow::Owned(new_line))
    }
}

fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(pos) = rest.windows(from.len()).position(|window| window == from) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(to);
        rest = &rest[pos + from.len()..];
    }
    out.extend_from_slice(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_bytes_replaces_every_occurrence() {
        assert_eq!(
            replace_bytes(b"a=(( x/y )) \xe9 (( x/y ))", b"(( x/y ))", b"v"),
            b"a=v \xe9 v".to_vec()
        );
        assert_eq!(replace_bytes(b"\xff no match", b"(( x/y ))", b"v"), b"\xff no match".to_vec());
    }
}
