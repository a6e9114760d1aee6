use std::collections::HashMap;

use crate::tokenizer::Token;

/// Resolved values keyed by the literal token text.
///
/// Entries are written once and never replaced or evicted for the lifetime of
/// the cache, so every occurrence of a token within a run renders identically.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, String>,
    hits: usize,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a token, counting the hit.
    pub fn lookup(&mut self, token: &Token) -> Option<&str> {
        let value = self.entries.get(token.as_str())?;
        self.hits += 1;
        Some(value.as_str())
    }

    /// Store the value for a token unless one is already present.
    ///
    /// Returns the value held by the cache afterwards.
    pub fn insert(&mut self, token: &Token, value: String) -> &str {
        self.entries
            .entry(token.as_str().to_string())
            .or_insert(value)
            .as_str()
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.entries.contains_key(token.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_miss_then_hit() {
        let mut cache = ResolutionCache::new();
        let token = Token::new("(( a/b ))");
        assert!(cache.lookup(&token).is_none());
        assert_eq!(cache.hits(), 0);

        cache.insert(&token, "secret".to_string());
        assert_eq!(cache.lookup(&token), Some("secret"));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_never_overwrites() {
        let mut cache = ResolutionCache::new();
        let token = Token::new("(( a/b ))");
        assert_eq!(cache.insert(&token, "first".to_string()), "first");
        assert_eq!(cache.insert(&token, "second".to_string()), "first");
        assert_eq!(cache.lookup(&token), Some("first"));
    }

    #[test]
    fn test_keys_are_literal_text() {
        let mut cache = ResolutionCache::new();
        cache.insert(&Token::new("(( a/b ))"), "one".to_string());
        assert!(cache.contains(&Token::new("(( a/b ))")));
        assert!(!cache.contains(&Token::new("((  a/b ))")));
        assert!(!cache.is_empty());
    }
}
