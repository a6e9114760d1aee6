//! Secret-reference tokenization.
//!
//! Finds `(( path[:key] ))` references in a single line of text. Tokens keep
//! their delimiters and surrounding spaces so they can be used verbatim as
//! cache keys and replacement targets.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants;
use crate::errors::InterpolateError;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(constants::token::TOKEN_PATTERN).expect("token pattern is a valid regex")
});

// Unicode mode off so `.` also matches bytes that are not valid UTF-8.
static TOKEN_BYTES_RE: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(&format!("(?-u){}", constants::token::TOKEN_PATTERN))
        .expect("token pattern is a valid regex")
});

/// The literal text of a secret reference found in a line, delimiters included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract every secret reference in `line`, left to right.
///
/// Returns an empty vector when the line holds no reference.
pub fn extract_tokens(line: &str) -> Vec<Token> {
    TOKEN_RE
        .find_iter(line)
        .map(|m| Token::new(m.as_str()))
        .collect()
}

/// Extract every secret reference in a line that is not valid UTF-8.
///
/// The text around a reference may hold any bytes, but the reference itself
/// must be UTF-8.
pub fn extract_tokens_from_bytes(line: &[u8]) -> Result<Vec<Token>, InterpolateError> {
    TOKEN_BYTES_RE
        .find_iter(line)
        .map(|m| match std::str::from_utf8(m.as_bytes()) {
            Ok(text) => Ok(Token::new(text)),
            Err(_) => Err(InterpolateError::InvalidEncoding {
                token: String::from_utf8_lossy(m.as_bytes()).into_owned(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_single_token() {
        let tokens = extract_tokens("key: (( path/to/secret ))");
        assert_eq!(tokens, vec![Token::new("(( path/to/secret ))")]);
    }

    #[test]
    fn test_extract_token_with_key() {
        let tokens = extract_tokens("password: \"(( secret/db:password ))\"");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_str(), "(( secret/db:password ))");
    }

    #[test]
    fn test_no_tokens() {
        assert!(extract_tokens("plain: value").is_empty());
        assert!(extract_tokens("").is_empty());
    }

    #[test]
    fn test_body_requires_slash() {
        assert!(extract_tokens("key: (( secret ))").is_empty());
    }

    #[test]
    fn test_delimiters_require_spaces() {
        assert!(extract_tokens("key: ((path/to/secret ))").is_empty());
        assert!(extract_tokens("key: (( path/to/secret))").is_empty());
    }

    #[test]
    fn test_extra_whitespace_kept_in_token() {
        let tokens = extract_tokens("key: ((   path/to/secret   ))");
        assert_eq!(tokens[0].as_str(), "((   path/to/secret   ))");
    }

    #[test]
    fn test_greedy_match_spans_multiple_references() {
        let line = "url: (( a/b:user ))@(( a/b:host ))";
        let tokens = extract_tokens(line);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_str(), "(( a/b:user ))@(( a/b:host ))");
    }

    #[test]
    fn test_extract_from_bytes_around_latin1() {
        let tokens = extract_tokens_from_bytes(b"caf\xe9: (( secret/api )) # \xff").unwrap();
        assert_eq!(tokens, vec![Token::new("(( secret/api ))")]);
        assert!(extract_tokens_from_bytes(b"caf\xe9: plain").unwrap().is_empty());
    }

    #[test]
    fn test_extract_from_bytes_rejects_non_utf8_reference() {
        let err = extract_tokens_from_bytes(b"k: (( secret/caf\xe9 ))").unwrap_err();
        assert!(matches!(err, InterpolateError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_token_display() {
        let token = Token::new("(( a/b ))");
        assert_eq!(token.to_string(), "(( a/b ))");
        assert_eq!(token.as_ref(), "(( a/b ))");
    }
}
