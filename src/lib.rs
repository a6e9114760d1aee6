//! # Vault Interpolate
//!
//! Interpolates HashiCorp Vault secrets into text files.
//!
//! Files are scanned line by line for references of the form
//! `(( path/to/secret ))` or `(( path/to/secret:key ))`. Each reference is
//! replaced by the named key of the secret stored at that path (`value` when
//! no key is given), and everything else in the line is kept verbatim.
//!
//! ## Modules
//!
//! - [`tokenizer`] - Finding references in a line
//! - [`reference`] - Splitting a reference into path and key
//! - [`resolver`] - Resolving references and substituting them into lines
//! - [`cache`] - Per-run cache of resolved references
//! - [`app_deps`] - Secret backend abstraction
//! - [`vault`] - HashiCorp Vault client
//! - [`app`] - File-processing driver
//! - [`cli`] - Command-line arguments
//! - [`logging`] - Log subscriber setup
//! - [`config`] - Configuration file parsing and environment overrides
//! - [`paths`] - XDG-compliant path resolution
//! - [`validation`] - Connection settings validation
//! - [`error`] - Error formatting utilities
//! - [`errors`] - Structured error types
//! - [`constants`] - Application constants

pub mod app;
pub mod app_deps;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod errors;
pub mod logging;
pub mod paths;
pub mod reference;
pub mod resolver;
pub mod tokenizer;
pub mod validation;
pub mod vault;
