use std::path::PathBuf;

use clap::Parser;

/// Interpolate Vault secrets into files.
///
/// Every `(( path/to/secret ))` or `(( path/to/secret:key ))` reference is
/// replaced by the value stored in Vault. Without a key, `value` is read.
#[derive(Parser, Debug)]
#[command(name = "vault-interpolate", version, about)]
pub struct Cli {
    /// Overwrite input files
    #[arg(short = 'i', long = "inplace")]
    pub in_place: bool,

    /// Suppress output (useful when writing files in place)
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Fail when a referenced key is missing instead of substituting an empty value
    #[arg(long)]
    pub strict: bool,

    /// Path to a config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// List of files to run against
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,
}
