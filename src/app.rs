//! File-processing driver.
//!
//! Every input file is rendered in memory first. Files are only rewritten and
//! output is only printed once all of them rendered successfully, so a failed
//! secret fetch leaves every input untouched. Files are handled as bytes; a
//! line that is not valid UTF-8 is passed through unchanged.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::app_deps::{RealVaultBackendFactory, SecretBackendFactory};
use crate::cli::Cli;
use crate::config::{Config, VaultConfig};
use crate::errors::AppError;
use crate::paths;
use crate::resolver::{MissingKeyPolicy, Resolver};

/// What to process and where the results go.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub files: Vec<PathBuf>,
    pub in_place: bool,
    pub quiet: bool,
    pub missing_keys: MissingKeyPolicy,
}

impl RunOptions {
    /// Combine command-line flags with config file settings. `--strict` only
    /// ever tightens the configured policy.
    pub fn from_cli(cli: &Cli, config: &Config) -> Self {
        let missing_keys = if cli.strict {
            MissingKeyPolicy::Error
        } else {
            config.interpolation.missing_key_policy()
        };

        Self {
            files: cli.files.clone(),
            in_place: cli.in_place,
            quiet: cli.quiet,
            missing_keys,
        }
    }
}

/// A file with all of its references substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub lines: Vec<Vec<u8>>,
    /// Lines that held at least one reference.
    pub substituted_lines: usize,
}

impl RenderedFile {
    /// File contents, each line terminated by `\n`.
    pub fn contents(&self) -> Vec<u8> {
        let mut contents = Vec::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            contents.extend_from_slice(line);
            contents.push(b'\n');
        }
        contents
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub lines: usize,
    pub substituted_lines: usize,
    pub secrets_fetched: usize,
}

pub struct App;

impl App {
    pub async fn run(cli: Cli) -> Result<RunSummary> {
        if let Some(env_file) = paths::load_env_file() {
            debug!(path = %env_file.display(), "loaded .env file");
        }

        let config = Config::load(cli.config.as_deref())?;
        let vault_config = config
            .vault_config()
            .context("Invalid Vault configuration")?;
        let options = RunOptions::from_cli(&cli, &config);

        debug!(files = ?options.files, "interpolating files");

        let stdout = io::stdout();
        let mut out = stdout.lock();
        Self::run_with_deps(&RealVaultBackendFactory, vault_config, &options, &mut out).await
    }

    pub async fn run_with_deps(
        factory: &dyn SecretBackendFactory,
        vault_config: VaultConfig,
        options: &RunOptions,
        out: &mut dyn Write,
    ) -> Result<RunSummary> {
        let address = vault_config.address.clone();
        let backend = factory
            .create(vault_config)
            .await
            .context("Failed to initialize Vault client")?;

        if !backend.is_authenticated().await {
            return Err(AppError::Unauthenticated { address }.into());
        }

        let mut resolver =
            Resolver::new(backend.as_ref()).with_missing_key_policy(options.missing_keys);

        let mut rendered = Vec::with_capacity(options.files.len());
        for path in &options.files {
            rendered.push(Self::render_file(&mut resolver, path).await?);
        }

        let mut summary = RunSummary {
            files: rendered.len(),
            secrets_fetched: resolver.fetches(),
            ..Default::default()
        };

        if options.in_place {
            Self::write_all_in_place(&rendered)?;
        }

        for file in &rendered {
            if !options.quiet {
                out.write_all(&file.contents()).context("Failed to write output")?;
            }
            summary.lines += file.lines.len();
            summary.substituted_lines += file.substituted_lines;
        }
        out.flush().context("Failed to flush output")?;

        debug!(
            files = summary.files,
            substituted_lines = summary.substituted_lines,
            secrets_fetched = summary.secrets_fetched,
            cache_hits = resolver.cache().hits(),
            "interpolation finished"
        );

        Ok(summary)
    }

    /// Read and render a single file.
    pub async fn render_file(resolver: &mut Resolver<'_>, path: &Path) -> Result<RenderedFile> {
        let data =
            fs::read(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        let (lines, substituted_lines) = Self::render_bytes(resolver, &data)
            .await
            .with_context(|| format!("Failed to interpolate values in {}", path.display()))?;

        Ok(RenderedFile {
            path: path.to_path_buf(),
            lines,
            substituted_lines,
        })
    }

    /// Render file contents line by line. Returns the output lines and how
    /// many of them held a reference.
    pub async fn render_bytes(
        resolver: &mut Resolver<'_>,
        data: &[u8],
    ) -> Result<(Vec<Vec<u8>>, usize)> {
        let mut output = Vec::new();
        let mut substituted = 0;

        for (idx, line) in split_lines(data).enumerate() {
            let rendered = resolver
                .interpolate_bytes(line)
                .await
                .with_context(|| format!("line {}", idx + 1))?;
            match rendered {
                Cow::Borrowed(line) => output.push(line.to_vec()),
                Cow::Owned(line) => {
                    debug!(line = idx + 1, "substituted secret references");
                    output.push(line);
                    substituted += 1;
                }
            }
        }

        Ok((output, substituted))
    }

    /// Replace the contents of every rendered file, keeping permissions.
    ///
    /// Symlinks are written through to the file they point at. All temp files
    /// are written before the first rename, so a file that cannot be staged
    /// leaves every input unchanged.
    pub fn write_all_in_place(files: &[RenderedFile]) -> Result<()> {
        let mut staged = Vec::with_capacity(files.len());
        if let Err(err) = stage_all(files, &mut staged) {
            staged.iter().for_each(StagedWrite::discard);
            return Err(err);
        }

        let mut pending = staged.iter();
        while let Some(write) = pending.next() {
            if let Err(err) = write.commit() {
                pending.for_each(StagedWrite::discard);
                return Err(err);
            }
            info!(path = %write.target.display(), "wrote interpolated file");
        }

        Ok(())
    }
}

/// Split on `\n`, dropping a trailing `\r`, the way `str::lines` does.
fn split_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = data.strip_suffix(b"\n").unwrap_or(data);
    (!data.is_empty())
        .then(|| body.split(|&b| b == b'\n'))
        .into_iter()
        .flatten()
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

fn stage_all(files: &[RenderedFile], staged: &mut Vec<StagedWrite>) -> Result<()> {
    for file in files {
        let target = fs::canonicalize(&file.path)
            .with_context(|| format!("Failed to resolve {}", file.path.display()))?;
        if staged.iter().any(|write| write.target == target) {
            continue;
        }
        staged.push(StagedWrite::stage(&file.contents(), target)?);
    }
    Ok(())
}

/// New contents written to a temp file next to the file they replace.
struct StagedWrite {
    tmp: PathBuf,
    target: PathBuf,
}

impl StagedWrite {
    fn stage(contents: &[u8], target: PathBuf) -> Result<Self> {
        let (Some(parent), Some(file_name)) = (target.parent(), target.file_name()) else {
            anyhow::bail!("Not a file path: {}", target.display());
        };
        let tmp = parent.join(format!(".{}.interpolate.tmp", file_name.to_string_lossy()));

        let permissions = fs::metadata(&target)
            .with_context(|| format!("Failed to stat {}", target.display()))?
            .permissions();

        let written = fs::write(&tmp, contents).and_then(|_| fs::set_permissions(&tmp, permissions));
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err).with_context(|| format!("Failed to write file {}", target.display()));
        }

        Ok(Self { tmp, target })
    }

    fn commit(&self) -> Result<()> {
        fs::rename(&self.tmp, &self.target).or_else(|err| {
            self.discard();
            Err(err).with_context(|| format!("Failed to write file {}", self.target.display()))
        })
    }

    fn discard(&self) {
        let _ = fs::remove_file(&self.tmp);
    }
}
