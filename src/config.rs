//! # Configuration Module
//!
//! This module provides configuration support for autocopyright. Every
//! command-line option can also be given in a TOML file, so a project can
//! keep its header settings next to its sources.
//!
//! Configuration can be specified in a `.autocopyright.toml` file, via the
//! `AUTOCOPYRIGHT_CONFIG` environment variable or with `--config`. Values
//! given on the command line take precedence.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::processor::MatchMode;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".autocopyright.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "AUTOCOPYRIGHT_CONFIG";

/// Manifest read for template variables when none is given.
pub const DEFAULT_MANIFEST: &str = "pyproject.toml";

/// Pool size used when none is given; runs sequentially.
pub const DEFAULT_POOL_SIZE: usize = 1;

/// Options as read from a config file or collected from the command line.
///
/// All keys are optional; [`Settings::from_config`] decides which ones are
/// required once every source has been merged.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
  /// Comment prefix put in front of every header line
  pub comment_symbol: Option<String>,

  /// Root directories to scan
  #[serde(default)]
  pub directories: Vec<PathBuf>,

  /// Glob patterns selecting files under each root
  #[serde(default)]
  pub globs: Vec<String>,

  /// Header template
  pub license: Option<PathBuf>,

  /// Files or directories that are never touched
  #[serde(default)]
  pub exclude: Vec<PathBuf>,

  /// Exclude regexes, with `{cwd}` and `{directory}` placeholders
  #[serde(default)]
  pub exclude_patterns: Vec<String>,

  /// Worker pool size; 1 runs sequentially
  pub pool: Option<usize>,

  /// Project manifest exposed to the template
  pub manifest: Option<PathBuf>,

  /// Header detection policy
  pub match_mode: Option<MatchMode>,
}

impl Config {
  /// Load configuration from a file.
  ///
  /// Relative paths in the file are resolved against the directory that
  /// contains it.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or is not valid
  /// configuration TOML.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    info!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.resolve_paths(base))
  }

  fn resolve_paths(self, base: &Path) -> Self {
    let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
    Self {
      directories: self.directories.into_iter().map(resolve).collect(),
      license: self.license.map(resolve),
      exclude: self.exclude.into_iter().map(resolve).collect(),
      manifest: self.manifest.map(resolve),
      ..self
    }
  }

  /// Layers `overrides` on top of `self`.
  ///
  /// Scalars from `overrides` win when set; a non-empty list from
  /// `overrides` replaces the list in `self`.
  pub fn merge(self, overrides: Self) -> Self {
    fn list<T>(base: Vec<T>, over: Vec<T>) -> Vec<T> {
      if over.is_empty() { base } else { over }
    }

    Self {
      comment_symbol: overrides.comment_symbol.or(self.comment_symbol),
      directories: list(self.directories, overrides.directories),
      globs: list(self.globs, overrides.globs),
      license: overrides.license.or(self.license),
      exclude: list(self.exclude, overrides.exclude),
      exclude_patterns: list(self.exclude_patterns, overrides.exclude_patterns),
      pool: overrides.pool.or(self.pool),
      manifest: overrides.manifest.or(self.manifest),
      match_mode: overrides.match_mode.or(self.match_mode),
    }
  }
}

/// Fully resolved options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub comment_symbol: String,
  pub directories: Vec<PathBuf>,
  pub globs: Vec<String>,
  pub license: PathBuf,
  pub exclude: Vec<PathBuf>,
  pub exclude_patterns: Vec<String>,
  pub pool: usize,
  pub manifest: PathBuf,
  pub match_mode: MatchMode,
}

impl Settings {
  /// Checks that every required option is present and fills in defaults.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::MissingOption`] naming the first missing option.
  pub fn from_config(config: Config) -> Result<Self, ConfigError> {
    let comment_symbol = config
      .comment_symbol
      .ok_or(ConfigError::MissingOption("--comment-symbol"))?;
    if config.directories.is_empty() {
      return Err(ConfigError::MissingOption("--directory"));
    }
    if config.globs.is_empty() {
      return Err(ConfigError::MissingOption("--glob"));
    }
    let license = config.license.ok_or(ConfigError::MissingOption("--license"))?;

    Ok(Self {
      comment_symbol,
      directories: config.directories,
      globs: config.globs,
      license,
      exclude: config.exclude,
      exclude_patterns: config.exclude_patterns,
      pool: config.pool.unwrap_or(DEFAULT_POOL_SIZE),
      manifest: config.manifest.unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST)),
      match_mode: config.match_mode.unwrap_or_default(),
    })
  }
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `AUTOCOPYRIGHT_CONFIG` environment variable
/// 3. `.autocopyright.toml` in the current directory
///
/// An explicit path is returned even if it does not exist, so loading it
/// reports the problem.
pub fn discover_config_path(explicit_path: Option<&Path>, current_dir: &Path) -> Option<PathBuf> {
  if let Some(path) = explicit_path {
    debug!("Using explicit config path: {}", path.display());
    return Some(path.to_path_buf());
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
    let path = PathBuf::from(&env_path);
    if path.exists() {
      debug!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    warn!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  let local_config = current_dir.join(DEFAULT_CONFIG_FILENAME);
  if local_config.exists() {
    debug!("Using config: {}", local_config.display());
    return Some(local_config);
  }

  debug!("No config file found");
  None
}

/// Load the configuration file, if any.
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `current_dir` - Directory searched for the default config file
/// * `no_config` - If true, skip config file discovery entirely
///
/// # Errors
///
/// Returns an error if a discovered file cannot be read or parsed.
pub fn load_config(
  explicit_path: Option<&Path>,
  current_dir: &Path,
  no_config: bool,
) -> Result<Option<Config>, ConfigError> {
  if no_config {
    debug!("Config file discovery disabled (--no-config)");
    return Ok(None);
  }

  discover_config_path(explicit_path, current_dir)
    .map(|path| Config::load(&path))
    .transpose()
}
