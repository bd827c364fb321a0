//! # Error Module
//!
//! Error types shared across the crate, grouped by how the run reacts to
//! them:
//!
//! - [`ConfigError`] aborts the run before any file is touched.
//! - [`CandidateError`] is scoped to one file and becomes an
//!   [`Outcome::Error`](crate::report::Outcome::Error) for it.
//! - [`DispatchError`] means the worker pool itself could not run.

use std::io;
use std::path::PathBuf;

/// Fatal configuration problems detected before dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// A required option was given neither on the command line nor in the
  /// config file.
  #[error("Missing required option: {0}")]
  MissingOption(&'static str),

  /// A glob pattern failed to compile.
  #[error("Invalid glob pattern '{pattern}': {source}")]
  InvalidGlob { pattern: String, source: globset::Error },

  /// An exclude regex failed to compile.
  #[error("Invalid exclude pattern '{pattern}': {source}")]
  InvalidExcludePattern { pattern: String, source: regex::Error },

  /// The header template could not be read.
  #[error("Failed to read license template '{}': {source}", path.display())]
  TemplateUnreadable { path: PathBuf, source: io::Error },

  /// A root directory does not exist or cannot be listed.
  #[error("Root directory '{}' is not readable: {source}", path.display())]
  UnreadableRoot { path: PathBuf, source: io::Error },

  /// A root exists but is not a directory.
  #[error("Root '{}' is not a directory", path.display())]
  RootNotDirectory { path: PathBuf },

  /// The config file could not be read.
  #[error("Failed to read config file '{}': {source}", path.display())]
  ReadError { path: PathBuf, source: io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{}': {source}", path.display())]
  ParseError { path: PathBuf, source: toml::de::Error },

  /// The project manifest could not be read.
  #[error("Failed to read manifest '{}': {source}", path.display())]
  ManifestUnreadable { path: PathBuf, source: io::Error },

  /// The project manifest contains invalid TOML.
  #[error("Failed to parse manifest '{}': {source}", path.display())]
  ManifestInvalid { path: PathBuf, source: toml::de::Error },
}

/// Per-file failures. These never abort the run.
#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
  /// The path stopped being a regular file between matching and rewriting.
  #[error("not a regular file")]
  NotAFile,

  /// The file was removed between matching and rewriting.
  #[error("file disappeared before it could be processed")]
  Vanished,

  #[error("permission denied: {0}")]
  PermissionDenied(#[source] io::Error),

  #[error("failed to read file: {0}")]
  Read(#[source] io::Error),

  /// The temporary sibling file could not be created or written.
  #[error("failed to write temporary file: {0}")]
  TempWrite(#[source] io::Error),

  /// The temporary file could not be renamed over the original.
  #[error("failed to replace original file: {0}")]
  Persist(#[source] io::Error),

  /// The unit of work panicked; the payload message is kept.
  #[error("worker panicked: {0}")]
  Panicked(String),
}

impl CandidateError {
  /// Classifies an I/O error raised while reading or inspecting a candidate.
  pub fn from_read(err: io::Error) -> Self {
    match err.kind() {
      io::ErrorKind::NotFound => Self::Vanished,
      io::ErrorKind::PermissionDenied => Self::PermissionDenied(err),
      io::ErrorKind::IsADirectory => Self::NotAFile,
      _ => Self::Read(err),
    }
  }
}

/// Failures of the dispatcher itself.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
  #[error("Failed to start worker pool with {threads} threads: {source}")]
  PoolStart {
    threads: usize,
    source: rayon::ThreadPoolBuildError,
  },
}
