//! # Processor Module
//!
//! This module contains the core functionality for selecting files and
//! inserting the header block into the ones that lack it.
//!
//! The module is organized into several submodules:
//! - [`path_matcher`] - Directory traversal, glob matching and exclusions
//! - [`exclusion`] - The set of paths a run must never touch
//! - [`detector`] - Deciding whether a file already carries the header
//! - [`preamble`] - Shebang and encoding-declaration handling
//! - [`file_io`] - File reading and atomic writing
//! - [`rewriter`] - The per-file detect-then-rewrite sequence
//! - [`dispatcher`] - Sequential or pooled execution of the per-file work
//!
//! The [`Processor`] struct is the main entry point, wiring the submodules
//! together for a run.

pub mod detector;
pub mod dispatcher;
pub mod exclusion;
pub mod file_io;
pub mod path_matcher;
pub mod preamble;
pub mod rewriter;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub use detector::{ExactBlockDetector, FuzzyBlockDetector, HeaderDetector, MatchMode};
pub use dispatcher::{Dispatcher, Parallelism};
pub use exclusion::ExclusionSet;
pub use file_io::{Candidate, FileIO, ReadOutcome};
pub use path_matcher::{ExcludePatterns, GlobPatterns, MatchedPath, PathMatcher};
pub use rewriter::FileRewriter;
use tracing::{debug, warn};

use crate::error::{ConfigError, DispatchError};
use crate::git;
use crate::header::HeaderSpec;
use crate::report::{Outcome, RunReport};

/// Configuration for creating a Processor instance.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
  pub header: HeaderSpec,
  pub roots: Vec<PathBuf>,
  pub globs: Vec<String>,

  // Exclusions
  pub exclude: Vec<PathBuf>,
  pub exclude_patterns: Vec<String>,
  /// The header template, which is never rewritten itself
  pub template_path: Option<PathBuf>,

  // Behavior
  pub pool_size: usize,
  pub match_mode: MatchMode,

  /// Base for relative paths and the `{cwd}` placeholder; the process
  /// working directory when unset
  pub current_dir: Option<PathBuf>,
}

impl ProcessorConfig {
  /// Creates a new ProcessorConfig with required fields and sensible defaults.
  ///
  /// Use struct update syntax to override specific fields:
  /// ```ignore
  /// ProcessorConfig {
  ///     pool_size: 4,
  ///     ..ProcessorConfig::new(header, roots, globs)
  /// }
  /// ```
  pub const fn new(header: HeaderSpec, roots: Vec<PathBuf>, globs: Vec<String>) -> Self {
    Self {
      header,
      roots,
      globs,
      exclude: Vec::new(),
      exclude_patterns: Vec::new(),
      template_path: None,
      pool_size: 1,
      match_mode: MatchMode::Exact,
      current_dir: None,
    }
  }
}

/// Processor for inserting header blocks across one or more roots.
///
/// The `Processor` is responsible for:
/// - Validating roots, globs and exclude patterns before any file is touched
/// - Seeding the exclusion set with the VCS paths and the template
/// - Walking every root and deduplicating matches across roots
/// - Dispatching the per-file work and collecting the outcomes
pub struct Processor {
  /// One matcher per canonical root, in the order given
  matchers: Vec<PathMatcher>,

  /// Paths that are never read or written
  exclusions: Arc<ExclusionSet>,

  /// Per-file detect-then-rewrite
  rewriter: FileRewriter,

  dispatcher: Dispatcher,
}

impl Processor {
  /// Creates a new processor with the specified configuration.
  ///
  /// # Errors
  ///
  /// Returns an error if:
  /// - A root does not exist, cannot be read, or is not a directory
  /// - Any glob or exclude pattern is invalid
  pub fn new(config: ProcessorConfig) -> Result<Self, ConfigError> {
    let current_dir = match config.current_dir {
      Some(dir) => dir,
      None => std::env::current_dir().map_err(|source| ConfigError::UnreadableRoot {
        path: PathBuf::from("."),
        source,
      })?,
    };

    let globs = Arc::new(GlobPatterns::new(&config.globs)?);
    let exclude_patterns = ExcludePatterns::new(config.exclude_patterns);

    let resolved = config
      .roots
      .iter()
      .map(|root| resolve_root(root, &current_dir))
      .collect::<Result<Vec<_>, _>>()?;
    let roots = outermost_roots(resolved);

    let mut exclusions = ExclusionSet::new();
    for path in &config.exclude {
      exclusions.insert(path, &current_dir);
    }
    if let Some(template) = &config.template_path {
      exclusions.insert(template, &current_dir);
    }
    for root in &roots {
      match git::vcs_exclusions(root) {
        Ok(paths) => exclusions.extend(paths),
        Err(e) => warn!("Continuing without VCS exclusions for {}: {:#}", root.display(), e),
      }
    }
    debug!("Exclusion set has {} entries", exclusions.len());
    let exclusions = Arc::new(exclusions);

    let matchers = roots
      .into_iter()
      .map(|root| {
        PathMatcher::new(
          root,
          Arc::clone(&globs),
          Arc::clone(&exclusions),
          &exclude_patterns,
          &current_dir,
        )
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      matchers,
      exclusions,
      rewriter: FileRewriter::new(Arc::new(config.header), config.match_mode.detector()),
      dispatcher: Dispatcher::new(Parallelism::from_pool_size(config.pool_size)),
    })
  }

  /// The canonical roots, in the order they are walked.
  pub fn roots(&self) -> impl Iterator<Item = &Path> {
    self.matchers.iter().map(PathMatcher::root)
  }

  pub fn exclusions(&self) -> &ExclusionSet {
    &self.exclusions
  }

  pub fn header(&self) -> &HeaderSpec {
    self.rewriter.header()
  }

  /// Lazily yields every matched file across all roots.
  ///
  /// Roots never overlap, so each path is yielded once and no directory is
  /// listed after workers have started writing into it.
  pub fn candidates(&self) -> impl Iterator<Item = MatchedPath> + '_ {
    self.matchers.iter().flat_map(|matcher| matcher.walk())
  }

  /// Processes one matched file.
  pub fn process_file(&self, matched: &MatchedPath) -> Outcome {
    match matched {
      MatchedPath::Excluded(_) => Outcome::SkippedExcluded,
      MatchedPath::Candidate(path) => self.rewriter.process(path),
    }
  }

  /// Processes every matched file and returns the per-file outcomes.
  ///
  /// # Errors
  ///
  /// Returns [`DispatchError`] if the worker pool cannot be started; no file
  /// has been touched in that case.
  pub fn run(&self) -> Result<RunReport, DispatchError> {
    let start = Instant::now();
    let files = self
      .dispatcher
      .run(self.candidates(), |matched| self.process_file(matched))?;
    let report = RunReport::new(files, start.elapsed());
    debug!(
      "Processed {} files in {}ms",
      report.tally.total(),
      report.elapsed_ms
    );
    Ok(report)
  }
}

/// Drops duplicate roots and roots nested inside another root, keeping the
/// first-given order of the rest.
fn outermost_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
  let mut kept: Vec<PathBuf> = Vec::with_capacity(roots.len());
  for root in &roots {
    if let Some(outer) = roots.iter().find(|other| *other != root && root.starts_with(other)) {
      debug!("Root {} is inside {}; walking it once", root.display(), outer.display());
      continue;
    }
    if !kept.contains(root) {
      kept.push(root.clone());
    }
  }
  kept
}

/// Absolute, canonical form of a root, checked to be a readable directory.
fn resolve_root(root: &Path, current_dir: &Path) -> Result<PathBuf, ConfigError> {
  let absolute = if root.is_absolute() {
    root.to_path_buf()
  } else {
    current_dir.join(root)
  };

  let metadata = std::fs::metadata(&absolute).map_err(|source| ConfigError::UnreadableRoot {
    path: root.to_path_buf(),
    source,
  })?;
  if !metadata.is_dir() {
    return Err(ConfigError::RootNotDirectory {
      path: root.to_path_buf(),
    });
  }

  std::fs::read_dir(&absolute).map_err(|source| ConfigError::UnreadableRoot {
    path: root.to_path_buf(),
    source,
  })?;

  absolute.canonicalize().map_err(|source| ConfigError::UnreadableRoot {
    path: root.to_path_buf(),
    source,
  })
}
