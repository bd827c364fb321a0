//! # Path Matcher Module
//!
//! This module turns a root directory into the sequence of files a run
//! should look at. It provides:
//!
//! - [`GlobPatterns`]: the compiled glob set, matched against root-relative
//!   paths
//! - [`ExcludePatterns`]: exclude regexes with `{cwd}` and `{directory}`
//!   placeholders, compiled per root
//! - [`PathMatcher`]: the traversal itself, built on the `ignore` walker so
//!   VCS ignore rules are honored

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use regex::Regex;
use tracing::{debug, trace, warn};

use super::exclusion::ExclusionSet;
use super::file_io::FileIO;
use crate::error::ConfigError;

/// Name of the VCS metadata directory, never descended into.
const VCS_DIR: &str = ".git";

/// Compiled glob patterns.
///
/// `*` never crosses a `/`. A pattern that does not start with `**/` also
/// matches at any depth below the root, so `*.py` finds `pkg/mod.py`.
#[derive(Debug, Clone)]
pub struct GlobPatterns {
  set: GlobSet,
  patterns: Vec<String>,
}

impl GlobPatterns {
  /// Compiles `patterns`.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::InvalidGlob`] naming the first pattern that fails
  /// to compile.
  pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
      let trimmed = pattern.strip_prefix("./").unwrap_or(pattern);
      builder.add(compile_glob(trimmed, pattern)?);
      if !trimmed.starts_with("**/") {
        builder.add(compile_glob(&format!("**/{trimmed}"), pattern)?);
      }
    }

    let set = builder.build().map_err(|source| ConfigError::InvalidGlob {
      pattern: patterns.join(", "),
      source,
    })?;

    Ok(Self {
      set,
      patterns: patterns.to_vec(),
    })
  }

  /// Whether a root-relative path matches any pattern.
  pub fn is_match(&self, relative: &Path) -> bool {
    self.set.is_match(relative)
  }

  pub fn patterns(&self) -> &[String] {
    &self.patterns
  }
}

fn compile_glob(source: &str, original: &str) -> Result<globset::Glob, ConfigError> {
  GlobBuilder::new(source)
    .literal_separator(true)
    .build()
    .map_err(|source| ConfigError::InvalidGlob {
      pattern: original.to_string(),
      source,
    })
}

/// Exclude regexes as given by the user.
///
/// The placeholders `{cwd}` and `{directory}` are replaced with the current
/// working directory and the root being walked, so the patterns are compiled
/// once per root.
#[derive(Debug, Clone, Default)]
pub struct ExcludePatterns {
  sources: Vec<String>,
}

impl ExcludePatterns {
  pub const fn new(sources: Vec<String>) -> Self {
    Self { sources }
  }

  pub fn is_empty(&self) -> bool {
    self.sources.is_empty()
  }

  /// Substitutes placeholders and compiles every pattern, anchored at the
  /// start of the path.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::InvalidExcludePattern`] for the first pattern
  /// that does not compile.
  pub fn compile(&self, cwd: &Path, root: &Path) -> Result<Vec<Regex>, ConfigError> {
    let cwd = regex::escape(&slash_path(cwd));
    let directory = regex::escape(&slash_path(root));

    self
      .sources
      .iter()
      .map(|source| {
        let expanded = source.replace("{cwd}", &cwd).replace("{directory}", &directory);
        Regex::new(&format!("^(?:{expanded})")).map_err(|err| ConfigError::InvalidExcludePattern {
          pattern: source.clone(),
          source: err,
        })
      })
      .collect()
  }
}

/// The path as a string with `/` separators.
fn slash_path(path: &Path) -> String {
  let text = path.to_string_lossy();
  if std::path::MAIN_SEPARATOR == '/' {
    text.into_owned()
  } else {
    text.replace(std::path::MAIN_SEPARATOR, "/")
  }
}

/// A file selected by the globs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchedPath {
  /// The file should be processed
  Candidate(PathBuf),
  /// The file matched a glob but is excluded; it is never read
  Excluded(PathBuf),
}

impl MatchedPath {
  pub fn path(&self) -> &Path {
    match self {
      Self::Candidate(path) | Self::Excluded(path) => path,
    }
  }
}

impl AsRef<Path> for MatchedPath {
  fn as_ref(&self) -> &Path {
    self.path()
  }
}

/// Resolves one root directory into matching files.
///
/// Traversal order is deterministic (entries sorted by file name), symlinks
/// are neither followed nor yielded, excluded directories and `.git` are
/// pruned without being read.
#[derive(Debug, Clone)]
pub struct PathMatcher {
  root: PathBuf,
  globs: Arc<GlobPatterns>,
  exclusions: Arc<ExclusionSet>,
  exclude_regexes: Vec<Regex>,
}

impl PathMatcher {
  /// Creates a matcher for `root`, which should already be canonical.
  ///
  /// # Errors
  ///
  /// Fails if an exclude pattern does not compile once its placeholders are
  /// substituted.
  pub fn new(
    root: PathBuf,
    globs: Arc<GlobPatterns>,
    exclusions: Arc<ExclusionSet>,
    exclude_patterns: &ExcludePatterns,
    cwd: &Path,
  ) -> Result<Self, ConfigError> {
    let exclude_regexes = exclude_patterns.compile(cwd, &root)?;
    Ok(Self {
      root,
      globs,
      exclusions,
      exclude_regexes,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Lazily walks the root and yields every file matching a glob.
  pub fn walk(&self) -> impl Iterator<Item = MatchedPath> + '_ {
    debug!("Scanning directory: {}", self.root.display());

    let exclusions = Arc::clone(&self.exclusions);
    let walker = WalkBuilder::new(&self.root)
      .hidden(false)
      .ignore(false)
      .parents(true)
      .git_ignore(true)
      .git_exclude(true)
      .git_global(true)
      .follow_links(false)
      .sort_by_file_name(|a, b| a.cmp(b))
      .filter_entry(move |entry| !is_pruned(entry, &exclusions))
      .build();

    walker.filter_map(move |entry| match entry {
      Ok(entry) => self.classify(&entry),
      Err(err) => {
        warn!("Skipping unreadable entry: {err}");
        None
      }
    })
  }

  fn classify(&self, entry: &DirEntry) -> Option<MatchedPath> {
    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
      return None;
    }
    let path = entry.path();
    if entry.file_name() == VCS_DIR || FileIO::is_temp_file(path) {
      return None;
    }

    let relative = path.strip_prefix(&self.root).unwrap_or(path);
    if !self.globs.is_match(relative) {
      return None;
    }

    if self.exclusions.contains(path) || self.matches_exclude_regex(path) {
      trace!("Excluded: {}", path.display());
      return Some(MatchedPath::Excluded(path.to_path_buf()));
    }

    Some(MatchedPath::Candidate(path.to_path_buf()))
  }

  fn matches_exclude_regex(&self, path: &Path) -> bool {
    if self.exclude_regexes.is_empty() {
      return false;
    }
    let text = slash_path(path);
    self.exclude_regexes.iter().any(|re| re.is_match(&text))
  }
}

/// Directories that are never descended into.
fn is_pruned(entry: &DirEntry, exclusions: &ExclusionSet) -> bool {
  if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
    return false;
  }
  if entry.file_name() == VCS_DIR {
    return true;
  }
  let pruned = exclusions.contains(entry.path());
  if pruned {
    trace!("Pruned excluded directory: {}", entry.path().display());
  }
  pruned
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  fn globs(patterns: &[&str]) -> Arc<GlobPatterns> {
    let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
    Arc::new(GlobPatterns::new(&patterns).unwrap())
  }

  fn tree() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("pkg/sub")).unwrap();
    fs::create_dir_all(root.join("vendor")).unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join("a.py"), "").unwrap();
    fs::write(root.join("b.txt"), "").unwrap();
    fs::write(root.join("pkg/mod.py"), "").unwrap();
    fs::write(root.join("pkg/sub/deep.py"), "").unwrap();
    fs::write(root.join("vendor/lib.py"), "").unwrap();
    fs::write(root.join(".git/hook.py"), "").unwrap();
    (dir, root)
  }

  fn matcher(root: &Path, patterns: &[&str], exclusions: ExclusionSet, excludes: &[&str]) -> PathMatcher {
    let excludes = ExcludePatterns::new(excludes.iter().map(|p| p.to_string()).collect());
    PathMatcher::new(root.to_path_buf(), globs(patterns), Arc::new(exclusions), &excludes, root).unwrap()
  }

  fn relative(root: &Path, matches: &[MatchedPath]) -> Vec<String> {
    matches
      .iter()
      .map(|m| {
        let rel = m.path().strip_prefix(root).unwrap().to_string_lossy().into_owned();
        match m {
          MatchedPath::Candidate(_) => rel,
          MatchedPath::Excluded(_) => format!("excluded:{rel}"),
        }
      })
      .collect()
  }

  #[test]
  fn test_glob_matches_at_any_depth() {
    let set = globs(&["*.py"]);
    assert!(set.is_match(Path::new("a.py")));
    assert!(set.is_match(Path::new("pkg/sub/deep.py")));
    assert!(!set.is_match(Path::new("b.txt")));
  }

  #[test]
  fn test_glob_star_does_not_cross_separator() {
    let set = globs(&["pkg/*.py"]);
    assert!(set.is_match(Path::new("pkg/mod.py")));
    assert!(!set.is_match(Path::new("pkg/sub/deep.py")));
  }

  #[test]
  fn test_invalid_glob_is_config_error() {
    let err = GlobPatterns::new(&["src/[".to_string()]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidGlob { ref pattern, .. } if pattern == "src/["));
  }

  #[test]
  fn test_walk_is_sorted_and_skips_git() {
    let (_dir, root) = tree();
    let found: Vec<_> = matcher(&root, &["*.py"], ExclusionSet::new(), &[]).walk().collect();
    assert_eq!(
      relative(&root, &found),
      vec!["a.py", "pkg/mod.py", "pkg/sub/deep.py", "vendor/lib.py"]
    );
  }

  #[test]
  fn test_walk_prunes_excluded_directory_and_reports_excluded_file() {
    let (_dir, root) = tree();
    let mut exclusions = ExclusionSet::new();
    exclusions.insert(Path::new("vendor"), &root);
    exclusions.insert(Path::new("a.py"), &root);

    let found: Vec<_> = matcher(&root, &["*.py"], exclusions, &[]).walk().collect();
    assert_eq!(
      relative(&root, &found),
      vec!["excluded:a.py", "pkg/mod.py", "pkg/sub/deep.py"]
    );
  }

  #[test]
  fn test_exclude_pattern_with_directory_placeholder() {
    let (_dir, root) = tree();
    let found: Vec<_> = matcher(&root, &["*.py"], ExclusionSet::new(), &["{directory}/pkg/sub/.*"])
      .walk()
      .collect();
    assert_eq!(
      relative(&root, &found),
      vec!["a.py", "pkg/mod.py", "excluded:pkg/sub/deep.py", "vendor/lib.py"]
    );
  }

  #[test]
  fn test_exclude_pattern_is_anchored() {
    let excludes = ExcludePatterns::new(vec!["pkg/.*".to_string()]);
    let regexes = excludes.compile(Path::new("/work"), Path::new("/work/root")).unwrap();
    assert!(!regexes[0].is_match("/work/root/pkg/mod.py"));
  }

  #[test]
  fn test_invalid_exclude_pattern_is_config_error() {
    let excludes = ExcludePatterns::new(vec!["{cwd}/(".to_string()]);
    let err = excludes.compile(Path::new("/work"), Path::new("/work")).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidExcludePattern { ref pattern, .. } if pattern == "{cwd}/("));
  }

  #[test]
  fn test_walk_skips_rewriter_temp_files() {
    let (_dir, root) = tree();
    fs::write(root.join("pkg/.autocopyright-Ab12Cd.tmp"), "").unwrap();

    let found: Vec<_> = matcher(&root, &["*"], ExclusionSet::new(), &[]).walk().collect();
    assert_eq!(
      relative(&root, &found),
      vec!["a.py", "b.txt", "pkg/mod.py", "pkg/sub/deep.py", "vendor/lib.py"]
    );
  }

  #[cfg(unix)]
  #[test]
  fn test_walk_skips_symlinks() {
    let (_dir, root) = tree();
    std::os::unix::fs::symlink(root.join("a.py"), root.join("link.py")).unwrap();
    std::os::unix::fs::symlink(&root, root.join("pkg/loop")).unwrap();

    let found: Vec<_> = matcher(&root, &["*.py"], ExclusionSet::new(), &[]).walk().collect();
    assert_eq!(
      relative(&root, &found),
      vec!["a.py", "pkg/mod.py", "pkg/sub/deep.py", "vendor/lib.py"]
    );
  }
}
