//! # Exclusion Module
//!
//! The [`ExclusionSet`] holds the absolute paths that must never be visited.
//! It is built once before dispatch and only read afterwards.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Normalized absolute paths (files or directories) excluded from a run.
///
/// A path is excluded when it equals an entry or lies beneath one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
  paths: BTreeSet<PathBuf>,
}

impl ExclusionSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a path, resolving it against `base` when relative.
  pub fn insert(&mut self, path: &Path, base: &Path) {
    let absolute = if path.is_absolute() {
      path.to_path_buf()
    } else {
      base.join(path)
    };
    self.paths.insert(normalize(&absolute));
  }

  /// Whether `path` is an entry or lies under one.
  ///
  /// `path` must be absolute and already resolved (as the walker yields
  /// them under a canonical root); only lexical normalization is applied.
  pub fn contains(&self, path: &Path) -> bool {
    if self.paths.is_empty() {
      return false;
    }
    let path = lexical_normalize(path);
    path.ancestors().any(|p| self.paths.contains(p))
  }

  pub fn len(&self) -> usize {
    self.paths.len()
  }

  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Path> {
    self.paths.iter().map(PathBuf::as_path)
  }
}

impl<P: AsRef<Path>> Extend<P> for ExclusionSet {
  fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
    for path in iter {
      self.paths.insert(normalize(path.as_ref()));
    }
  }
}

/// Canonicalizes `path`, falling back to lexical normalization when the path
/// does not exist (yet).
pub fn normalize(path: &Path) -> PathBuf {
  if let Ok(canonical) = path.canonicalize() {
    return canonical;
  }
  lexical_normalize(path)
}

/// Removes `.` components and resolves `..` against the preceding component.
pub fn lexical_normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push(component.as_os_str());
        }
      }
      _ => normalized.push(component.as_os_str()),
    }
  }
  normalized
}
