//! # Git Module
//!
//! This module locates the git working tree a root directory belongs to and
//! supplies the paths that must never be rewritten because they belong to
//! the VCS itself.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{ErrorCode, Repository};
use tracing::debug;

/// The working tree and metadata directory of a discovered repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
  /// Root of the working tree
  pub work_tree: PathBuf,
  /// The `.git` metadata directory (or the gitdir a `.git` file points to)
  pub git_dir: PathBuf,
}

impl RepoPaths {
  /// The repository's top-level `.gitignore`.
  pub fn gitignore(&self) -> PathBuf {
    self.work_tree.join(".gitignore")
  }
}

/// Finds the repository containing `dir`.
///
/// Returns `Ok(None)` when `dir` is not inside a git working tree, including
/// bare repositories, which have none.
///
/// # Errors
///
/// Returns an error if a repository exists but cannot be opened.
pub fn discover(dir: &Path) -> Result<Option<RepoPaths>> {
  let repo = match Repository::discover(dir) {
    Ok(repo) => repo,
    Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
    Err(e) => {
      return Err(e).with_context(|| format!("Failed to open git repository at {}", dir.display()));
    }
  };

  let Some(work_tree) = repo.workdir() else {
    debug!("Ignoring bare repository at {}", repo.path().display());
    return Ok(None);
  };

  Ok(Some(RepoPaths {
    work_tree: clean(work_tree),
    git_dir: clean(repo.path()),
  }))
}

/// Paths the VCS owns for the repository containing `root`: the metadata
/// directory and the top-level `.gitignore`. Empty outside a working tree.
pub fn vcs_exclusions(root: &Path) -> Result<Vec<PathBuf>> {
  let Some(paths) = discover(root)? else {
    return Ok(Vec::new());
  };
  debug!("Found git working tree at {}", paths.work_tree.display());
  Ok(vec![paths.gitignore(), paths.git_dir])
}

/// libgit2 reports directories with a trailing separator.
fn clean(path: &Path) -> PathBuf {
  path.components().collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_discover_outside_repository() {
    let dir = tempfile::tempdir().unwrap();
    // The temp dir itself may live inside a repository on some machines.
    if Repository::discover(dir.path()).is_err() {
      assert_eq!(discover(dir.path()).unwrap(), None);
      assert!(vcs_exclusions(dir.path()).unwrap().is_empty());
    }
  }

  #[test]
  fn test_discover_from_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    Repository::init(&root).unwrap();
    let nested = root.join("src/pkg");
    std::fs::create_dir_all(&nested).unwrap();

    let paths = discover(&nested).unwrap().unwrap();
    assert_eq!(paths.work_tree, root);
    assert_eq!(paths.git_dir, root.join(".git"));
    assert_eq!(
      vcs_exclusions(&nested).unwrap(),
      vec![root.join(".gitignore"), root.join(".git")]
    );
  }

  #[test]
  fn test_bare_repository_has_no_work_tree() {
    let dir = tempfile::tempdir().unwrap();
    Repository::init_bare(dir.path()).unwrap();
    assert_eq!(discover(dir.path()).unwrap(), None);
  }
}
