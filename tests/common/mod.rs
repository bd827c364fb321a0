#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use autocopyright::header::HeaderSpec;
use autocopyright::processor::ProcessorConfig;

/// Header body used across the integration tests.
pub const HEADER_BODY: &str = "License line 1\nLicense line 2";

/// `HEADER_BODY` as it appears in a file with the `#` prefix.
pub const HEADER_BLOCK: &str = "# License line 1\n# License line 2\n\n";

/// Checks if git is available on the system.
pub fn is_git_available() -> bool {
  Command::new("git").arg("--version").status().is_ok()
}

/// Runs a git command in the given directory, returning an error with stderr on
/// failure.
pub fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
  let output = Command::new("git")
    .args(args)
    .current_dir(dir)
    .output()
    .with_context(|| format!("Failed to execute git {:?}", args))?;

  if !output.status.success() {
    anyhow::bail!("git {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
  }
  Ok(())
}

/// Initializes a git repository in the given directory with deterministic
/// settings.
///
/// Configures:
/// - Default branch name set to `main`
/// - User name and email for commits
/// - Disables commit signing for test isolation
pub fn init_git_repo(dir: &Path) -> Result<()> {
  run_git(dir, &["init"])?;
  run_git(dir, &["config", "init.defaultBranch", "main"])?;
  run_git(dir, &["branch", "-M", "main"])?;
  run_git(dir, &["config", "user.name", "Test User"])?;
  run_git(dir, &["config", "user.email", "test@example.com"])?;
  // Disable commit signing for test isolation
  run_git(dir, &["config", "commit.gpgsign", "false"])?;
  Ok(())
}

/// Stages a file and creates a commit.
pub fn git_add_and_commit(dir: &Path, file: &str, message: &str) -> Result<()> {
  run_git(dir, &["add", file])?;
  run_git(dir, &["commit", "-m", message])
}

/// Writes `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(path)
}

/// Processor config rooted at `root`, matching `*.py` with the test header.
pub fn python_config(root: &Path) -> ProcessorConfig {
  ProcessorConfig {
    current_dir: Some(root.to_path_buf()),
    ..ProcessorConfig::new(
      HeaderSpec::new("#", HEADER_BODY),
      vec![root.to_path_buf()],
      vec!["*.py".to_string()],
    )
  }
}

/// Snapshot of every regular file under `root` (relative path, content).
pub fn snapshot(root: &Path) -> Result<Vec<(PathBuf, Vec<u8>)>> {
  let mut files = Vec::new();
  let mut stack = vec![root.to_path_buf()];
  while let Some(dir) = stack.pop() {
    for entry in fs::read_dir(&dir)? {
      let entry = entry?;
      let path = entry.path();
      if entry.file_type()?.is_dir() {
        stack.push(path);
      } else {
        let relative = path.strip_prefix(root)?.to_path_buf();
        files.push((relative, fs::read(&path)?));
      }
    }
  }
  files.sort();
  Ok(files)
}
