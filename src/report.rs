//! # Report Module
//!
//! This module records what happened to every candidate of a run and
//! aggregates the per-file results into a [`Tally`] that decides the process
//! exit status.
//!
//! It can also serialize the full run as JSON for tooling that wants more
//! than the exit code.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Terminal classification of processing one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum Outcome {
  /// The header was inserted and the file replaced
  Modified,
  /// An equivalent header was already at the top of the file
  SkippedAlreadyPresent,
  /// The file matched a glob but also an exclusion
  SkippedExcluded,
  /// The file is binary or not valid UTF-8
  SkippedNonText,
  /// Processing failed; the file is unchanged
  Error(String),
}

impl Outcome {
  pub const fn is_error(&self) -> bool {
    matches!(self, Self::Error(_))
  }

  pub const fn is_skipped(&self) -> bool {
    matches!(
      self,
      Self::SkippedAlreadyPresent | Self::SkippedExcluded | Self::SkippedNonText
    )
  }
}

/// Outcome of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
  /// Path to the file
  #[serde(with = "path_serialization")]
  pub path: PathBuf,
  /// What happened to it
  pub outcome: Outcome,
}

/// Helper module for serializing/deserializing PathBuf
mod path_serialization {
  use std::path::PathBuf;

  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(path: &std::path::Path, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&path.to_string_lossy())
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    Ok(PathBuf::from(s))
  }
}

/// Counts of outcomes across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
  pub modified: usize,
  pub already_present: usize,
  pub excluded: usize,
  pub non_text: usize,
  pub errors: usize,
}

impl Tally {
  /// Counts one outcome.
  pub const fn record(&mut self, outcome: &Outcome) {
    match outcome {
      Outcome::Modified => self.modified += 1,
      Outcome::SkippedAlreadyPresent => self.already_present += 1,
      Outcome::SkippedExcluded => self.excluded += 1,
      Outcome::SkippedNonText => self.non_text += 1,
      Outcome::Error(_) => self.errors += 1,
    }
  }

  pub fn from_reports(reports: &[FileReport]) -> Self {
    let mut tally = Self::default();
    for report in reports {
      tally.record(&report.outcome);
    }
    tally
  }

  pub const fn skipped(&self) -> usize {
    self.already_present + self.excluded + self.non_text
  }

  pub const fn total(&self) -> usize {
    self.modified + self.skipped() + self.errors
  }

  pub const fn has_errors(&self) -> bool {
    self.errors > 0
  }

  /// Process exit status: non-zero iff any candidate failed.
  pub const fn exit_code(&self) -> u8 {
    if self.has_errors() { 1 } else { 0 }
  }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
  pub files: Vec<FileReport>,
  pub tally: Tally,
  /// Wall-clock processing time in milliseconds
  pub elapsed_ms: u128,
}

impl RunReport {
  /// Builds a report, sorting files by path so output is stable regardless
  /// of completion order.
  pub fn new(mut files: Vec<FileReport>, elapsed: Duration) -> Self {
    files.sort_by(|a, b| a.path.cmp(&b.path));
    let tally = Tally::from_reports(&files);
    Self {
      files,
      tally,
      elapsed_ms: elapsed.as_millis(),
    }
  }

  /// Files with the given outcome predicate, in path order.
  pub fn files_where(&self, predicate: impl Fn(&Outcome) -> bool) -> Vec<&FileReport> {
    self.files.iter().filter(|f| predicate(&f.outcome)).collect()
  }

  pub const fn exit_code(&self) -> u8 {
    self.tally.exit_code()
  }
}

#[derive(Serialize)]
struct JsonReport<'a> {
  generated_at: String,
  #[serde(flatten)]
  run: &'a RunReport,
}

/// Writes the run as pretty-printed JSON.
pub fn write_json_report(path: &Path, report: &RunReport) -> Result<()> {
  let document = JsonReport {
    generated_at: Local::now().to_rfc3339(),
    run: report,
  };
  let json = serde_json::to_string_pretty(&document).with_context(|| "Failed to serialize report")?;
  fs::write(path, json).with_context(|| format!("Failed to write report: {}", path.display()))
}
