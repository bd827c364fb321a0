//! # Output Module
//!
//! This module centralizes all user-facing output for autocopyright.
//! It provides consistent formatting, colors, and symbols for terminal output.
//!
//! ## Design Goals
//!
//! - **Informative**: Show what changed and what failed without requiring flags
//! - **Scannable**: Use formatting to make output easy to parse visually
//! - **Progressive**: More detail with `-v`, silence with `-q`
//! - **Scriptable**: Keep stdout predictable for piping/automation

use std::path::{Path, PathBuf};

use owo_colors::{OwoColorize, Stream};

use crate::logging::{is_quiet, is_verbose};
use crate::report::{FileReport, Outcome, RunReport, Tally};

/// Symbols used in output
pub mod symbols {
  /// Success
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Failure
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Skipped
  pub const SKIPPED: &str = "-";
  /// Header inserted
  pub const UPDATED: &str = "\u{21bb}"; // ↻
}

/// Maximum number of files to show in the default output before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

/// Print the initial "Scanning N roots..." message.
pub fn print_start_message(roots: &[PathBuf]) {
  if is_quiet() {
    return;
  }

  let roots_word = if roots.len() == 1 { "root" } else { "roots" };
  println!("Scanning {} {}...", roots.len(), roots_word);
}

/// Print a blank line for visual separation (respects quiet mode).
pub fn print_blank_line() {
  if !is_quiet() {
    println!();
  }
}

/// Print one line per file that received a header.
///
/// Shows up to `DEFAULT_FILE_LIST_LIMIT` files unless verbose mode is on.
pub fn print_modified_files(files: &[&FileReport], roots: &[PathBuf]) {
  if files.is_empty() || is_quiet() {
    return;
  }

  let count = files.len();
  println!(
    "{} Added header to {} {}:",
    symbols::UPDATED.if_supports_color(Stream::Stdout, |s| s.green()),
    count,
    if count == 1 { "file" } else { "files" }
  );

  let limit = if is_verbose() { count } else { DEFAULT_FILE_LIST_LIMIT };
  for file in files.iter().take(limit) {
    println!("  {}", display_path(&file.path, roots));
  }
  print_truncation(count, limit);
}

/// Print one line per file that failed, with the reason.
///
/// Errors are always shown in full, on stderr, even in quiet mode.
pub fn print_error_files(files: &[&FileReport], roots: &[PathBuf]) {
  if files.is_empty() {
    return;
  }

  let count = files.len();
  eprintln!(
    "{} {} {} could not be processed:",
    symbols::FAILURE.if_supports_color(Stream::Stderr, |s| s.red()),
    count,
    if count == 1 { "file" } else { "files" }
  );

  for file in files {
    let reason = match &file.outcome {
      Outcome::Error(reason) => reason.as_str(),
      _ => "",
    };
    eprintln!(
      "  {}: {}",
      display_path(&file.path, roots),
      reason.if_supports_color(Stream::Stderr, |s| s.red())
    );
  }
}

/// Print skipped files with their reason. Only shown in verbose mode.
pub fn print_skipped_files(files: &[&FileReport], roots: &[PathBuf]) {
  if files.is_empty() || !is_verbose() {
    return;
  }

  for file in files {
    let reason = match file.outcome {
      Outcome::SkippedAlreadyPresent => "header present",
      Outcome::SkippedExcluded => "excluded",
      Outcome::SkippedNonText => "not text",
      _ => continue,
    };
    println!(
      "  {} {} ({})",
      symbols::SKIPPED.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      display_path(&file.path, roots),
      reason.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
}

fn print_truncation(count: usize, limit: usize) {
  if count > limit {
    println!(
      "  {} (use -v to see all)",
      format!("... and {} more", count - limit).if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
}

/// Print the success message when nothing had to change.
pub fn print_all_files_ok() {
  if is_quiet() {
    return;
  }

  println!(
    "{} All files already have headers.",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green())
  );
}

/// Print the processing summary.
///
/// Format: "Summary: X modified, Y already present, Z skipped, W errors"
/// In verbose mode, also shows timing.
pub fn print_summary(report: &RunReport) {
  if is_quiet() {
    return;
  }

  let Tally {
    modified,
    already_present,
    excluded,
    non_text,
    errors,
  } = report.tally;

  let errors_str = if errors > 0 {
    errors.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
  } else {
    errors.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string()
  };

  let mut summary_line = format!(
    "Summary: {} modified, {} already present, {} skipped, {} errors",
    modified.if_supports_color(Stream::Stdout, |s| s.cyan()),
    already_present.if_supports_color(Stream::Stdout, |s| s.cyan()),
    (excluded + non_text).if_supports_color(Stream::Stdout, |s| s.dimmed()),
    errors_str
  );

  if is_verbose() {
    summary_line.push_str(&format!(" ({:.2}s)", report.elapsed_ms as f64 / 1000.0));
  }

  println!("{}", summary_line);
}

/// Prints the complete result of a run.
pub fn print_run(report: &RunReport, roots: &[PathBuf]) {
  let modified = report.files_where(|o| *o == Outcome::Modified);
  let errors = report.files_where(Outcome::is_error);
  let skipped = report.files_where(Outcome::is_skipped);

  print_blank_line();
  if modified.is_empty() && errors.is_empty() {
    print_all_files_ok();
  } else {
    print_modified_files(&modified, roots);
  }
  print_skipped_files(&skipped, roots);
  print_error_files(&errors, roots);

  print_blank_line();
  print_summary(report);
}

/// Print where the JSON report was written.
pub fn print_report_written(path: &Path) {
  if is_quiet() {
    return;
  }

  println!(
    "Wrote JSON report to {}",
    path.display().if_supports_color(Stream::Stdout, |p| p.yellow())
  );
}

/// Make a path relative to the root that contains it, for display.
///
/// The innermost containing root wins when roots are nested.
pub fn display_path(path: &Path, roots: &[PathBuf]) -> String {
  roots
    .iter()
    .filter(|root| path.starts_with(root))
    .max_by_key(|root| root.components().count())
    .and_then(|root| pathdiff::diff_paths(path, root))
    .unwrap_or_else(|| path.to_path_buf())
    .to_string_lossy()
    .into_owned()
}
