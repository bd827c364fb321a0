//! # Detector Module
//!
//! This module contains the interfaces and implementations for deciding
//! whether a file already starts with the header block. It allows the
//! matching policy to be swapped without touching the rewriter.

use clap::ValueEnum;
use serde::Deserialize;
use similar::TextDiff;

use super::preamble;
use crate::header::HeaderSpec;

/// Trait for header detectors.
///
/// Implementations inspect the leading lines of a file (after the preamble)
/// and report whether an equivalent header block is already present.
pub trait HeaderDetector: Send + Sync {
  /// Checks if the content already starts with the header block.
  fn has_header(&self, content: &str, header: &HeaderSpec) -> bool;
}

/// How strictly an existing block must match the rendered header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
  /// Every line must match after comment and whitespace normalization
  #[default]
  Exact,
  /// The block must be at least 80% similar (tolerates a changed year or
  /// author)
  Fuzzy,
}

impl MatchMode {
  pub fn detector(self) -> Box<dyn HeaderDetector> {
    match self {
      Self::Exact => Box::new(ExactBlockDetector),
      Self::Fuzzy => Box::new(FuzzyBlockDetector::default()),
    }
  }
}

/// The first `header.len()` lines following the preamble.
///
/// At most preamble (two lines) plus header lines are ever examined.
fn leading_block<'a>(content: &'a str, header: &HeaderSpec) -> Vec<&'a str> {
  preamble::split(content).body.lines().take(header.len()).collect()
}

/// Matches the whole block line by line.
///
/// Each file line has its comment prefix stripped and surrounding whitespace
/// trimmed before comparison with the trimmed header line. A stale year or
/// author makes the block absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactBlockDetector;

impl HeaderDetector for ExactBlockDetector {
  fn has_header(&self, content: &str, header: &HeaderSpec) -> bool {
    if header.is_empty() {
      return true;
    }

    let block = leading_block(content, header);
    if block.len() < header.len() {
      return false;
    }

    block
      .iter()
      .zip(header.lines())
      .all(|(file_line, expected)| header.uncomment(file_line) == Some(expected.trim()))
  }
}

/// Matches the block by character-level similarity.
///
/// The normalized leading block and the header body are compared as text; a
/// similarity ratio at or above the threshold counts as present.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyBlockDetector {
  threshold: f32,
}

impl FuzzyBlockDetector {
  pub const DEFAULT_THRESHOLD: f32 = 0.8;

  pub const fn new(threshold: f32) -> Self {
    Self { threshold }
  }
}

impl Default for FuzzyBlockDetector {
  fn default() -> Self {
    Self::new(Self::DEFAULT_THRESHOLD)
  }
}

impl HeaderDetector for FuzzyBlockDetector {
  fn has_header(&self, content: &str, header: &HeaderSpec) -> bool {
    if header.is_empty() {
      return true;
    }

    let block = leading_block(content, header);
    if block.is_empty() {
      return false;
    }

    let found = block
      .iter()
      .map(|line| header.uncomment(line).unwrap_or_else(|| line.trim()))
      .collect::<Vec<_>>()
      .join("\n");
    let expected = header.lines().iter().map(|l| l.trim()).collect::<Vec<_>>().join("\n");

    TextDiff::from_chars(found.as_str(), expected.as_str()).ratio() >= self.threshold
  }
}
