//! # Rewriter Module
//!
//! The [`FileRewriter`] runs the detect-then-rewrite sequence for one
//! candidate and classifies the result as an [`Outcome`].

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};

use super::detector::HeaderDetector;
use super::file_io::{FileIO, ReadOutcome};
use super::preamble;
use crate::error::CandidateError;
use crate::header::HeaderSpec;
use crate::report::Outcome;

/// Inserts the header into files that lack it.
pub struct FileRewriter {
  header: Arc<HeaderSpec>,
  detector: Box<dyn HeaderDetector>,
}

impl FileRewriter {
  pub fn new(header: Arc<HeaderSpec>, detector: Box<dyn HeaderDetector>) -> Self {
    Self { header, detector }
  }

  pub fn header(&self) -> &HeaderSpec {
    &self.header
  }

  /// Processes one candidate. Never fails: every problem is reported as
  /// [`Outcome::Error`] and leaves the file untouched.
  pub fn process(&self, path: &Path) -> Outcome {
    match self.try_process(path) {
      Ok(outcome) => outcome,
      Err(err) => {
        debug!("Failed to process {}: {}", path.display(), err);
        Outcome::Error(err.to_string())
      }
    }
  }

  fn try_process(&self, path: &Path) -> Result<Outcome, CandidateError> {
    if FileIO::has_binary_extension(path) {
      trace!("Skipping binary extension: {}", path.display());
      return Ok(Outcome::SkippedNonText);
    }

    let candidate = match FileIO::read_candidate(path)? {
      ReadOutcome::Text(candidate) => candidate,
      ReadOutcome::NonText => {
        trace!("Skipping non-text file: {}", path.display());
        return Ok(Outcome::SkippedNonText);
      }
    };

    if self.detector.has_header(&candidate.content, &self.header) {
      trace!("Header already present: {}", path.display());
      return Ok(Outcome::SkippedAlreadyPresent);
    }

    let new_content = preamble::insert_header(&candidate.content, &self.header);
    FileIO::write_atomic(&candidate.path, &new_content, candidate.permissions)?;
    debug!("Inserted header into {}", path.display());

    Ok(Outcome::Modified)
  }
}
