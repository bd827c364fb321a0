//! # Dispatcher Module
//!
//! Runs one unit of work per candidate, either on the calling thread or on a
//! bounded rayon pool, and collects exactly one [`FileReport`] per
//! candidate.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use tracing::debug;

use crate::error::{CandidateError, DispatchError};
use crate::report::{FileReport, Outcome};

/// How candidates are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
  /// One at a time on the calling thread
  Sequential,
  /// On a dedicated pool of exactly this many threads
  Pool(usize),
}

impl Parallelism {
  /// Pool sizes of 0 and 1 run sequentially.
  pub const fn from_pool_size(size: usize) -> Self {
    if size <= 1 { Self::Sequential } else { Self::Pool(size) }
  }
}

/// Executes per-candidate work under a [`Parallelism`] strategy.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
  parallelism: Parallelism,
}

impl Dispatcher {
  pub const fn new(parallelism: Parallelism) -> Self {
    Self { parallelism }
  }

  pub const fn parallelism(&self) -> Parallelism {
    self.parallelism
  }

  /// Processes every candidate to completion.
  ///
  /// The candidate sequence is consumed lazily on the calling thread. A panic
  /// inside `work` becomes an [`Outcome::Error`] for that candidate; the
  /// remaining candidates still run. Reports come back in completion order.
  ///
  /// # Errors
  ///
  /// Returns [`DispatchError::PoolStart`] if the worker pool cannot be built.
  pub fn run<I, T, F>(&self, candidates: I, work: F) -> Result<Vec<FileReport>, DispatchError>
  where
    I: IntoIterator<Item = T>,
    T: AsRef<Path> + Send,
    F: Fn(&T) -> Outcome + Sync,
  {
    let start = Instant::now();
    let reports = match self.parallelism {
      Parallelism::Sequential => candidates.into_iter().map(|c| run_unit(&c, &work)).collect(),
      Parallelism::Pool(threads) => run_pooled(threads, candidates, &work)?,
    };

    debug!(
      "Dispatched {} candidates ({:?}) in {}ms",
      reports.len(),
      self.parallelism,
      start.elapsed().as_millis()
    );
    Ok(reports)
  }
}

fn run_pooled<I, T, F>(threads: usize, candidates: I, work: &F) -> Result<Vec<FileReport>, DispatchError>
where
  I: IntoIterator<Item = T>,
  T: AsRef<Path> + Send,
  F: Fn(&T) -> Outcome + Sync,
{
  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(threads)
    .thread_name(|i| format!("autocopyright-worker-{i}"))
    .build()
    .map_err(|source| DispatchError::PoolStart { threads, source })?;

  let (tx, rx) = mpsc::channel();
  pool.in_place_scope(|scope| {
    for candidate in candidates {
      let tx = tx.clone();
      scope.spawn(move |_| {
        // The receiver outlives the scope.
        let _ = tx.send(run_unit(&candidate, work));
      });
    }
  });
  drop(tx);

  Ok(rx.into_iter().collect())
}

/// Runs `work` for one candidate, converting a panic into an error outcome.
fn run_unit<T, F>(candidate: &T, work: &F) -> FileReport
where
  T: AsRef<Path>,
  F: Fn(&T) -> Outcome,
{
  let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(candidate))).unwrap_or_else(|payload| {
    let message = panic_message(payload.as_ref());
    Outcome::Error(CandidateError::Panicked(message).to_string())
  });

  FileReport {
    path: candidate.as_ref().to_path_buf(),
    outcome,
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic payload".to_string()
  }
}
