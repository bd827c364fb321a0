use std::sync::atomic::{AtomicU8, Ordering};

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Global output mode consulted by the `output` module.
///
/// This is initialized to `Normal`; [`set_verbose`] and [`set_quiet`] switch
/// it once at startup.
static OUTPUT_MODE: AtomicU8 = AtomicU8::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
  Normal = 0,
  Quiet = 1,
  Verbose = 2,
}

impl OutputMode {
  const fn from_u8(value: u8) -> Self {
    match value {
      1 => OutputMode::Quiet,
      2 => OutputMode::Verbose,
      _ => OutputMode::Normal,
    }
  }

  fn current() -> Self {
    Self::from_u8(OUTPUT_MODE.load(Ordering::SeqCst))
  }
}

/// Enum representing the color mode options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
  /// Automatically determine whether to use colors based on TTY detection
  #[default]
  Auto,
  /// Never use colors
  Never,
  /// Always use colors
  Always,
}

impl ColorMode {
  /// Applies the mode to all `owo-colors` output of the process.
  ///
  /// `Auto` leaves the decision to the stream's TTY and the `NO_COLOR` /
  /// `FORCE_COLOR` environment variables.
  pub fn apply(self) {
    match self {
      ColorMode::Auto => owo_colors::unset_override(),
      ColorMode::Never => owo_colors::set_override(false),
      ColorMode::Always => owo_colors::set_override(true),
    }
  }
}

/// Switches user-facing output to verbose: full file lists, skipped files
/// and timing.
pub fn set_verbose() {
  OUTPUT_MODE.store(OutputMode::Verbose as u8, Ordering::SeqCst);
}

pub fn set_quiet() {
  OUTPUT_MODE.store(OutputMode::Quiet as u8, Ordering::SeqCst);
}

/// Checks if verbose logging is currently enabled.
pub fn is_verbose() -> bool {
  OutputMode::current() == OutputMode::Verbose
}

/// Checks if quiet mode is currently enabled.
pub fn is_quiet() -> bool {
  OutputMode::current() == OutputMode::Quiet
}

/// Default tracing directive for the given flags.
fn default_directive(quiet: bool, verbose: u8) -> &'static str {
  if quiet {
    return "error";
  }
  match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  }
}

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over the level derived from `-q` and `-v`.
/// Calling this twice is harmless; the second subscriber is discarded.
pub fn init_tracing(quiet: bool, verbose: u8) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(quiet, verbose)));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(verbose > 1)
    .without_time()
    .try_init();
}
