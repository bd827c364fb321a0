//! # Run Command
//!
//! Resolves the options from the command line and the config file, renders
//! the header and runs the processor over every root.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::config::{Config, Settings, load_config};
use crate::header::HeaderSpec;
use crate::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use crate::output::{print_report_written, print_run, print_start_message};
use crate::processor::{MatchMode, Processor, ProcessorConfig};
use crate::report::write_json_report;
use crate::templates::{RenderContext, TemplateManager, Timestamp, load_manifest};

/// Arguments for a run
#[derive(Args, Debug, Default)]
pub struct RunArgs {
  /// Comment prefix put in front of every header line (e.g. "#" or "//")
  #[arg(short = 's', long, value_name = "SYMBOL", allow_hyphen_values = true)]
  pub comment_symbol: Option<String>,

  /// Root directory to scan (repeatable)
  #[arg(short = 'd', long, value_name = "DIR")]
  pub directory: Vec<PathBuf>,

  /// Glob pattern selecting files under each root (repeatable)
  #[arg(short = 'g', long, value_name = "GLOB")]
  pub glob: Vec<String>,

  /// Header template file
  #[arg(short = 'l', long, value_name = "FILE")]
  pub license: Option<PathBuf>,

  /// File or directory to leave untouched (repeatable)
  #[arg(short = 'x', long, value_name = "PATH")]
  pub exclude: Vec<PathBuf>,

  /// Regex of paths to leave untouched; `{cwd}` and `{directory}` are
  /// substituted (repeatable)
  #[arg(short = 'e', long, value_name = "REGEX")]
  pub exclude_pattern: Vec<String>,

  /// Number of worker threads; 1 processes files sequentially [default: 1]
  #[arg(short = 'p', long, value_name = "N")]
  pub pool: Option<usize>,

  /// Project manifest exposed to the template [default: pyproject.toml]
  #[arg(short = 'm', long, value_name = "FILE")]
  pub manifest: Option<PathBuf>,

  /// How closely an existing header must match to be left alone
  /// [default: exact]
  #[arg(long, value_name = "MODE", value_enum)]
  pub match_mode: Option<MatchMode>,

  /// Path to config file (default: .autocopyright.toml in the current
  /// directory)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Ignore config file even if present
  #[arg(long)]
  pub no_config: bool,

  /// Write a JSON report of every file's outcome to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,
}

impl RunArgs {
  /// The options given on the command line, as a config layer.
  pub fn to_config(&self) -> Config {
    Config {
      comment_symbol: self.comment_symbol.clone(),
      directories: self.directory.clone(),
      globs: self.glob.clone(),
      license: self.license.clone(),
      exclude: self.exclude.clone(),
      exclude_patterns: self.exclude_pattern.clone(),
      pool: self.pool,
      manifest: self.manifest.clone(),
      match_mode: self.match_mode,
    }
  }
}

/// Runs autocopyright with the given arguments.
///
/// Returns exit code 1 if any file could not be processed.
pub fn run(args: RunArgs) -> Result<ExitCode> {
  init_tracing(args.quiet, args.verbose);

  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  let current_dir = std::env::current_dir().with_context(|| "Failed to get current directory")?;

  let file_config = load_config(args.config.as_deref(), &current_dir, args.no_config)?;
  if file_config.is_some() {
    debug!("Merging command-line options over config file");
  }
  let settings = Settings::from_config(file_config.unwrap_or_default().merge(args.to_config()))?;
  debug!("Resolved settings: {:?}", settings);

  // Captured once for the whole run.
  let manifest = load_manifest(&current_dir.join(&settings.manifest))?;
  let context = RenderContext::new(Timestamp::now(), manifest);

  let mut template_manager = TemplateManager::new();
  template_manager.load_template(&settings.license)?;
  let rendered = template_manager
    .render(&context)
    .with_context(|| format!("Failed to render license template {}", settings.license.display()))?;
  let header = HeaderSpec::new(settings.comment_symbol, &rendered);
  debug!("Header has {} lines", header.len());

  let processor = Processor::new(ProcessorConfig {
    exclude: settings.exclude,
    exclude_patterns: settings.exclude_patterns,
    template_path: template_manager.template_path().map(Path::to_path_buf),
    pool_size: settings.pool,
    match_mode: settings.match_mode,
    current_dir: Some(current_dir),
    ..ProcessorConfig::new(header, settings.directories, settings.globs)
  })?;

  let roots: Vec<PathBuf> = processor.roots().map(|r| r.to_path_buf()).collect();
  print_start_message(&roots);

  let report = processor.run()?;
  print_run(&report, &roots);

  if let Some(ref output_path) = args.report_json {
    write_json_report(output_path, &report)?;
    print_report_written(output_path);
  }

  Ok(ExitCode::from(report.exit_code()))
}
