//! # CLI Module
//!
//! This module contains the command-line interface implementation.
//! It uses clap for argument parsing.

mod run;

use clap::Parser;
use clap::builder::styling::{AnsiColor, Color, Style, Styles};
pub use run::{RunArgs, run};

const CUSTOM_STYLES: Styles = Styles::styled()
  .header(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .usage(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))).bold())
  .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
  .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))).bold())
  .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
  .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))));

const LONG_VERSION: &str = concat!(
  env!("CARGO_PKG_VERSION"),
  " (",
  env!("AUTOCOPYRIGHT_GIT_HASH"),
  " ",
  env!("AUTOCOPYRIGHT_GIT_DATE"),
  ")"
);

/// Top-level CLI arguments
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  long_version = LONG_VERSION,
  about,
  styles = CUSTOM_STYLES,
  after_help = "Examples:
  # Add a header to every Python file under src/
  autocopyright -s \"#\" -d src -g \"*.py\" -l LICENSE_NOTE.md.jinja2

  # Several roots and globs, four workers
  autocopyright -s \"//\" -d src -d include -g \"*.c\" -g \"*.h\" -l NOTE.txt -p 4

  # Leave vendored code and generated files alone
  autocopyright -s \"#\" -d . -g \"*.py\" -l NOTE.txt -x vendor -e \"{directory}/gen/.*\"

  # Do not add a second header when only the year changed
  autocopyright -s \"#\" -d src -g \"*.py\" -l NOTE.txt --match-mode fuzzy

  # Read all options from .autocopyright.toml
  autocopyright
",
  help_template = "{before-help}{name} v{version}
{about-section}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
  #[command(flatten)]
  pub args: RunArgs,
}

impl Cli {
  /// Parse CLI arguments and return the Cli struct
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
