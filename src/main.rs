//! # autocopyright
//!
//! A tool that inserts copyright/license headers into source files.

use std::process::ExitCode;

use anyhow::Result;
use autocopyright::cli::{Cli, run};

fn main() -> Result<ExitCode> {
  let cli = Cli::parse_args();
  run(cli.args)
}
