//! # autocopyright
//!
//! A tool that inserts a rendered copyright/license header at the top of
//! source files across a project tree.
//!
//! `autocopyright` modifies source files in place and never adds a header to
//! a file that already starts with one. Shebang lines and encoding
//! declarations stay above the header, VCS internals and excluded paths are
//! never touched, and every file is replaced atomically.
//!
//! ## Features
//!
//! * Recursive glob matching over one or more root directories
//! * Header templates with `{{ now.year }}` and `{{ manifest.* }}` lookups
//! * Exact or fuzzy detection of an existing header
//! * Exclusion by path, by regex, and by `.gitignore`
//! * Sequential processing or a bounded worker pool
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use autocopyright::header::HeaderSpec;
//! use autocopyright::processor::{Processor, ProcessorConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let header = HeaderSpec::new("#", "Copyright 2025 Example Author\nSPDX-License-Identifier: MIT");
//!
//!     let processor = Processor::new(ProcessorConfig {
//!         pool_size: 4,
//!         ..ProcessorConfig::new(header, vec![PathBuf::from("src")], vec!["*.py".to_string()])
//!     })?;
//!
//!     let report = processor.run()?;
//!     println!("{} files modified", report.tally.modified);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`processor`] - File selection, header detection and rewriting
//! * [`templates`] - Header template loading and rendering
//! * [`config`] - Config file discovery and option merging
//! * [`logging`] - Logging utilities for verbose output
//!
//! [`processor`]: crate::processor
//! [`templates`]: crate::templates
//! [`config`]: crate::config
//! [`logging`]: crate::logging

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod header;
pub mod logging;
pub mod output;
pub mod processor;
pub mod report;
pub mod templates;
