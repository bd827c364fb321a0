//! # Logging Module
//!
//! Process-wide output settings for autocopyright.
//!
//! Two channels exist and never mix:
//! - Diagnostics go through `tracing` to stderr. [`init_tracing`] installs the
//!   subscriber; `-v`/`-q` pick the level unless `RUST_LOG` is set.
//! - User-facing results are printed by [`crate::output`], which consults
//!   [`is_quiet`] and [`is_verbose`] and honors the [`ColorMode`].
//!
//! ## Example
//!
//! ```rust
//! use autocopyright::logging::{ColorMode, init_tracing, is_verbose, set_verbose};
//!
//! init_tracing(false, 1);
//! set_verbose();
//! ColorMode::Never.apply();
//!
//! tracing::info!("Scanning root: {}", "src");
//! assert!(is_verbose());
//! ```

mod modes;

pub use modes::{ColorMode, init_tracing, is_quiet, is_verbose, set_quiet, set_verbose};
