//! # Header Module
//!
//! [`HeaderSpec`] is the immutable description of the header block: the
//! comment prefix and the rendered body lines. It is built once from the
//! rendered template and shared read-only by every worker.

/// Comment prefix plus rendered header body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSpec {
  prefix: String,
  lines: Vec<String>,
}

impl HeaderSpec {
  /// Builds the header from a comment prefix and the rendered header text.
  ///
  /// Trailing newlines of the rendered text are dropped so a template that
  /// ends with a newline does not produce an extra empty comment line.
  pub fn new(prefix: impl Into<String>, rendered: &str) -> Self {
    let body = rendered.trim_end_matches(['\n', '\r']);
    let lines = if body.is_empty() {
      Vec::new()
    } else {
      body.lines().map(str::to_string).collect()
    };
    Self {
      prefix: prefix.into(),
      lines,
    }
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  /// The rendered body, one entry per line, without comment prefix.
  pub fn lines(&self) -> &[String] {
    &self.lines
  }

  pub const fn len(&self) -> usize {
    self.lines.len()
  }

  pub const fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  /// The body lines as they appear in a file: `prefix + " " + line` with
  /// trailing whitespace removed.
  pub fn commented_lines(&self) -> impl Iterator<Item = String> + '_ {
    self
      .lines
      .iter()
      .map(move |line| format!("{} {}", self.prefix, line).trim_end().to_string())
  }

  /// Strips the comment prefix from a file line and normalizes whitespace so
  /// it can be compared with a body line. Returns `None` when the line is not
  /// a comment with this prefix.
  pub fn uncomment<'a>(&self, line: &'a str) -> Option<&'a str> {
    let prefix = self.prefix.trim();
    let line = line.trim();
    line.strip_prefix(prefix).map(str::trim)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lines_drop_trailing_newlines() {
    let spec = HeaderSpec::new("#", "License line 1\nLicense line 2\n\n");
    assert_eq!(spec.lines(), &["License line 1", "License line 2"]);
  }

  #[test]
  fn test_commented_lines_trim_empty_lines() {
    let spec = HeaderSpec::new("//", "Copyright 2025\n\nAll rights reserved.");
    let lines: Vec<String> = spec.commented_lines().collect();
    assert_eq!(lines, vec!["// Copyright 2025", "//", "// All rights reserved."]);
  }

  #[test]
  fn test_uncomment() {
    let spec = HeaderSpec::new("#", "x");
    assert_eq!(spec.uncomment("# Copyright  "), Some("Copyright"));
    assert_eq!(spec.uncomment("#"), Some(""));
    assert_eq!(spec.uncomment("Copyright"), None);
  }

  #[test]
  fn test_empty_render() {
    let spec = HeaderSpec::new("#", "\n");
    assert!(spec.is_empty());
  }
}
