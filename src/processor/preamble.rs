//! # Preamble Module
//!
//! Splits file content into the lines that must stay above the header
//! (shebang, encoding declaration) and the rest, and builds the content with
//! the header block inserted between them.

use std::sync::LazyLock;

use regex::Regex;

use crate::header::HeaderSpec;

const BOM: char = '\u{feff}';

/// `coding[:=]` inside a comment, covering PEP 263, Emacs and Vim modelines
/// and Ruby's `# encoding:` magic comment.
static ENCODING_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[ \t\f]*(?:#|//|;+|--|%|/\*|<!--).*?coding[:=][ \t]*[-\w.]+").expect("encoding regex must compile")
});

/// XML declaration, which may carry its own `encoding` attribute.
static XML_DECLARATION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[ \t]*<\?xml\b[^>]*\?>").expect("xml declaration regex must compile"));

/// Content split around the preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
  /// Byte-order mark, if the file starts with one
  pub bom: &'a str,
  /// Preamble lines including their line endings (the last may lack one)
  pub preamble: &'a str,
  /// Everything after the preamble
  pub body: &'a str,
}

/// Whether a line (without its line ending) is a source-encoding declaration.
pub fn is_encoding_declaration(line: &str) -> bool {
  ENCODING_DECLARATION.is_match(line) || XML_DECLARATION.is_match(line)
}

/// Splits off the preamble.
///
/// 1. A first line starting with `#!` belongs to the preamble.
/// 2. The next line (line 1, or line 2 after a shebang) belongs to it as well
///    when it is an encoding declaration.
pub fn split(content: &str) -> Split<'_> {
  let (bom, rest) = match content.strip_prefix(BOM) {
    Some(rest) => (&content[..BOM.len_utf8()], rest),
    None => ("", content),
  };

  let mut end = 0;
  let (first, first_end) = next_line(rest, 0);
  if first.starts_with("#!") {
    end = first_end;
  }

  if end < rest.len() || end == 0 {
    let (line, line_end) = next_line(rest, end);
    if is_encoding_declaration(line) {
      end = line_end;
    }
  }

  Split {
    bom,
    preamble: &rest[..end],
    body: &rest[end..],
  }
}

/// Returns the line starting at `start` without its ending, and the offset
/// just past the ending.
fn next_line(content: &str, start: usize) -> (&str, usize) {
  let tail = &content[start..];
  match tail.find('\n') {
    Some(pos) => (tail[..pos].trim_end_matches('\r'), start + pos + 1),
    None => (tail.trim_end_matches('\r'), content.len()),
  }
}

/// The line ending used by the file: CRLF when its first line ends with
/// CRLF, LF otherwise.
pub fn line_ending(content: &str) -> &'static str {
  match content.find('\n') {
    Some(pos) if content[..pos].ends_with('\r') => "\r\n",
    _ => "\n",
  }
}

/// Builds new content with the header block inserted after the preamble and
/// separated from the original body by one blank line.
pub fn insert_header(content: &str, header: &HeaderSpec) -> String {
  let parts = split(content);
  let eol = line_ending(content);

  let header_len: usize = header.lines().iter().map(|l| l.len() + header.prefix().len() + 1 + eol.len()).sum();
  let mut out = String::with_capacity(content.len() + header_len + eol.len() * 2);

  out.push_str(parts.bom);
  out.push_str(parts.preamble);
  if !parts.preamble.is_empty() && !parts.preamble.ends_with('\n') {
    out.push_str(eol);
  }
  for line in header.commented_lines() {
    out.push_str(&line);
    out.push_str(eol);
  }
  out.push_str(eol);
  out.push_str(parts.body);
  out
}
