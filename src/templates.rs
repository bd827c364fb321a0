//! # Templates Module
//!
//! This module loads the license template and renders it into the header
//! text.
//!
//! The module includes:
//! - [`TemplateManager`] for loading and rendering license templates
//! - [`RenderContext`] holding every value a template may reference
//! - [`KeyPath`] for resolving `{{ ... }}` placeholders against the context
//!
//! Placeholders are key paths such as `{{ now.year }}` or
//! `{{ manifest.tool.poetry.authors[0] }}`. Lookups are explicit: a path that
//! does not resolve is a [`TemplateError`], never an empty string.
//!
//! ## Example
//!
//! ```rust
//! use autocopyright::templates::{RenderContext, TemplateManager, Timestamp};
//!
//! # fn main() -> anyhow::Result<()> {
//! let manifest: toml::Table = toml::from_str("[project]\nname = \"demo\"")?;
//! let context = RenderContext::new(Timestamp::now(), Some(manifest));
//!
//! let manager = TemplateManager::from_template("Copyright {{ year }} {{ manifest.project.name }}");
//! let text = manager.render(&context)?;
//! assert!(text.ends_with("demo"));
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, FixedOffset, Local};
use regex::Regex;
use tracing::{debug, trace};

use crate::error::ConfigError;

/// Template lookup and syntax failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
  #[error("Invalid template expression '{expr}': {message}")]
  InvalidExpression { expr: String, message: String },

  #[error("Unterminated placeholder in template at byte {0}")]
  Unterminated(usize),

  #[error("Unknown template variable '{0}' (expected `now`, `year` or `manifest`)")]
  UnknownRoot(String),

  #[error("'{path}' is not defined")]
  Undefined { path: String },

  #[error("Index {index} is out of range in '{path}'")]
  IndexOutOfRange { path: String, index: usize },

  #[error("'{path}' is not an array")]
  NotAnArray { path: String },

  #[error("'{path}' is not a table")]
  NotATable { path: String },

  #[error("'{path}' is {kind}, which cannot be rendered as text")]
  NotScalar { path: String, kind: &'static str },

  #[error("'{path}' refers to the project manifest, but no manifest was loaded")]
  NoManifest { path: String },
}

/// The moment a run started, captured once and shared by every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
  pub fn now() -> Self {
    Self(Local::now().fixed_offset())
  }

  pub const fn from_datetime(datetime: DateTime<FixedOffset>) -> Self {
    Self(datetime)
  }

  pub fn year(&self) -> i32 {
    self.0.year()
  }

  fn field(&self, name: &str) -> Option<String> {
    match name {
      "year" => Some(self.0.year().to_string()),
      "month" => Some(self.0.month().to_string()),
      "day" => Some(self.0.day().to_string()),
      "date" => Some(self.0.format("%Y-%m-%d").to_string()),
      "iso" => Some(self.0.to_rfc3339()),
      _ => None,
    }
  }
}

/// Values available to templates.
#[derive(Debug, Clone)]
pub struct RenderContext {
  now: Timestamp,
  manifest: Option<toml::Value>,
}

impl RenderContext {
  pub fn new(now: Timestamp, manifest: Option<toml::Table>) -> Self {
    Self {
      now,
      manifest: manifest.map(toml::Value::Table),
    }
  }

  /// Resolves a parsed key path to its textual value.
  pub fn resolve(&self, path: &KeyPath) -> Result<String, TemplateError> {
    match path.root.as_str() {
      "year" => {
        if !path.segments.is_empty() {
          return Err(TemplateError::NotATable {
            path: path.prefix_through(0),
          });
        }
        Ok(self.now.year().to_string())
      }
      "now" => match path.segments.as_slice() {
        [] => Ok(self.now.0.to_rfc3339()),
        [Segment::Key(name)] => self.now.field(name).ok_or_else(|| TemplateError::Undefined {
          path: path.to_string(),
        }),
        [Segment::Index(_), ..] => Err(TemplateError::NotAnArray {
          path: path.prefix_through(0),
        }),
        [Segment::Key(_), _, ..] => Err(TemplateError::NotATable {
          path: path.prefix_through(1),
        }),
      },
      "manifest" | "pyproject" => {
        let Some(manifest) = &self.manifest else {
          return Err(TemplateError::NoManifest { path: path.to_string() });
        };
        let value = walk(manifest, path)?;
        scalar_to_string(value).ok_or_else(|| TemplateError::NotScalar {
          path: path.to_string(),
          kind: value_kind(value),
        })
      }
      other => Err(TemplateError::UnknownRoot(other.to_string())),
    }
  }
}

/// Reads and parses the project manifest.
///
/// A missing manifest is not an error: templates that never reference it
/// still render. Templates that do reference it fail with
/// [`TemplateError::NoManifest`].
pub fn load_manifest(path: &Path) -> Result<Option<toml::Table>, ConfigError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      debug!("No manifest at {}", path.display());
      return Ok(None);
    }
    Err(source) => {
      return Err(ConfigError::ManifestUnreadable {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  let table: toml::Table = toml::from_str(&content).map_err(|source| ConfigError::ManifestInvalid {
    path: path.to_path_buf(),
    source,
  })?;
  debug!("Loaded {} chars of manifest from {}", content.len(), path.display());
  Ok(Some(table))
}

/// One step of a key path after the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Key(String),
  Index(usize),
}

/// A parsed placeholder expression: `root(.key | [index] | ["key"])*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
  root: String,
  segments: Vec<Segment>,
}

impl KeyPath {
  pub fn parse(expr: &str) -> Result<Self, TemplateError> {
    let invalid = |message: &str| TemplateError::InvalidExpression {
      expr: expr.to_string(),
      message: message.to_string(),
    };

    let mut chars = expr.trim().chars().peekable();
    let root = take_ident(&mut chars);
    if root.is_empty() {
      return Err(invalid("expected a variable name"));
    }

    let mut segments = Vec::new();
    while let Some(c) = chars.next() {
      match c {
        '.' => {
          let key = take_ident(&mut chars);
          if key.is_empty() {
            return Err(invalid("expected a key after '.'"));
          }
          segments.push(Segment::Key(key));
        }
        '[' => {
          let mut inner = String::new();
          let mut closed = false;
          for c in chars.by_ref() {
            if c == ']' {
              closed = true;
              break;
            }
            inner.push(c);
          }
          if !closed {
            return Err(invalid("missing ']'"));
          }
          let inner = inner.trim();
          let quoted = inner
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
          if let Some(key) = quoted {
            segments.push(Segment::Key(key.to_string()));
          } else {
            let index = inner
              .parse::<usize>()
              .map_err(|e| invalid(&format!("index must be a non-negative integer or a quoted key ({e})")))?;
            segments.push(Segment::Index(index));
          }
        }
        c if c.is_whitespace() => return Err(invalid("unexpected whitespace")),
        _ => return Err(invalid(&format!("unexpected character '{c}'"))),
      }
    }

    Ok(Self { root, segments })
  }

  /// Renders the root followed by the first `count` segments.
  fn prefix_through(&self, count: usize) -> String {
    let mut out = self.root.clone();
    for segment in self.segments.iter().take(count) {
      push_segment(&mut out, segment);
    }
    out
  }
}

impl std::fmt::Display for KeyPath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.prefix_through(self.segments.len()))
  }
}

fn push_segment(out: &mut String, segment: &Segment) {
  match segment {
    Segment::Key(key) => {
      out.push('.');
      out.push_str(key);
    }
    Segment::Index(index) => {
      out.push_str(&format!("[{index}]"));
    }
  }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
  let mut ident = String::new();
  while let Some(&c) = chars.peek() {
    if c.is_alphanumeric() || c == '_' || c == '-' {
      ident.push(c);
      chars.next();
    } else {
      break;
    }
  }
  ident
}

fn walk<'v>(root: &'v toml::Value, path: &KeyPath) -> Result<&'v toml::Value, TemplateError> {
  let mut current = root;
  for (i, segment) in path.segments.iter().enumerate() {
    current = match segment {
      Segment::Key(key) => {
        let table = current.as_table().ok_or_else(|| TemplateError::NotATable {
          path: path.prefix_through(i),
        })?;
        table.get(key).ok_or_else(|| TemplateError::Undefined {
          path: path.prefix_through(i + 1),
        })?
      }
      Segment::Index(index) => {
        let array = current.as_array().ok_or_else(|| TemplateError::NotAnArray {
          path: path.prefix_through(i),
        })?;
        array.get(*index).ok_or_else(|| TemplateError::IndexOutOfRange {
          path: path.prefix_through(i),
          index: *index,
        })?
      }
    };
  }
  Ok(current)
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
  match value {
    toml::Value::String(s) => Some(s.clone()),
    toml::Value::Integer(i) => Some(i.to_string()),
    toml::Value::Float(f) => Some(f.to_string()),
    toml::Value::Boolean(b) => Some(b.to_string()),
    toml::Value::Datetime(d) => Some(d.to_string()),
    toml::Value::Array(_) | toml::Value::Table(_) => None,
  }
}

const fn value_kind(value: &toml::Value) -> &'static str {
  match value {
    toml::Value::Array(_) => "an array",
    toml::Value::Table(_) => "a table",
    _ => "a scalar",
  }
}

static PLACEHOLDER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("placeholder regex must compile"));

/// Manager for loading and rendering the license template.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
///
/// use autocopyright::templates::{RenderContext, TemplateManager, Timestamp};
///
/// # fn main() -> anyhow::Result<()> {
/// let mut manager = TemplateManager::new();
/// manager.load_template(Path::new("LICENSE_NOTE.md.jinja2"))?;
///
/// let context = RenderContext::new(Timestamp::now(), None);
/// let header = manager.render(&context)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateManager {
  /// The loaded license template content
  template: String,
  /// Where the template was loaded from, if it came from disk
  path: Option<PathBuf>,
}

impl TemplateManager {
  /// Creates a manager with an empty template.
  ///
  /// You must call [`load_template`](Self::load_template) before rendering
  /// anything useful.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a manager from template text held in memory.
  pub fn from_template(template: impl Into<String>) -> Self {
    Self {
      template: template.into(),
      path: None,
    }
  }

  /// Loads the license template from a file.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::TemplateUnreadable`] if the file does not exist,
  /// cannot be read, or is not valid UTF-8.
  pub fn load_template(&mut self, path: &Path) -> Result<(), ConfigError> {
    debug!("Loading template from: {}", path.display());

    let template_content = fs::read_to_string(path).map_err(|source| ConfigError::TemplateUnreadable {
      path: path.to_path_buf(),
      source,
    })?;

    trace!("Template content:\n{}", template_content);

    self.template = template_content;
    self.path = Some(path.to_path_buf());

    Ok(())
  }

  pub fn template_path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  /// Renders the template, substituting every `{{ key.path }}` placeholder.
  ///
  /// # Errors
  ///
  /// Fails on the first placeholder that is malformed or does not resolve.
  pub fn render(&self, context: &RenderContext) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(self.template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(&self.template) {
      let Some(whole) = caps.get(0) else {
        continue;
      };
      let literal = &self.template[last..whole.start()];
      check_unterminated(literal, last)?;
      rendered.push_str(literal);

      let path = KeyPath::parse(&caps[1])?;
      let value = context.resolve(&path)?;
      trace!("Resolved {} -> {:?}", path, value);
      rendered.push_str(&value);

      last = whole.end();
    }

    let tail = &self.template[last..];
    check_unterminated(tail, last)?;
    rendered.push_str(tail);

    Ok(rendered)
  }
}

fn check_unterminated(literal: &str, offset: usize) -> Result<(), TemplateError> {
  match literal.find("{{") {
    Some(pos) => Err(TemplateError::Unterminated(offset + pos)),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn fixed_now() -> Timestamp {
    let offset = FixedOffset::east_opt(0).unwrap();
    Timestamp::from_datetime(offset.with_ymd_and_hms(2023, 7, 4, 12, 30, 0).unwrap())
  }

  fn context_with(manifest: &str) -> RenderContext {
    let table: toml::Table = toml::from_str(manifest).unwrap();
    RenderContext::new(fixed_now(), Some(table))
  }

  #[test]
  fn test_render_year_and_now_fields() {
    let context = RenderContext::new(fixed_now(), None);
    let manager = TemplateManager::from_template("Copyright {{ year }} / {{now.year}} on {{ now.date }}");
    assert_eq!(
      manager.render(&context).unwrap(),
      "Copyright 2023 / 2023 on 2023-07-04"
    );
  }

  #[test]
  fn test_render_manifest_path_with_index() {
    let context = context_with("[tool.poetry]\nname = \"example\"\nauthors = [\"EXAMPLE_AUTHOR <a@b.c>\"]\n");
    let manager = TemplateManager::from_template("Copyright {{ now.year }} {{ pyproject.tool.poetry.authors[0] }}");
    assert_eq!(
      manager.render(&context).unwrap(),
      "Copyright 2023 EXAMPLE_AUTHOR <a@b.c>"
    );
  }

  #[test]
  fn test_render_quoted_key_and_scalars() {
    let context = context_with("[package]\n\"dotted.name\" = \"x\"\nversion = 3\nstable = true\n");
    let manager =
      TemplateManager::from_template("{{ manifest.package[\"dotted.name\"] }} {{ manifest.package.version }} {{ manifest.package.stable }}");
    assert_eq!(manager.render(&context).unwrap(), "x 3 true");
  }

  #[test]
  fn test_missing_key_is_typed_error() {
    let context = context_with("[tool.poetry]\nname = \"example\"\n");
    let manager = TemplateManager::from_template("{{ manifest.tool.poetry.license }}");
    assert_eq!(
      manager.render(&context).unwrap_err(),
      TemplateError::Undefined {
        path: "manifest.tool.poetry.license".to_string()
      }
    );
  }

  #[test]
  fn test_index_errors() {
    let context = context_with("authors = [\"a\"]\nname = \"n\"\n");

    let out_of_range = TemplateManager::from_template("{{ manifest.authors[3] }}").render(&context);
    assert_eq!(
      out_of_range.unwrap_err(),
      TemplateError::IndexOutOfRange {
        path: "manifest.authors".to_string(),
        index: 3
      }
    );

    let not_array = TemplateManager::from_template("{{ manifest.name[0] }}").render(&context);
    assert_eq!(
      not_array.unwrap_err(),
      TemplateError::NotAnArray {
        path: "manifest.name".to_string()
      }
    );
  }

  #[test]
  fn test_non_scalar_leaf() {
    let context = context_with("authors = [\"a\"]\n");
    let err = TemplateManager::from_template("{{ manifest.authors }}")
      .render(&context)
      .unwrap_err();
    assert!(matches!(err, TemplateError::NotScalar { kind: "an array", .. }));
  }

  #[test]
  fn test_manifest_required_when_referenced() {
    let context = RenderContext::new(fixed_now(), None);
    let err = TemplateManager::from_template("{{ manifest.name }}")
      .render(&context)
      .unwrap_err();
    assert_eq!(
      err,
      TemplateError::NoManifest {
        path: "manifest.name".to_string()
      }
    );
  }

  #[test]
  fn test_unknown_root_and_bad_syntax() {
    let context = RenderContext::new(fixed_now(), None);
    assert_eq!(
      TemplateManager::from_template("{{ author }}").render(&context).unwrap_err(),
      TemplateError::UnknownRoot("author".to_string())
    );
    assert!(matches!(
      TemplateManager::from_template("{{ now. }}").render(&context).unwrap_err(),
      TemplateError::InvalidExpression { .. }
    ));
    assert_eq!(
      TemplateManager::from_template("Copyright {{ year").render(&context).unwrap_err(),
      TemplateError::Unterminated(10)
    );
  }

  #[test]
  fn test_year_takes_no_segments() {
    let context = RenderContext::new(fixed_now(), None);
    let err = TemplateManager::from_template("{{ year.value }}")
      .render(&context)
      .unwrap_err();
    assert_eq!(err, TemplateError::NotATable { path: "year".to_string() });
  }

  #[test]
  fn test_text_without_placeholders_is_unchanged() {
    let context = RenderContext::new(fixed_now(), None);
    let manager = TemplateManager::from_template("MIT License\n\nPermission is hereby granted");
    assert_eq!(manager.render(&context).unwrap(), "MIT License\n\nPermission is hereby granted");
  }

  #[test]
  fn test_load_manifest_missing_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_manifest(&dir.path().join("pyproject.toml")).unwrap().is_none());
  }

  #[test]
  fn test_load_manifest_invalid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pyproject.toml");
    fs::write(&path, "[tool\nname=").unwrap();
    assert!(matches!(
      load_manifest(&path).unwrap_err(),
      ConfigError::ManifestInvalid { .. }
    ));
  }

  #[test]
  fn test_load_template_missing_file() {
    let mut manager = TemplateManager::new();
    let err = manager.load_template(Path::new("/definitely/not/here.jinja2")).unwrap_err();
    assert!(matches!(err, ConfigError::TemplateUnreadable { .. }));
  }
}
