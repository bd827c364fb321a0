mod common;

use anyhow::Result;
use autocopyright::error::ConfigError;
use autocopyright::header::HeaderSpec;
use autocopyright::templates::{RenderContext, TemplateError, TemplateManager, Timestamp, load_manifest};
use chrono::{FixedOffset, TimeZone};
use common::write_file;
use tempfile::tempdir;

fn new_year() -> Timestamp {
  let offset = FixedOffset::east_opt(3600).unwrap();
  Timestamp::from_datetime(offset.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

#[test]
fn test_render_template_file_with_pyproject() -> Result<()> {
  let temp_dir = tempdir()?;
  let template = write_file(
    temp_dir.path(),
    "LICENSE_NOTE.md.jinja2",
    "Copyright (c) {{ now.year }} {{ manifest.tool.poetry.authors[0] }}\n\nPart of {{ manifest.project.name }}.\n",
  )?;
  let manifest = write_file(
    temp_dir.path(),
    "pyproject.toml",
    "[project]\nname = \"demo\"\n\n[tool.poetry]\nauthors = [\"Jane Doe <jane@example.com>\"]\n",
  )?;

  let mut manager = TemplateManager::new();
  manager.load_template(&template)?;
  assert_eq!(manager.template_path(), Some(template.as_path()));

  let context = RenderContext::new(new_year(), load_manifest(&manifest)?);
  let rendered = manager.render(&context)?;
  assert_eq!(
    rendered,
    "Copyright (c) 2024 Jane Doe <jane@example.com>\n\nPart of demo.\n"
  );

  let header = HeaderSpec::new("#", &rendered);
  let lines: Vec<String> = header.commented_lines().collect();
  assert_eq!(
    lines,
    vec!["# Copyright (c) 2024 Jane Doe <jane@example.com>", "#", "# Part of demo."]
  );

  Ok(())
}

#[test]
fn test_missing_manifest_is_not_an_error_until_referenced() -> Result<()> {
  let temp_dir = tempdir()?;
  let manifest = load_manifest(&temp_dir.path().join("pyproject.toml"))?;
  assert!(manifest.is_none());

  let context = RenderContext::new(new_year(), manifest);
  assert_eq!(TemplateManager::from_template("(c) {{ year }}").render(&context)?, "(c) 2024");

  let err = TemplateManager::from_template("{{ manifest.project.name }}")
    .render(&context)
    .unwrap_err();
  assert!(matches!(err, TemplateError::NoManifest { .. }));

  Ok(())
}

#[test]
fn test_invalid_manifest_is_config_error() -> Result<()> {
  let temp_dir = tempdir()?;
  let manifest = write_file(temp_dir.path(), "pyproject.toml", "[project\nname = ")?;

  let err = load_manifest(&manifest).unwrap_err();
  assert!(matches!(err, ConfigError::ManifestInvalid { .. }));

  Ok(())
}

#[test]
fn test_missing_template_file() {
  let temp_dir = tempdir().unwrap();
  let mut manager = TemplateManager::new();

  let err = manager
    .load_template(&temp_dir.path().join("NOPE.jinja2"))
    .unwrap_err();
  assert!(matches!(err, ConfigError::TemplateUnreadable { .. }));
}

#[test]
fn test_undefined_manifest_key_names_the_path() -> Result<()> {
  let manifest: toml::Table = toml::from_str("[project]\nname = \"demo\"\n")?;
  let context = RenderContext::new(new_year(), Some(manifest));

  let err = TemplateManager::from_template("{{ manifest.project.version }}")
    .render(&context)
    .unwrap_err();
  assert_eq!(
    err,
    TemplateError::Undefined {
      path: "manifest.project.version".to_string()
    }
  );
  assert!(err.to_string().contains("manifest.project.version"));

  Ok(())
}
