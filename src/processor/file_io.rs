//! # File I/O Module
//!
//! This module provides file reading and atomic writing for the rewriter.
//! It encapsulates every filesystem operation a candidate goes through.

use std::fs::{self, Permissions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use crate::error::CandidateError;

/// Number of leading bytes searched for a NUL byte when deciding whether a
/// file is binary.
pub const TEXT_SNIFF_LIMIT: usize = 8 * 1024;

/// Name prefix of the temporary file an atomic write goes through.
pub const TEMP_FILE_PREFIX: &str = ".autocopyright-";

/// Name suffix of the temporary file an atomic write goes through.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Extensions that are never text, skipped without reading the file.
const BINARY_EXTENSIONS: &[&str] = &[
  // executables, libraries, bytecode, packages
  "exe", "bin", "dll", "so", "o", "a", "pyc", "pyo", "iso", "img", "dmg", "elf", "class", "msi", "jar", "deb", "rpm",
  "apk",
  // images
  "bmp", "dib", "jpg", "jpeg", "jfif", "jp2", "png", "svg", "gif", "tiff", "webp", "ico", "psd", "heic", "heif", "raw",
  "cr2", "nef", "arw", "dds",
  // video
  "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts", "3gp", "mxf", "rm", "ogv", "vob", "dv",
  "f4v", "asf",
  // audio
  "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "alac", "aiff", "pcm", "amr", "opus",
  // archives
  "zip", "rar", "7z", "tar", "gz", "bz2", "xz", "lz", "tgz",
  // fonts
  "ttf", "otf", "woff", "woff2", "eot", "pfb", "pfa",
  // documents
  "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf",
  // 3D models and CAD
  "obj", "stl", "fbx", "dae", "glb", "gltf", "3ds", "dwg", "dxf",
  // misc data
  "dat", "db", "bak", "log", "msg", "torrent",
];

/// A file selected for processing, with its decoded content.
///
/// The buffer is owned by the task handling the file and dropped once the
/// rewrite commits or fails.
#[derive(Debug)]
pub struct Candidate {
  pub path: PathBuf,
  pub content: String,
  pub permissions: Permissions,
}

/// Result of reading a candidate.
#[derive(Debug)]
pub enum ReadOutcome {
  Text(Candidate),
  NonText,
}

/// File I/O operations for the rewriter.
pub struct FileIO;

impl FileIO {
  /// Whether the extension alone marks the file as binary.
  pub fn has_binary_extension(path: &Path) -> bool {
    path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| BINARY_EXTENSIONS.iter().any(|b| b.eq_ignore_ascii_case(ext)))
  }

  /// Whether the file name is one [`write_atomic`](Self::write_atomic) uses
  /// for its temporary files.
  pub fn is_temp_file(path: &Path) -> bool {
    path
      .file_name()
      .and_then(|name| name.to_str())
      .is_some_and(|name| name.starts_with(TEMP_FILE_PREFIX) && name.ends_with(TEMP_FILE_SUFFIX))
  }

  /// Reads a candidate and decodes it as UTF-8.
  ///
  /// Content with a NUL byte within the first [`TEXT_SNIFF_LIMIT`] bytes, or
  /// that is not valid UTF-8, is reported as [`ReadOutcome::NonText`].
  ///
  /// # Errors
  ///
  /// Fails if the path is no longer a regular file, was removed, or cannot be
  /// read.
  pub fn read_candidate(path: &Path) -> Result<ReadOutcome, CandidateError> {
    let metadata = fs::symlink_metadata(path).map_err(CandidateError::from_read)?;
    if !metadata.is_file() {
      return Err(CandidateError::NotAFile);
    }

    let bytes = fs::read(path).map_err(CandidateError::from_read)?;
    if bytes.iter().take(TEXT_SNIFF_LIMIT).any(|b| *b == 0) {
      return Ok(ReadOutcome::NonText);
    }

    match String::from_utf8(bytes) {
      Ok(content) => Ok(ReadOutcome::Text(Candidate {
        path: path.to_path_buf(),
        content,
        permissions: metadata.permissions(),
      })),
      Err(_) => Ok(ReadOutcome::NonText),
    }
  }

  /// Atomically replaces `path` with `content`.
  ///
  /// The content goes to a temporary file in the same directory, which gets
  /// the given permissions and is then renamed over the original. A reader
  /// sees either the old or the new file, never a partial one.
  pub fn write_atomic(path: &Path, content: &str, permissions: Permissions) -> Result<(), CandidateError> {
    let dir = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
      .prefix(TEMP_FILE_PREFIX)
      .suffix(TEMP_FILE_SUFFIX)
      .tempfile_in(dir)
      .map_err(write_error)?;

    temp.write_all(content.as_bytes()).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    fs::set_permissions(temp.path(), permissions).map_err(write_error)?;

    temp.persist(path).map_err(|e| CandidateError::Persist(e.error))?;
    Ok(())
  }
}

fn write_error(err: io::Error) -> CandidateError {
  if err.kind() == io::ErrorKind::PermissionDenied {
    CandidateError::PermissionDenied(err)
  } else {
    CandidateError::TempWrite(err)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_binary_extensions() {
    assert!(FileIO::has_binary_extension(Path::new("logo.PNG")));
    assert!(FileIO::has_binary_extension(Path::new("dist/app.tar.gz")));
    assert!(!FileIO::has_binary_extension(Path::new("main.py")));
    assert!(!FileIO::has_binary_extension(Path::new("Makefile")));
  }

  #[test]
  fn test_temp_file_names() {
    assert!(FileIO::is_temp_file(Path::new("pkg/.autocopyright-x7Yq2p.tmp")));
    assert!(!FileIO::is_temp_file(Path::new("pkg/.autocopyright.toml")));
    assert!(!FileIO::is_temp_file(Path::new("pkg/build.tmp")));
  }

  #[test]
  fn test_read_text_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.py");
    fs::write(&path, "print(1)\n").unwrap();

    match FileIO::read_candidate(&path).unwrap() {
      ReadOutcome::Text(candidate) => assert_eq!(candidate.content, "print(1)\n"),
      ReadOutcome::NonText => panic!("expected text"),
    }
  }

  #[test]
  fn test_read_nul_byte_is_non_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blob.py");
    fs::write(&path, b"abc\0def").unwrap();
    assert!(matches!(FileIO::read_candidate(&path).unwrap(), ReadOutcome::NonText));
  }

  #[test]
  fn test_read_invalid_utf8_is_non_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latin1.py");
    fs::write(&path, [b'a', 0xff, 0xfe, b'b']).unwrap();
    assert!(matches!(FileIO::read_candidate(&path).unwrap(), ReadOutcome::NonText));
  }

  #[test]
  fn test_read_directory_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      FileIO::read_candidate(dir.path()),
      Err(CandidateError::NotAFile)
    ));
  }

  #[test]
  fn test_read_missing_file_is_vanished() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
      FileIO::read_candidate(&dir.path().join("gone.py")),
      Err(CandidateError::Vanished)
    ));
  }

  #[test]
  fn test_write_atomic_replaces_content_and_leaves_no_temp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.py");
    fs::write(&path, "old").unwrap();
    let permissions = fs::metadata(&path).unwrap().permissions();

    FileIO::write_atomic(&path, "new", permissions).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
  }

  #[cfg(unix)]
  #[test]
  fn test_write_atomic_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.sh");
    fs::write(&path, "#!/bin/sh\n").unwrap();
    fs::set_permissions(&path, Permissions::from_mode(0o755)).unwrap();
    let permissions = fs::metadata(&path).unwrap().permissions();

    FileIO::write_atomic(&path, "#!/bin/sh\n# x\n\n", permissions).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o755);
  }
}
