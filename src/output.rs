//! Writing produced documents to disk.

use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Media type of a WordprocessingML document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write `content` to `path` through a temporary file in the same directory,
/// so readers never observe a partially written document.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), OutputError> {
    write_via_tempfile(path, content).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_via_tempfile(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Same directory keeps the final rename on one filesystem.
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// `<dir>/<stem>_<suffix>.docx` next to `input`.
pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}_{suffix}.docx"))
}
