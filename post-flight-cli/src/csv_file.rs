use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use log::debug;
use post_flight_core::{PipelineError, Table};
use tempfile::NamedTempFile;

/// Reads a CSV file with a header row. A file without data rows is an error.
pub fn read_table(path: &Path) -> Result<Table, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::MissingFile {
        path: path.to_path_buf(),
        source,
    })?;
    let table = Table::read_from(display_name(path), BufReader::new(file))?;
    table.ensure_not_empty()?;
    debug!("read {} rows from {}", table.len(), path.display());
    Ok(table)
}

pub fn write_table_atomic(path: &Path, table: &Table) -> Result<()> {
    write_atomic(path, |file| {
        table.write_to(BufWriter::new(file))?;
        Ok(())
    })
}

/// Writes through a temporary file next to `path` and renames it into place,
/// so a failed run leaves no partial output.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> Result<()>,
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(directory)
        .with_context(|| format!("failed to create a temporary file in {}", directory.display()))?;
    write(&mut file)?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// `<stem>-<suffix>.<extension>` next to `input`.
pub fn sibling_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    input.with_file_name(format!("{}-{}.{}", stem, suffix, extension))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
