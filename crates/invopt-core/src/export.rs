use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::records::{RecordTable, Scalar};

pub const DEFAULT_SOLUTION_COLUMN: &str = "opt";

/// Write the records plus a `column` holding one solution value per record
pub fn export_solution(
    path: impl AsRef<Path>,
    records: &RecordTable,
    values: &[f64],
    column: &str,
) -> Result<()> {
    let path = path.as_ref();
    if values.len() != records.len() {
        return Err(Error::Schema(format!(
            "{} solution values for {} records",
            values.len(),
            records.len()
        )));
    }

    let mut table = records.clone();
    table.push_column(column, values.iter().map(|&v| Some(Scalar::Number(v))).collect())?;
    export_table(path, &table)?;
    info!(path = %path.display(), rows = table.len(), "exported solution");
    Ok(())
}

/// Write a table as CSV, creating missing parent directories
pub fn export_table(path: impl AsRef<Path>, table: &RecordTable) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    table.write_csv_file(path)
}

/// Pretty-printed JSON of any statistics value
pub fn export_statistics<S: Serialize>(statistics: &S, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(statistics).map_err(Error::Serialize)?;
    ensure_parent(path)?;
    fs::write(path, json).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), "exported statistics");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
        }
        _ => Ok(()),
    }
}
