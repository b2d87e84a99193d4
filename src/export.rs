use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::error::ExportError;

pub const CSV_MIME: &str = "text/csv;charset=utf-8";

/// A ready-to-save export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn csv(name: &str, date: NaiveDate, bytes: Vec<u8>) -> Self {
        Self {
            filename: export_filename(name, date),
            mime: CSV_MIME,
            bytes,
        }
    }

    /// Write into `dir` (created if missing) and return the full path.
    /// The bytes go to a temp file beside the target that is renamed into
    /// place, so a failed write never leaves a partial export behind.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&self.bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }
}

/// `<name>_<YYYY-MM-DD>.csv`
pub fn export_filename(name: &str, date: NaiveDate) -> String {
    format!("{name}_{}.csv", date.format("%Y-%m-%d"))
}

/// Where exports land when no directory is given.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Serialize `rows` as CSV. Columns default to the keys of the first row, so
/// an empty `rows` with no explicit columns produces an empty file.
pub fn serialize(rows: &[Map<String, Value>], columns: Option<&[String]>) -> Result<Vec<u8>, ExportError> {
    let columns: Vec<String> = match columns {
        Some(cols) => cols.to_vec(),
        None => match rows.first() {
            Some(first) => first.keys().cloned().collect(),
            None => return Ok(Vec::new()),
        },
    };

    // Necessary quoting wraps fields holding a comma, a quote or a line
    // break, doubling inner quotes.
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| cell(row.get(c))))?;
    }
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}
