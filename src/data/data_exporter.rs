use crate::data::column::ColumnDef;
use crate::data::row::Row;
use crate::data::value_accessor::{resolve, to_text};
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(anyhow!("Unsupported export format '{}'", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Serializes grid rows into downloadable text
pub struct DataExporter;

impl DataExporter {
    pub fn export(format: ExportFormat, rows: &[Row], columns: &[ColumnDef]) -> Result<String> {
        match format {
            ExportFormat::Csv => Self::to_csv(rows, columns),
            ExportFormat::Json => Self::to_json(rows, columns),
        }
    }

    /// CSV with column labels as the header and every field quoted.
    ///
    /// Cells hold the raw resolved value, not the formatted display text.
    /// Records are separated by `\n` with no trailing newline.
    pub fn to_csv(rows: &[Row], columns: &[ColumnDef]) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(columns.iter().map(|c| c.label.as_str()))?;
        for row in rows {
            writer.write_record(columns.iter().map(|c| to_text(resolve(row, &c.key))))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
        let mut text = String::from_utf8(bytes).context("CSV output was not valid UTF-8")?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }

    /// Pretty JSON array of objects keyed by column label
    pub fn to_json(rows: &[Row], columns: &[ColumnDef]) -> Result<String> {
        let records: Vec<Value> = rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for column in columns {
                    let value = resolve(row, &column.key).cloned().unwrap_or(Value::Null);
                    obj.insert(column.label.clone(), value);
                }
                Value::Object(obj)
            })
            .collect();

        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Timestamped file name, e.g. `grid_export_20240501_093000.csv`
    pub fn export_filename(prefix: &str, format: ExportFormat) -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        format!("{}_{}.{}", prefix, timestamp, format.extension())
    }

    /// Write exported text into `dir` and return the file path
    pub fn write_to_dir(
        dir: &Path,
        prefix: &str,
        format: ExportFormat,
        content: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export directory: {:?}", dir))?;
        let path = dir.join(Self::export_filename(prefix, format));
        fs::write(&path, content)
            .with_context(|| format!("Failed to write export file: {:?}", path))?;

        info!(target: "export", "Exported {} to {}", format, path.display());
        Ok(path)
    }
}
