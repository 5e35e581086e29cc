//! CSV export of a finished conversation.
//!
//! One file per run, named after the export time, holding a header row
//! (`Prompt 1,Response 1,Prompt 2,Response 2,...`) and a single data row.
//! Replies are converted from HTML to markdown.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::Writer;
use tracing::info;

use crate::chat::ChatExchange;
use crate::format::html_to_markdown;

/// A titled CSV column with its single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportColumn {
    pub title: String,
    pub value: String,
}

/// Lay exchanges out as alternating prompt/response columns.
pub fn exchange_columns(exchanges: &[ChatExchange]) -> Vec<ExportColumn> {
    exchanges
        .iter()
        .enumerate()
        .flat_map(|(index, exchange)| {
            let n = index + 1;
            [
                ExportColumn {
                    title: format!("Prompt {n}"),
                    value: exchange.prompt.clone(),
                },
                ExportColumn {
                    title: format!("Response {n}"),
                    value: html_to_markdown(&exchange.response_html),
                },
            ]
        })
        .collect()
}

/// File name for an export taken at `at`.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("responses_{}.csv", at.timestamp_millis())
}

/// Write `columns` to `path` as a header row and one value row.
pub fn write_columns(path: &Path, columns: &[ExportColumn]) -> Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    writer
        .write_record(columns.iter().map(|c| c.title.as_str()))
        .context("Failed to write CSV header")?;
    writer
        .write_record(columns.iter().map(|c| c.value.as_str()))
        .context("Failed to write CSV record")?;
    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

/// Export `exchanges` into `dir`, creating it if needed. Returns the file path.
pub fn write_exchanges(
    dir: &Path,
    exchanges: &[ChatExchange],
    at: DateTime<Utc>,
) -> Result<PathBuf> {
    if !dir.exists() {
        info!(dir = %dir.display(), "CSV directory does not exist. Creating...");
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output dir: {}", dir.display()))?;
    }

    let path = dir.join(export_file_name(at));
    write_columns(&path, &exchange_columns(exchanges))?;
    info!(path = %path.display(), "Responses saved");

    Ok(path)
}
