use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

use super::decode::decode_text;
use crate::error::{IngestError, Result};
use crate::types::{RawCell, RawTable};

/// Tabular formats the pipeline can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xls,
    Xlsx,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xls" => Ok(SourceFormat::Xls),
            "xlsx" => Ok(SourceFormat::Xlsx),
            other => Err(IngestError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_file_name(name: &str) -> Result<Self> {
        Self::from_extension(&file_extension(name).unwrap_or_default())
    }
}

/// Lowercased extension of a file name. Names without a stem before the dot
/// (`.csv`) or without a dot at all (`csv`) have none.
pub fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Parses raw file bytes into a [`RawTable`]; the first row holds headers.
pub fn read_table(bytes: &[u8], format: SourceFormat) -> Result<RawTable> {
    let table = match format {
        SourceFormat::Csv => {
            let (text, encoding) = decode_text(bytes)?;
            info!("Reading CSV ({})", encoding);
            read_csv(&text)?
        }
        SourceFormat::Xls | SourceFormat::Xlsx => read_workbook(bytes)?,
    };
    debug!(
        "Parsed {} columns x {} rows: {:?}",
        table.headers().len(),
        table.rows().len(),
        table.headers()
    );
    Ok(table)
}

fn read_csv(text: &str) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(RawCell::from).collect());
    }
    Ok(RawTable::new(headers, rows))
}

fn read_workbook(bytes: &[u8]) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::Spreadsheet("workbook has no sheets".to_string()))?;
    info!("Reading worksheet '{}'", sheet);

    let range = workbook.worksheet_range(&sheet)?;
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();
    let body = rows.map(|row| row.iter().map(cell_from_data).collect()).collect();
    Ok(RawTable::new(headers, body))
}

fn cell_from_data(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::from(s.as_str()),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) => RawCell::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => RawCell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}
