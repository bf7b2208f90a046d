// Export of a record list to CSV or Excel under human-readable column labels

use rust_xlsxwriter::{Format, Workbook};
use std::str::FromStr;
use tracing::{info, instrument};

use crate::app::ports::RecordStore;
use crate::error::ExportError;
use crate::pipeline::processing::CanonicalField;
use crate::types::{CellValue, Record};

/// Fields written to every export, in column order.
pub const EXPORT_FIELDS: [CanonicalField; 8] = [
    CanonicalField::CompanyName,
    CanonicalField::Industry,
    CanonicalField::ContactPerson,
    CanonicalField::Email,
    CanonicalField::Phone,
    CanonicalField::Address,
    CanonicalField::Url,
    CanonicalField::GeneratedText,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// A rendered export, ready to be sent as an attachment or written to disk.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

fn cell_text(record: &Record, field: CanonicalField) -> String {
    record.display(field.id()).unwrap_or_default()
}

fn to_csv(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_FIELDS.iter().map(|f| f.label()))?;
    for record in records {
        writer.write_record(EXPORT_FIELDS.iter().map(|f| cell_text(record, *f)))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

fn to_xlsx(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, field) in EXPORT_FIELDS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, field.label(), &bold)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, field) in EXPORT_FIELDS.iter().enumerate() {
            let col = col as u16;
            match record.get(field.id()) {
                Some(CellValue::Number(n)) => {
                    sheet.write_number(row, col, *n)?;
                }
                Some(CellValue::Text(s)) => {
                    sheet.write_string(row, col, s)?;
                }
                Some(CellValue::Null) | None => {}
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}

/// Renders `records` as the fixed export projection. Missing fields become empty cells.
pub fn render_export(list_id: &str, records: &[Record], format: ExportFormat) -> Result<ExportFile, ExportError> {
    let bytes = match format {
        ExportFormat::Csv => to_csv(records)?,
        ExportFormat::Excel => to_xlsx(records)?,
    };
    Ok(ExportFile {
        file_name: format!("sales_list_{}.{}", list_id, format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}

/// Fetches the list from the store and renders it.
#[instrument(skip(store))]
pub async fn export_list(
    store: &dyn RecordStore,
    list_id: &str,
    format: ExportFormat,
) -> Result<ExportFile, ExportError> {
    let records = store.get(list_id).await?;
    let file = render_export(list_id, &records, format)?;
    info!("Exported {} records as {} ({} bytes)", records.len(), file.file_name, file.bytes.len());
    Ok(file)
}
