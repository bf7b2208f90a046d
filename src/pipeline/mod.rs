// Data processing pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod processing;
pub mod storage;

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::config::IngestConfig;
use crate::error::Result;
use crate::gateway::uploads::UploadStore;
use crate::types::{HeaderMapping, IngestOutcome, RawCell, RawTable};
use ingestion::{read_table, SourceFormat};
use processing::{
    build_records, coerce_column, validate_schema, ColumnHeader, HeaderNormalizer,
    RequiredFieldPolicy,
};

/// Key every record carries for its generated identifier.
pub const RECORD_ID_FIELD: &str = "id";

/// Turns one uploaded table into canonical records plus a header mapping.
///
/// Holds no per-file state, so a single instance can serve concurrent
/// ingestions of different files.
#[derive(Debug, Clone)]
pub struct Ingestor {
    normalizer: HeaderNormalizer,
    policy: RequiredFieldPolicy,
}

impl Ingestor {
    pub fn new(config: &IngestConfig) -> Self {
        Self::with_parts(
            HeaderNormalizer::standard(),
            RequiredFieldPolicy::new(config.required_fields.clone()),
        )
    }

    pub fn with_parts(normalizer: HeaderNormalizer, policy: RequiredFieldPolicy) -> Self {
        Self { normalizer, policy }
    }

    /// Locates a stored upload by id and ingests it.
    #[instrument(skip(self, uploads))]
    pub async fn ingest_file(&self, uploads: &UploadStore, file_id: &str) -> Result<IngestOutcome> {
        let stored = uploads.locate(file_id).await?;
        info!("Found file: {}", stored.path.display());
        let format = SourceFormat::from_file_name(&stored.file_name)?;
        let bytes = tokio::fs::read(&stored.path).await?;
        self.ingest_bytes(&bytes, format)
    }

    /// Ingests a file from the local filesystem, picking the format from its extension.
    pub fn ingest_path(&self, path: &Path) -> Result<IngestOutcome> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let format = SourceFormat::from_file_name(name)?;
        let bytes = std::fs::read(path)?;
        self.ingest_bytes(&bytes, format)
    }

    pub fn ingest_bytes(&self, bytes: &[u8], format: SourceFormat) -> Result<IngestOutcome> {
        let table = read_table(bytes, format)?;
        self.ingest(table)
    }

    /// Normalize headers, validate the schema, drop blank rows, coerce each
    /// column, then build records. Each step requires the previous to succeed.
    #[instrument(skip_all, fields(columns = table.headers().len(), rows = table.rows().len()))]
    pub fn ingest(&self, table: RawTable) -> Result<IngestOutcome> {
        let (raw_headers, rows) = table.into_parts();

        let headers = raw_headers
            .iter()
            .map(|raw| {
                let normalized = self.normalizer.normalize(raw)?;
                Ok(ColumnHeader {
                    raw: raw.clone(),
                    normalized,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        validate_schema(&headers, &self.policy)?;

        let fields = assign_field_ids(&headers);
        let mapping: HeaderMapping = fields
            .iter()
            .zip(&headers)
            .map(|(field, header)| {
                info!("Column mapped: '{}' -> '{}'", header.raw, field);
                (field.clone(), header.raw.clone())
            })
            .collect();

        let total_rows = rows.len();
        let rows: Vec<Vec<RawCell>> = rows
            .into_iter()
            .filter(|row| !row.iter().all(RawCell::is_blank))
            .collect();
        if rows.len() < total_rows {
            debug!("Dropped {} blank rows", total_rows - rows.len());
        }

        let columns: Vec<_> = (0..fields.len())
            .map(|col| {
                let cells: Vec<RawCell> = rows.iter().map(|row| row[col].clone()).collect();
                let coerced = coerce_column(&cells);
                debug!("Column '{}' coerced as {:?}", fields[col], coerced.kind);
                coerced.values
            })
            .collect();

        let data = build_records(&fields, &columns, rows.len());
        info!("Ingested {} records across {} columns", data.len(), fields.len());
        Ok(IngestOutcome { data, mapping })
    }
}

/// Gives each column a distinct identifier. The first column to claim an
/// identifier keeps it; later ones get `_2`, `_3`, ... `id` is reserved.
fn assign_field_ids(headers: &[ColumnHeader]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::from([RECORD_ID_FIELD.to_string()]);
    headers
        .iter()
        .map(|header| {
            let base = &header.normalized;
            let mut candidate = base.clone();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{base}_{n}");
                n += 1;
            }
            candidate
        })
        .collect()
}
