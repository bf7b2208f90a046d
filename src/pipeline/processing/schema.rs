use tracing::debug;

use crate::error::{IngestError, Result};
use crate::pipeline::processing::normalize::{CanonicalField, HeaderNormalizer};

/// Canonical fields of which at least one must resolve to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFieldPolicy {
    fields: Vec<CanonicalField>,
}

impl Default for RequiredFieldPolicy {
    fn default() -> Self {
        Self {
            fields: vec![CanonicalField::CompanyName],
        }
    }
}

impl RequiredFieldPolicy {
    pub fn new(fields: Vec<CanonicalField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }
}

/// A raw header paired with its normalizer output (before any collision suffix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub raw: String,
    pub normalized: String,
}

/// Checks the header set against `policy`.
///
/// A required field resolves when some raw header equals its human label
/// (case-insensitive) or normalizes to its identifier. Returns the first
/// required field that resolved, or `None` for an empty policy.
pub fn validate_schema(
    headers: &[ColumnHeader],
    policy: &RequiredFieldPolicy,
) -> Result<Option<CanonicalField>> {
    if policy.fields.is_empty() {
        return Ok(None);
    }

    for field in &policy.fields {
        let resolved = headers.iter().find(|h| {
            HeaderNormalizer::labels_match(&h.raw, field.label()) || h.normalized == field.id()
        });
        if let Some(header) = resolved {
            debug!("Required field '{}' satisfied by column '{}'", field.id(), header.raw);
            return Ok(Some(*field));
        }
    }

    Err(IngestError::SchemaValidation {
        missing: policy.fields.iter().map(|f| f.id().to_string()).collect(),
    })
}
