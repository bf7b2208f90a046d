use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::{CellValue, Record};

/// Zips coerced columns back into row-ordered records, one fresh UUID each.
///
/// `fields[i]` names `columns[i]`; every column must hold `row_count` cells.
pub fn build_records(fields: &[String], columns: &[Vec<CellValue>], row_count: usize) -> Vec<Record> {
    debug_assert_eq!(fields.len(), columns.len());
    (0..row_count)
        .map(|row| {
            let values: BTreeMap<String, CellValue> = fields
                .iter()
                .zip(columns)
                .map(|(field, column)| {
                    let value = column.get(row).cloned().unwrap_or(CellValue::Null);
                    (field.clone(), value)
                })
                .collect();
            Record {
                id: Uuid::new_v4().to_string(),
                fields: values,
            }
        })
        .collect()
}
