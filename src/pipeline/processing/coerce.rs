//! Column-level type inference.
//!
//! Each column is classified as a whole (numeric, date, text) and then every
//! cell is converted under that classification. Cells that do not fit a
//! numeric or date column become null rather than aborting the file.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::types::{CellValue, RawCell};

/// How a column was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// No non-blank cells at all.
    Empty,
    Numeric,
    Date,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoercedColumn {
    pub kind: ColumnKind,
    pub values: Vec<CellValue>,
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y年%m月%d日",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y年%m月%d日 %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Largest integer magnitude an `f64` holds exactly (2^53).
const MAX_EXACT_INTEGER: i64 = 1 << 53;

/// Parses a finite number. Zero-padded digit strings such as phone numbers
/// or postal codes (`03…`, `0123`) are not numbers, and neither are integers
/// too long to survive the trip through `f64` (corporate or account numbers).
pub fn parse_number(text: &str) -> Option<f64> {
    let s = text.trim();
    let unsigned = s.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(s);
    let mut chars = unsigned.chars();
    if chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .ok()
            .filter(|n| n.unsigned_abs() <= MAX_EXACT_INTEGER as u64)
            .map(|n| n as f64);
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses a calendar date from the common year-first, month-first and
/// day-first layouts, with or without a time component.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))?;

    // %Y accepts any digit count; reject years nobody writes in a lead list.
    (1000..=9999).contains(&date.year()).then_some(date)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// True when at least half of the `candidates` converted.
fn leans(converted: usize, candidates: usize) -> bool {
    converted > 0 && converted * 2 >= candidates
}

/// Coerces one column. Numeric is attempted before date.
pub fn coerce_column(cells: &[RawCell]) -> CoercedColumn {
    let non_blank: Vec<&RawCell> = cells.iter().filter(|c| !c.is_blank()).collect();
    if non_blank.is_empty() {
        return CoercedColumn {
            kind: ColumnKind::Empty,
            values: vec![CellValue::Null; cells.len()],
        };
    }

    let numeric = non_blank
        .iter()
        .filter(|c| match c {
            RawCell::Number(_) => true,
            RawCell::Text(s) => parse_number(s).is_some(),
            RawCell::Empty => false,
        })
        .count();
    if leans(numeric, non_blank.len()) {
        let values = cells
            .iter()
            .map(|cell| match cell {
                RawCell::Number(n) => CellValue::Number(*n),
                RawCell::Text(s) => parse_number(s).map_or(CellValue::Null, CellValue::Number),
                RawCell::Empty => CellValue::Null,
            })
            .collect();
        return CoercedColumn {
            kind: ColumnKind::Numeric,
            values,
        };
    }

    let dates = non_blank
        .iter()
        .filter(|c| matches!(c, RawCell::Text(s) if parse_date(s).is_some()))
        .count();
    if leans(dates, non_blank.len()) {
        let values = cells
            .iter()
            .map(|cell| match cell {
                RawCell::Text(s) => parse_date(s)
                    .map_or(CellValue::Null, |d| CellValue::Text(format_date(d))),
                _ => CellValue::Null,
            })
            .collect();
        return CoercedColumn {
            kind: ColumnKind::Date,
            values,
        };
    }

    let values = cells
        .iter()
        .map(|cell| match cell {
            c if c.is_blank() => CellValue::Null,
            RawCell::Text(s) => CellValue::Text(s.clone()),
            RawCell::Number(n) => CellValue::Text(CellValue::Number(*n).to_string()),
            RawCell::Empty => CellValue::Null,
        })
        .collect();
    CoercedColumn {
        kind: ColumnKind::Text,
        values,
    }
}
