// Data processing: header normalization, schema validation, type coercion and record assembly

pub mod coerce;
pub mod normalize;
pub mod records;
pub mod schema;

pub use coerce::{coerce_column, ColumnKind, CoercedColumn};
pub use normalize::{CanonicalField, HeaderNormalizer};
pub use records::build_records;
pub use schema::{validate_schema, ColumnHeader, RequiredFieldPolicy};
