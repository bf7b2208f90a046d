// Pipeline ingestion: format detection, text decoding and tabular parsing

pub mod decode;
pub mod reader;

// Re-export key types and functions for external use
pub use decode::decode_text;
pub use reader::{file_extension, read_table, SourceFormat};
