use thiserror::Error;

/// Failures that abort the ingestion of a whole file.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("column header {header:?} does not yield a usable field name")]
    EmptyHeader { header: String },

    #[error("required column not found; expected one of: {}", missing.join(", "))]
    SchemaValidation { missing: Vec<String> },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("could not decode file text (tried {})", attempted.join(", "))]
    Decode { attempted: Vec<&'static str> },

    #[error("File with ID {0} not found")]
    FileNotFound(String),

    #[error("duplicate translation key {0:?}")]
    DuplicateTranslationKey(String),

    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet read failed: {0}")]
    Spreadsheet(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by the HTTP surface to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Malformed,
    Schema,
    Internal,
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::FileNotFound(_) => ErrorKind::NotFound,
            IngestError::SchemaValidation { .. } => ErrorKind::Schema,
            IngestError::EmptyHeader { .. }
            | IngestError::UnsupportedFormat(_)
            | IngestError::Decode { .. }
            | IngestError::Csv(_)
            | IngestError::Spreadsheet(_) => ErrorKind::Malformed,
            IngestError::DuplicateTranslationKey(_) | IngestError::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<calamine::Error> for IngestError {
    fn from(err: calamine::Error) -> Self {
        IngestError::Spreadsheet(err.to_string())
    }
}

/// Rejections raised by file intake before anything is written to disk.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Unsupported file format: {extension}. Allowed formats: {}", allowed.join(", "))]
    UnsupportedExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("File size exceeds the limit of {limit_mb:.1}MB")]
    TooLarge { size: u64, limit_mb: f64 },

    #[error("upload is missing a file name")]
    MissingFileName,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single record's text generation failed. Always recovered by the caller.
#[derive(Error, Debug)]
pub enum GenerationFailure {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend returned no text")]
    EmptyResponse,

    #[error("backend disabled: {0}")]
    Disabled(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable {name} is invalid: {value}")]
    Env { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;
