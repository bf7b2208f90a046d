// File intake: validation and persistence of uploaded spreadsheets

pub mod uploads;

pub use uploads::{StoredFile, UploadStore};
