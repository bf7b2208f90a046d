use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::{IngestError, UploadError};
use crate::pipeline::ingestion::file_extension;

/// An upload persisted on disk as `<dir>/<file_id>-<file_name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_id: String,
    pub file_name: String,
    pub path: PathBuf,
}

/// Validates, persists and locates uploaded files.
#[derive(Debug, Clone)]
pub struct UploadStore {
    config: UploadConfig,
}

/// Drops any directory components a client may have sent.
fn sanitize_file_name(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
    (!base.is_empty() && base != "." && base != "..").then(|| base.to_string())
}

impl UploadStore {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Checks the extension allow-list and, when a size is known, the size limit.
    pub fn validate(&self, file_name: &str, size_hint: Option<u64>) -> Result<(), UploadError> {
        let ext = file_extension(file_name).unwrap_or_default();
        if ext.is_empty() || !self.config.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
            return Err(UploadError::UnsupportedExtension {
                extension: ext,
                allowed: self.config.allowed_extensions.clone(),
            });
        }
        if let Some(size) = size_hint {
            if size > self.config.max_file_size {
                return Err(UploadError::TooLarge {
                    size,
                    limit_mb: self.config.max_file_size as f64 / (1024.0 * 1024.0),
                });
            }
        }
        Ok(())
    }

    /// Validates then writes the bytes under a freshly minted file id.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<StoredFile, UploadError> {
        let file_name = sanitize_file_name(file_name).ok_or(UploadError::MissingFileName)?;
        if let Err(e) = self.validate(&file_name, Some(bytes.len() as u64)) {
            warn!("Rejected upload '{}': {}", file_name, e);
            return Err(e);
        }

        fs::create_dir_all(&self.config.dir).await?;
        let file_id = Uuid::new_v4().to_string();
        let path = self.config.dir.join(format!("{file_id}-{file_name}"));
        fs::write(&path, bytes).await?;

        info!("Stored upload '{}' ({} bytes) as {}", file_name, bytes.len(), file_id);
        Ok(StoredFile {
            file_id,
            file_name,
            path,
        })
    }

    /// Finds a previously stored upload. Ids that are not UUIDs never match.
    pub async fn locate(&self, file_id: &str) -> Result<StoredFile, IngestError> {
        let not_found = || IngestError::FileNotFound(file_id.to_string());
        if Uuid::parse_str(file_id).is_err() {
            return Err(not_found());
        }

        let mut entries = match fs::read_dir(&self.config.dir).await {
            Ok(entries) => entries,
            Err(_) => return Err(not_found()),
        };
        let prefix = format!("{file_id}-");
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stored_name) = name.strip_prefix(&prefix) {
                return Ok(StoredFile {
                    file_id: file_id.to_string(),
                    file_name: stored_name.to_string(),
                    path: entry.path(),
                });
            }
        }
        warn!("File not found: {}", file_id);
        Err(not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(dir: &Path) -> UploadStore {
        UploadStore::new(UploadConfig {
            dir: dir.to_path_buf(),
            max_file_size: 16,
            ..UploadConfig::default()
        })
    }

    #[tokio::test]
    async fn test_save_then_locate() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());

        let saved = store.save("leads.CSV", b"a,b\n1,2\n").await.unwrap();
        assert!(Uuid::parse_str(&saved.file_id).is_ok());
        assert_eq!(saved.file_name, "leads.CSV");

        let found = store.locate(&saved.file_id).await.unwrap();
        assert_eq!(found, saved);
        assert_eq!(std::fs::read(found.path).unwrap(), b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_rejections_happen_before_persisting() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());

        let err = store.save("notes.txt", b"x").await.unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedExtension { ref extension, .. } if extension == "txt"));

        let err = store.save("big.csv", &[b'x'; 17]).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { size: 17, .. }));

        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_directory_components_are_stripped() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let saved = store.save("../../etc/leads.csv", b"x").await.unwrap();
        assert_eq!(saved.file_name, "leads.csv");
        assert_eq!(saved.path.parent().unwrap(), tmp.path());

        assert!(matches!(store.save("../", b"x").await, Err(UploadError::MissingFileName)));
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_ids_are_not_found() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        store.save("a.csv", b"x").await.unwrap();

        let missing = Uuid::new_v4().to_string();
        for id in ["", "a", missing.as_str()] {
            assert!(matches!(store.locate(id).await, Err(IngestError::FileNotFound(_))), "{id:?}");
        }
    }

    #[test]
    fn test_validate_without_size_hint() {
        let store = UploadStore::new(UploadConfig::default());
        assert!(store.validate("list.xlsx", None).is_ok());
        assert!(store.validate("list.XLS", Some(10)).is_ok());
        assert!(store.validate("list.pdf", None).is_err());
    }

    #[tokio::test]
    async fn test_names_without_extension_are_rejected() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        for name in ["csv", ".csv", "leads."] {
            let err = store.save(name, b"x").await.unwrap_err();
            assert!(matches!(err, UploadError::UnsupportedExtension { .. }), "{name:?}");
        }
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
