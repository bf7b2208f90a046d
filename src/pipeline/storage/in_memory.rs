use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::app::ports::RecordStore;
use crate::error::StoreError;
use crate::pipeline::processing::CanonicalField;
use crate::types::{CellValue, Record};

/// Process-lifetime record lists keyed by list id (the upload's file id).
///
/// Lists that were never stored are served by `fallback`. Nothing survives
/// a restart.
pub struct InMemoryRecordStore {
    lists: Arc<Mutex<HashMap<String, Vec<Record>>>>,
    fallback: Arc<dyn RecordStore>,
}

impl InMemoryRecordStore {
    pub fn new(fallback: Arc<dyn RecordStore>) -> Self {
        Self {
            lists: Arc::new(Mutex::new(HashMap::new())),
            fallback,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<Record>>>, StoreError> {
        self.lists
            .lock()
            .map_err(|_| StoreError::Unavailable("record list lock poisoned".to_string()))
    }

    /// Replaces the records of `list_id`.
    pub fn put(&self, list_id: &str, records: Vec<Record>) -> Result<(), StoreError> {
        debug!("Stored {} records under list {}", records.len(), list_id);
        self.lock()?.insert(list_id.to_string(), records);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, list_id: &str) -> Result<Vec<Record>, StoreError> {
        let stored = self.lock()?.get(list_id).cloned();
        match stored {
            Some(records) => Ok(records),
            None => self.fallback.get(list_id).await,
        }
    }

    async fn attach_text(&self, list_id: &str, record_id: &str, text: &str) -> Result<(), StoreError> {
        let known_list = {
            let mut lists = self.lock()?;
            match lists.get_mut(list_id) {
                Some(records) => {
                    if let Some(record) = records.iter_mut().find(|r| r.id == record_id) {
                        record.fields.insert(
                            CanonicalField::GeneratedText.id().to_string(),
                            CellValue::Text(text.to_string()),
                        );
                    }
                    true
                }
                None => false,
            }
        };
        if known_list {
            Ok(())
        } else {
            self.fallback.attach_text(list_id, record_id, text).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::storage::SampleRecordStore;

    fn store() -> InMemoryRecordStore {
        InMemoryRecordStore::new(Arc::new(SampleRecordStore))
    }

    #[tokio::test]
    async fn test_stored_list_round_trip() {
        let store = store();
        store
            .put("file-1", vec![Record::new("r1").with_field("company_name", "A社")])
            .unwrap();

        store.attach_text("file-1", "r1", "こんにちは").await.unwrap();
        let records = store.get("file-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display("generated_text").as_deref(), Some("こんにちは"));
    }

    #[tokio::test]
    async fn test_unknown_list_uses_fallback() {
        let store = store();
        let records = store.get("current").await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(store.attach_text("current", "test-1", "x").await.is_ok());
    }
}
