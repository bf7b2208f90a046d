use async_trait::async_trait;

use crate::error::{GenerationFailure, StoreError};
use crate::types::Record;

/// Source of the records behind a list id, shared by streaming and export.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, list_id: &str) -> Result<Vec<Record>, StoreError>;

    /// Persists generated outreach text for one record of a list.
    async fn attach_text(&self, list_id: &str, record_id: &str, text: &str) -> Result<(), StoreError>;
}

/// Produces outreach text for one record.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, record: &Record) -> Result<String, GenerationFailure>;

    fn name(&self) -> &'static str;
}
