// Record storage adapters behind the RecordStore port

pub mod in_memory;
pub mod sample;

pub use in_memory::InMemoryRecordStore;
pub use sample::{SampleRecordStore, CURRENT_LIST};
