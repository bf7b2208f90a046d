use async_trait::async_trait;

use crate::app::ports::RecordStore;
use crate::error::StoreError;
use crate::types::Record;

/// List id for which the placeholder store returns its full sample set.
pub const CURRENT_LIST: &str = "current";

/// Fixed placeholder records returned regardless of what was uploaded.
/// Stands in until a real store is wired up; nothing is persisted.
#[derive(Debug, Default, Clone)]
pub struct SampleRecordStore;

impl SampleRecordStore {
    pub fn records_for(list_id: &str) -> Vec<Record> {
        let mut records = vec![sample_record(
            "test-1",
            "テスト株式会社",
            "IT",
            "山田太郎",
            "test@example.com",
            "03-1234-5678",
            "東京都渋谷区",
            "https://example.com",
            (100.0, 500.0, 2010.0),
        )];
        if list_id == CURRENT_LIST {
            records.push(sample_record(
                "test-2",
                "サンプル商事",
                "製造業",
                "佐藤次郎",
                "sample@example.com",
                "03-8765-4321",
                "大阪府大阪市",
                "https://sample.com",
                (50.0, 300.0, 2005.0),
            ));
        }
        records
    }
}

#[allow(clippy::too_many_arguments)]
fn sample_record(
    id: &str,
    company_name: &str,
    industry: &str,
    contact_person: &str,
    email: &str,
    phone: &str,
    address: &str,
    url: &str,
    (employee_count, revenue, established_year): (f64, f64, f64),
) -> Record {
    Record::new(id)
        .with_field("company_name", company_name)
        .with_field("industry", industry)
        .with_field("contact_person", contact_person)
        .with_field("email", email)
        .with_field("phone", phone)
        .with_field("address", address)
        .with_field("url", url)
        .with_field("employee_count", employee_count)
        .with_field("revenue", revenue)
        .with_field("established_year", established_year)
        .with_field("status", "処理中")
}

#[async_trait]
impl RecordStore for SampleRecordStore {
    async fn get(&self, list_id: &str) -> Result<Vec<Record>, StoreError> {
        Ok(Self::records_for(list_id))
    }

    async fn attach_text(&self, _list_id: &str, _record_id: &str, _text: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_current_list_has_two_records() {
        let store = SampleRecordStore;
        let current = store.get(CURRENT_LIST).await.unwrap();
        assert_eq!(current.len(), 2);
        assert_eq!(current[1].id, "test-2");

        let other = store.get("anything").await.unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].display("company_name").as_deref(), Some("テスト株式会社"));
    }
}
