//! In-process record store used by the router and pipeline tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;

use super::{DbError, NewNoc, NocRecord, NocStatus, NocUpdate, RecordStore};

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<NocRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, noc: NewNoc) -> Result<NocRecord, DbError> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.noc_number == noc.noc_number) {
            return Err(DbError::Duplicate(noc.noc_number));
        }

        // Offset by position so ordering stays stable when inserts share a clock tick.
        let now = Utc::now() + Duration::microseconds(records.len() as i64);
        let a = noc.applicant;
        let record = NocRecord {
            id: records.len() as i32 + 1,
            noc_number: noc.noc_number,
            full_name: a.full_name,
            email: a.email,
            phone: a.phone,
            company: a.company,
            designation: a.designation,
            purpose: a.purpose,
            valid_from: a.valid_from,
            valid_to: a.valid_to,
            id_proof_type: a.id_proof_type,
            id_proof_number: a.id_proof_number,
            address: a.address,
            photo_url: noc.photo_url,
            qr_code_url: noc.qr_code_url,
            pdf_url: None,
            status: NocStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, noc_number: &str, changes: NocUpdate) -> Result<NocRecord, DbError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.noc_number == noc_number)
            .ok_or_else(|| DbError::NotFound(noc_number.to_string()))?;

        if let Some(pdf_url) = changes.pdf_url {
            record.pdf_url = Some(pdf_url);
        }
        if let Some(status) = changes.status {
            record.status = status;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn find_by_number(&self, noc_number: &str) -> Result<Option<NocRecord>, DbError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.noc_number == noc_number).cloned())
    }

    async fn list(&self, page: u32, page_size: u32) -> Result<(Vec<NocRecord>, i64), DbError> {
        let records = self.records.lock().unwrap();
        let mut sorted: Vec<NocRecord> = records.clone();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let skip = page.saturating_sub(1) as usize * page_size as usize;
        let data = sorted.into_iter().skip(skip).take(page_size as usize).collect();
        Ok((data, records.len() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Applicant;
    use chrono::NaiveDate;

    fn new_noc(number: &str) -> NewNoc {
        NewNoc {
            noc_number: number.to_string(),
            applicant: Applicant {
                full_name: "Jane Doe".into(),
                email: "jane@x.com".into(),
                phone: "555-0100".into(),
                company: "Acme".into(),
                designation: "Engineer".into(),
                purpose: "Site visit".into(),
                valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                valid_to: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                id_proof_type: "aadhar".into(),
                id_proof_number: "1234".into(),
                address: "1 Main St".into(),
            },
            photo_url: "/uploads/photos/p.jpg".into(),
            qr_code_url: "/uploads/qrcodes/q.png".into(),
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_numbers() {
        let store = MemoryRecordStore::new();
        store.create(new_noc("NOC-24-01-01-000001")).await.unwrap();
        let err = store.create(new_noc("NOC-24-01-01-000001")).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(n) if n == "NOC-24-01-01-000001"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_of_unknown_number_is_not_found() {
        let store = MemoryRecordStore::new();
        let err = store.update("NOC-00-00-00-000000", NocUpdate::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = MemoryRecordStore::new();
        for i in 0..3 {
            store.create(new_noc(&format!("NOC-24-01-01-00000{}", i))).await.unwrap();
        }
        let (data, total) = store.list(1, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].noc_number, "NOC-24-01-01-000002");
        assert_eq!(data[1].noc_number, "NOC-24-01-01-000001");
    }
}
