use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::models::resume::{ResumeAnalysis, ResumeRow, ResumeSummary, StoredResume};
use crate::store::ResumeStore;

/// In-process store for tests. Rows are kept in their encoded form so reads
/// go through the same JSON-text decoding as the PostgreSQL store.
#[derive(Default)]
pub struct MemoryResumeStore {
    rows: Mutex<Vec<ResumeRow>>,
    fail: bool,
}

impl MemoryResumeStore {
    /// A store whose every call fails, standing in for an unreachable database.
    pub fn failing() -> Self {
        Self {
            rows: Mutex::default(),
            fail: true,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            Err(anyhow!("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn insert(&self, file_name: &str, analysis: &ResumeAnalysis) -> Result<StoredResume> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i32 + 1;
        let row = ResumeRow::encode(id, file_name, Utc::now(), analysis)?;
        rows.push(row.clone());
        StoredResume::try_from(row)
    }

    async fn list_summary(&self) -> Result<Vec<ResumeSummary>> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        let mut summaries: Vec<ResumeSummary> = rows
            .iter()
            .map(|row| ResumeSummary {
                id: row.id,
                file_name: row.file_name.clone(),
                uploaded_at: row.uploaded_at,
                name: row.name.clone(),
                email: row.email.clone(),
                resume_rating: row.resume_rating,
            })
            .collect();
        summaries.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<StoredResume>> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|row| row.id == id)
            .cloned()
            .map(StoredResume::try_from)
            .transpose()
    }
}
