//! Persistence Gateway for analysis records.
//!
//! Callers only ever see typed records; the JSON-text encoding of list columns
//! stays inside this module and `models::resume`.

#[cfg(test)]
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::db::{close_connection, open_connection};
use crate::models::resume::{ResumeAnalysis, ResumeRow, ResumeSummary, StoredResume};

/// Storage backend for resume analyses.
///
/// Carried in `AppState` as `Arc<dyn ResumeStore>`.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Persists one analysis and returns it with its id and upload timestamp.
    async fn insert(&self, file_name: &str, analysis: &ResumeAnalysis) -> Result<StoredResume>;

    /// All records, newest upload first.
    async fn list_summary(&self) -> Result<Vec<ResumeSummary>>;

    async fn get_by_id(&self, id: i32) -> Result<Option<StoredResume>>;
}

const INSERT_RESUME: &str = r#"
    INSERT INTO resumes (
        file_name, name, email, phone, linkedin_url, portfolio_url, summary,
        work_experience, education, technical_skills, soft_skills, projects, certifications,
        resume_rating, improvement_areas, upskill_suggestions
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
    RETURNING *
"#;

const LIST_SUMMARIES: &str = r#"
    SELECT id, file_name, uploaded_at, name, email, resume_rating
    FROM resumes
    ORDER BY uploaded_at DESC, id DESC
"#;

const SELECT_BY_ID: &str = "SELECT * FROM resumes WHERE id = $1";

/// PostgreSQL-backed store. Every call opens its own connection, runs one
/// statement and closes the connection again.
#[derive(Clone)]
pub struct PgResumeStore {
    database_url: String,
}

impl PgResumeStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn insert(&self, file_name: &str, analysis: &ResumeAnalysis) -> Result<StoredResume> {
        // id and uploaded_at are assigned by the database.
        let encoded = ResumeRow::encode(0, file_name, Utc::now(), analysis)?;

        let mut conn = open_connection(&self.database_url).await?;
        let result = sqlx::query_as::<_, ResumeRow>(INSERT_RESUME)
            .bind(&encoded.file_name)
            .bind(&encoded.name)
            .bind(&encoded.email)
            .bind(&encoded.phone)
            .bind(&encoded.linkedin_url)
            .bind(&encoded.portfolio_url)
            .bind(&encoded.summary)
            .bind(&encoded.work_experience)
            .bind(&encoded.education)
            .bind(&encoded.technical_skills)
            .bind(&encoded.soft_skills)
            .bind(&encoded.projects)
            .bind(&encoded.certifications)
            .bind(encoded.resume_rating)
            .bind(&encoded.improvement_areas)
            .bind(&encoded.upskill_suggestions)
            .fetch_one(&mut conn)
            .await;
        close_connection(conn).await;

        let row = result?;
        info!("Inserted resume {} ({})", row.id, row.file_name);
        StoredResume::try_from(row)
    }

    async fn list_summary(&self) -> Result<Vec<ResumeSummary>> {
        let mut conn = open_connection(&self.database_url).await?;
        let result = sqlx::query_as::<_, ResumeSummary>(LIST_SUMMARIES)
            .fetch_all(&mut conn)
            .await;
        close_connection(conn).await;

        Ok(result?)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<StoredResume>> {
        let mut conn = open_connection(&self.database_url).await?;
        let result = sqlx::query_as::<_, ResumeRow>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&mut conn)
            .await;
        close_connection(conn).await;

        result?.map(StoredResume::try_from).transpose()
    }
}
