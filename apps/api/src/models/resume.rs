use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{
    de::{self, DeserializeOwned},
    Deserialize, Deserializer, Serialize,
};
use sqlx::FromRow;
use thiserror::Error;

/// Placeholder for identity and summary fields the model could not fill.
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Rating the model gives a resume. Always within `1..=10`.
///
/// Deserializes from an integer, an integral float (`8.0`) or a numeric
/// string (`"8"`); anything else, or an out-of-range value, is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "i64")]
pub struct ResumeRating(u8);

#[derive(Debug, Error, PartialEq)]
#[error("resume_rating must be between 1 and 10, got {0}")]
pub struct RatingOutOfRange(pub i64);

impl ResumeRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for ResumeRating {
    type Error = RatingOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RatingOutOfRange(value))
        }
    }
}

impl<'de> Deserialize<'de> for ResumeRating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawRating {
            Int(i64),
            Float(f64),
            Text(String),
        }

        let value = match RawRating::deserialize(deserializer)? {
            RawRating::Int(n) => Some(n),
            RawRating::Float(f) => integral(f),
            RawRating::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
        }
        .ok_or_else(|| de::Error::custom("resume_rating must be a whole number"))?;

        ResumeRating::try_from(value).map_err(de::Error::custom)
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

impl From<ResumeRating> for i64 {
    fn from(rating: ResumeRating) -> Self {
        i64::from(rating.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub role: String,
    pub company: String,
    pub duration: String,
    pub description: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    #[serde(deserialize_with = "string_or_number")]
    pub graduation_year: String,
}

/// Structured analysis of a single resume.
///
/// Missing or `null` text fields become `"N/A"`, missing or `null` lists become
/// empty. `improvement_areas` is the only field that must always be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub name: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub email: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub phone: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub linkedin_url: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub portfolio_url: String,
    #[serde(default = "not_available", deserialize_with = "text_or_not_available")]
    pub summary: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub technical_skills: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub soft_skills: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub projects: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub resume_rating: Option<ResumeRating>,
    pub improvement_areas: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub upskill_suggestions: Vec<String>,
}

impl ResumeAnalysis {
    /// A record with every identity field set to "N/A", no lists and no rating.
    pub fn placeholder(summary: &str, improvement_areas: &str) -> Self {
        Self {
            name: not_available(),
            email: not_available(),
            phone: not_available(),
            linkedin_url: not_available(),
            portfolio_url: not_available(),
            summary: summary.to_string(),
            work_experience: Vec::new(),
            education: Vec::new(),
            technical_skills: Vec::new(),
            soft_skills: Vec::new(),
            projects: Vec::new(),
            certifications: Vec::new(),
            resume_rating: None,
            improvement_areas: improvement_areas.to_string(),
            upskill_suggestions: Vec::new(),
        }
    }
}

fn text_or_not_available<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(not_available))
}

fn list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// Models routinely emit graduation years as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Year::deserialize(deserializer)? {
        Year::Text(s) => s,
        Year::Number(n) => n.to_string(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Persisted shapes
// ────────────────────────────────────────────────────────────────────────────

/// A persisted analysis as returned by the API: row metadata plus every
/// analysis field flattened into one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredResume {
    pub id: i32,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub analysis: ResumeAnalysis,
}

/// Abbreviated projection used by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ResumeSummary {
    pub id: i32,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub resume_rating: Option<i32>,
}

/// Raw `resumes` row. List columns hold JSON text and are decoded once, in
/// `TryFrom<ResumeRow> for StoredResume`.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: i32,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
    pub summary: String,
    pub work_experience: String,
    pub education: String,
    pub technical_skills: String,
    pub soft_skills: String,
    pub projects: String,
    pub certifications: String,
    pub resume_rating: Option<i32>,
    pub improvement_areas: String,
    pub upskill_suggestions: String,
}

impl ResumeRow {
    /// Builds the row that storing `analysis` would produce.
    pub fn encode(
        id: i32,
        file_name: &str,
        uploaded_at: DateTime<Utc>,
        analysis: &ResumeAnalysis,
    ) -> Result<Self> {
        Ok(Self {
            id,
            file_name: file_name.to_string(),
            uploaded_at,
            name: analysis.name.clone(),
            email: analysis.email.clone(),
            phone: analysis.phone.clone(),
            linkedin_url: analysis.linkedin_url.clone(),
            portfolio_url: analysis.portfolio_url.clone(),
            summary: analysis.summary.clone(),
            work_experience: encode_list(&analysis.work_experience)?,
            education: encode_list(&analysis.education)?,
            technical_skills: encode_list(&analysis.technical_skills)?,
            soft_skills: encode_list(&analysis.soft_skills)?,
            projects: encode_list(&analysis.projects)?,
            certifications: encode_list(&analysis.certifications)?,
            resume_rating: analysis.resume_rating.map(|r| i32::from(r.get())),
            improvement_areas: analysis.improvement_areas.clone(),
            upskill_suggestions: encode_list(&analysis.upskill_suggestions)?,
        })
    }
}

impl TryFrom<ResumeRow> for StoredResume {
    type Error = anyhow::Error;

    fn try_from(row: ResumeRow) -> Result<Self> {
        let resume_rating = row
            .resume_rating
            .map(|r| ResumeRating::try_from(i64::from(r)))
            .transpose()
            .with_context(|| format!("resume {} has an invalid rating", row.id))?;

        Ok(StoredResume {
            id: row.id,
            file_name: row.file_name,
            uploaded_at: row.uploaded_at,
            analysis: ResumeAnalysis {
                name: row.name,
                email: row.email,
                phone: row.phone,
                linkedin_url: row.linkedin_url,
                portfolio_url: row.portfolio_url,
                summary: row.summary,
                work_experience: decode_list(&row.work_experience, "work_experience", row.id)?,
                education: decode_list(&row.education, "education", row.id)?,
                technical_skills: decode_list(&row.technical_skills, "technical_skills", row.id)?,
                soft_skills: decode_list(&row.soft_skills, "soft_skills", row.id)?,
                projects: decode_list(&row.projects, "projects", row.id)?,
                certifications: decode_list(&row.certifications, "certifications", row.id)?,
                resume_rating,
                improvement_areas: row.improvement_areas,
                upskill_suggestions: decode_list(
                    &row.upskill_suggestions,
                    "upskill_suggestions",
                    row.id,
                )?,
            },
        })
    }
}

/// Serializes a list column to the JSON text stored in the database.
fn encode_list<T: Serialize>(items: &[T]) -> Result<String> {
    serde_json::to_string(items).context("Failed to serialize list column")
}

fn decode_list<T: DeserializeOwned>(text: &str, column: &str, id: i32) -> Result<Vec<T>> {
    serde_json::from_str(text)
        .with_context(|| format!("resume {id} has malformed JSON in column '{column}'"))
}
