//! Structured Analyzer — resume text in, validated `ResumeAnalysis` out.
//!
//! The analyzer never fails. When no model is configured, or the model call,
//! JSON parsing, or validation fails, it returns a fixed fallback record
//! wrapped in `AnalysisOutcome::Degraded`.

pub mod prompts;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM};
use crate::llm_client::{parse_json, GeminiClient, LanguageModel, LlmError};
use crate::models::resume::ResumeAnalysis;

pub const UNAVAILABLE_SUMMARY: &str = "AI parsing not available, using basic fallback.";
pub const UNAVAILABLE_IMPROVEMENT_AREAS: &str = "Set up GOOGLE_API_KEY.";
pub const FAILED_SUMMARY: &str = "AI parsing failed, using fallback.";
pub const FAILED_IMPROVEMENT_AREAS: &str = "Review Gemini API key or request payload.";

/// Why an analysis fell back to a fixed record.
#[derive(Debug, Error)]
pub enum DegradeReason {
    #[error("no language model configured")]
    ModelUnavailable,

    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("model output omitted resume_rating")]
    MissingRating,
}

/// Result of one analysis. Both variants carry a complete, storable record.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Success(ResumeAnalysis),
    Degraded {
        fallback: ResumeAnalysis,
        reason: DegradeReason,
    },
}

impl AnalysisOutcome {
    fn degraded(reason: DegradeReason) -> Self {
        let fallback = match reason {
            DegradeReason::ModelUnavailable => {
                ResumeAnalysis::placeholder(UNAVAILABLE_SUMMARY, UNAVAILABLE_IMPROVEMENT_AREAS)
            }
            DegradeReason::Model(_) | DegradeReason::MissingRating => {
                ResumeAnalysis::placeholder(FAILED_SUMMARY, FAILED_IMPROVEMENT_AREAS)
            }
        };
        AnalysisOutcome::Degraded { fallback, reason }
    }

    /// Why the fallback was used, or `None` for a successful analysis.
    pub fn degrade_reason(&self) -> Option<&DegradeReason> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Collapses both variants into the record to persist.
    pub fn into_analysis(self) -> ResumeAnalysis {
        match self {
            AnalysisOutcome::Success(analysis) => analysis,
            AnalysisOutcome::Degraded { fallback, .. } => fallback,
        }
    }
}

#[derive(Clone)]
pub struct ResumeAnalyzer {
    model: Option<Arc<dyn LanguageModel>>,
}

impl ResumeAnalyzer {
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { model }
    }

    /// Uses Gemini when an API key is available, the fallback record otherwise.
    pub fn from_api_key(api_key: Option<&str>) -> Result<Self, LlmError> {
        let model = match api_key {
            Some(key) => {
                let client = GeminiClient::new(key.to_string())?;
                Some(Arc::new(client) as Arc<dyn LanguageModel>)
            }
            None => None,
        };
        Ok(Self::new(model))
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Analyzes resume text with a single model call. Never retries.
    pub async fn analyze(&self, resume_text: &str) -> AnalysisOutcome {
        let Some(model) = self.model.as_deref() else {
            info!("No language model configured; using fallback analysis");
            return AnalysisOutcome::degraded(DegradeReason::ModelUnavailable);
        };

        match run_model(model, resume_text).await {
            Ok(analysis) => AnalysisOutcome::Success(analysis),
            Err(reason) => {
                warn!("Resume analysis failed: {reason}");
                AnalysisOutcome::degraded(reason)
            }
        }
    }
}

async fn run_model(
    model: &dyn LanguageModel,
    resume_text: &str,
) -> Result<ResumeAnalysis, DegradeReason> {
    let prompt = build_analysis_prompt(resume_text);
    let raw = model.generate(&prompt, ANALYSIS_SYSTEM).await?;
    let analysis: ResumeAnalysis = parse_json(&raw)?;

    // A model answer must always carry a rating; only fallbacks are unrated.
    if analysis.resume_rating.is_none() {
        return Err(DegradeReason::MissingRating);
    }
    Ok(analysis)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm_client::{LanguageModel, LlmError};

    /// Returns a canned reply and records every prompt it receives.
    pub struct ScriptedModel {
        reply: Result<String, u16>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_with_status(status: u16) -> Self {
            Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "scripted failure".to_string(),
                }),
            }
        }
    }

    pub const VALID_REPLY: &str = r#"{
        "name": "Grace Hopper",
        "email": "grace@example.com",
        "phone": "555-0100",
        "linkedin_url": null,
        "summary": "Compiler pioneer.",
        "work_experience": [
            {
                "role": "Rear Admiral",
                "company": "US Navy",
                "duration": "1943-1986",
                "description": ["Built the first compiler", "Popularised COBOL"]
            }
        ],
        "education": [
            {"degree": "PhD Mathematics", "institution": "Yale", "graduation_year": 1934}
        ],
        "technical_skills": ["COBOL", "FLOW-MATIC"],
        "soft_skills": ["Leadership"],
        "projects": ["A-0 System"],
        "certifications": [],
        "resume_rating": 9,
        "improvement_areas": "List more recent work.",
        "upskill_suggestions": ["Rust"]
    }"#;
}

#[cfg(test)]
mod tests {
    use super::test_support::{ScriptedModel, VALID_REPLY};
    use super::*;
    use crate::models::resume::NOT_AVAILABLE;

    fn analyzer_with(model: ScriptedModel) -> (ResumeAnalyzer, Arc<ScriptedModel>) {
        let model = Arc::new(model);
        let analyzer = ResumeAnalyzer::new(Some(model.clone() as Arc<dyn LanguageModel>));
        (analyzer, model)
    }

    fn assert_is_placeholder(analysis: &ResumeAnalysis) {
        assert_eq!(analysis.name, NOT_AVAILABLE);
        assert_eq!(analysis.email, NOT_AVAILABLE);
        assert_eq!(analysis.phone, NOT_AVAILABLE);
        assert_eq!(analysis.linkedin_url, NOT_AVAILABLE);
        assert_eq!(analysis.portfolio_url, NOT_AVAILABLE);
        assert!(analysis.work_experience.is_empty());
        assert!(analysis.education.is_empty());
        assert!(analysis.technical_skills.is_empty());
        assert!(analysis.soft_skills.is_empty());
        assert!(analysis.projects.is_empty());
        assert!(analysis.certifications.is_empty());
        assert!(analysis.upskill_suggestions.is_empty());
        assert_eq!(analysis.resume_rating, None);
    }

    #[tokio::test]
    async fn test_without_model_returns_unavailable_fallback() {
        let analyzer = ResumeAnalyzer::from_api_key(None).unwrap();
        assert!(!analyzer.has_model());

        let outcome = analyzer.analyze("anything").await;
        assert!(matches!(
            outcome,
            AnalysisOutcome::Degraded {
                reason: DegradeReason::ModelUnavailable,
                ..
            }
        ));

        let analysis = outcome.into_analysis();
        assert_is_placeholder(&analysis);
        assert_eq!(analysis.summary, UNAVAILABLE_SUMMARY);
        assert_eq!(analysis.improvement_areas, UNAVAILABLE_IMPROVEMENT_AREAS);
    }

    #[tokio::test]
    async fn test_valid_reply_is_parsed() {
        let (analyzer, model) = analyzer_with(ScriptedModel::replying(VALID_REPLY));

        let outcome = analyzer.analyze("Grace Hopper resume").await;
        assert!(outcome.degrade_reason().is_none());

        let analysis = outcome.into_analysis();
        assert_eq!(analysis.name, "Grace Hopper");
        assert_eq!(analysis.linkedin_url, NOT_AVAILABLE);
        assert_eq!(analysis.portfolio_url, NOT_AVAILABLE);
        assert_eq!(analysis.resume_rating.map(|r| r.get()), Some(9));
        assert_eq!(analysis.work_experience[0].description.len(), 2);
        assert_eq!(analysis.education[0].graduation_year, "1934");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1, "exactly one model call");
        assert!(prompts[0].ends_with("Grace Hopper resume"));
    }

    #[tokio::test]
    async fn test_fenced_reply_is_parsed() {
        let fenced = format!("```json\n{VALID_REPLY}\n```");
        let (analyzer, _) = analyzer_with(ScriptedModel::replying(&fenced));
        assert!(analyzer.analyze("text").await.degrade_reason().is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_returns_failed_fallback() {
        let (analyzer, model) = analyzer_with(ScriptedModel::replying("{ not json"));

        let outcome = analyzer.analyze("text").await;
        assert!(matches!(
            outcome,
            AnalysisOutcome::Degraded {
                reason: DegradeReason::Model(LlmError::Parse(_)),
                ..
            }
        ));

        let analysis = outcome.into_analysis();
        assert_is_placeholder(&analysis);
        assert_eq!(analysis.summary, FAILED_SUMMARY);
        assert_eq!(analysis.improvement_areas, FAILED_IMPROVEMENT_AREAS);
        assert_eq!(model.prompts.lock().unwrap().len(), 1, "no retry");
    }

    #[tokio::test]
    async fn test_api_error_returns_failed_fallback() {
        let (analyzer, _) = analyzer_with(ScriptedModel::failing_with_status(403));
        let analysis = analyzer.analyze("text").await.into_analysis();
        assert_eq!(analysis.summary, FAILED_SUMMARY);
    }

    #[tokio::test]
    async fn test_out_of_range_rating_returns_failed_fallback() {
        let reply = VALID_REPLY.replace("\"resume_rating\": 9", "\"resume_rating\": 14");
        let (analyzer, _) = analyzer_with(ScriptedModel::replying(&reply));
        let analysis = analyzer.analyze("text").await.into_analysis();
        assert_eq!(analysis.summary, FAILED_SUMMARY);
        assert_eq!(analysis.resume_rating, None);
    }

    #[tokio::test]
    async fn test_missing_rating_returns_failed_fallback() {
        let reply = VALID_REPLY.replace("\"resume_rating\": 9,", "");
        let (analyzer, _) = analyzer_with(ScriptedModel::replying(&reply));

        let outcome = analyzer.analyze("text").await;
        assert!(matches!(
            outcome,
            AnalysisOutcome::Degraded {
                reason: DegradeReason::MissingRating,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_quoted_rating_is_accepted() {
        let reply = VALID_REPLY.replace("\"resume_rating\": 9", "\"resume_rating\": \"8\"");
        let (analyzer, _) = analyzer_with(ScriptedModel::replying(&reply));

        let outcome = analyzer.analyze("text").await;
        assert!(outcome.degrade_reason().is_none());
        assert_eq!(outcome.into_analysis().resume_rating.map(|r| r.get()), Some(8));
    }

    #[tokio::test]
    async fn test_degrade_reason_describes_fallback() {
        let outcome = ResumeAnalyzer::new(None).analyze("text").await;
        let reason = outcome.degrade_reason().map(ToString::to_string);
        assert_eq!(reason.as_deref(), Some("no language model configured"));

        let (analyzer, _) = analyzer_with(ScriptedModel::failing_with_status(503));
        let outcome = analyzer.analyze("text").await;
        let reason = outcome.degrade_reason().expect("fallback expected");
        assert!(reason.to_string().starts_with("model call failed"));
    }

    #[tokio::test]
    async fn test_missing_improvement_areas_returns_failed_fallback() {
        let reply = VALID_REPLY.replace("\"improvement_areas\": \"List more recent work.\",", "");
        let (analyzer, _) = analyzer_with(ScriptedModel::replying(&reply));
        assert_eq!(analyzer.analyze("text").await.into_analysis().summary, FAILED_SUMMARY);
    }

    #[tokio::test]
    async fn test_empty_resume_text_still_calls_model() {
        let (analyzer, model) = analyzer_with(ScriptedModel::replying(VALID_REPLY));
        assert!(analyzer.analyze("").await.degrade_reason().is_none());
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
    }
}
