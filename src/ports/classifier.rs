//! Classifier Port - Turns a problem report into a scored analysis.
//!
//! The orchestrator depends only on this trait; one adapter exists per
//! classification backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::AIError;
use crate::domain::catalog::Category;
use crate::domain::foundation::{CategoryId, Priority, SessionId};
use crate::domain::triage::{AnalysisSummary, CategorySummary, TopicDomain, TriageError};

/// Maximum title length kept from a classifier answer.
pub const MAX_RECORD_TITLE_LENGTH: usize = 80;

/// Maximum number of symptoms kept from a classifier answer.
pub const MAX_RECORD_SYMPTOMS: usize = 5;

/// Port for problem classification.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one message against the candidate leaf categories.
    ///
    /// # Errors
    ///
    /// - `NoCategories` if `request.candidates` is empty
    /// - `Decode` if the backend answered with malformed output (not retried)
    /// - `Exhausted` once every retry failed
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<AnalysisRecord, ClassifierError>;
}

/// Inputs of one classification call.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub message: String,
    /// Active leaf categories only.
    pub candidates: Vec<Category>,
    pub attempt: u32,
    /// Findings of the previous turn, so re-analysis keeps them.
    pub prior_analysis: Option<AnalysisSummary>,
    pub context_hint: Option<TopicDomain>,
    pub parent_session_id: Option<SessionId>,
}

impl ClassificationRequest {
    pub fn new(message: impl Into<String>, candidates: Vec<Category>) -> Self {
        Self {
            message: message.into(),
            candidates,
            attempt: 0,
            prior_analysis: None,
            context_hint: None,
            parent_session_id: None,
        }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn with_prior_analysis(mut self, prior: Option<AnalysisSummary>) -> Self {
        self.prior_analysis = prior;
        self
    }

    pub fn with_context_hint(mut self, hint: Option<TopicDomain>) -> Self {
        self.context_hint = hint;
        self
    }

    pub fn with_parent_session(mut self, parent: Option<SessionId>) -> Self {
        self.parent_session_id = parent;
        self
    }

    /// True when the effective input differs from the raw message text.
    pub fn has_context(&self) -> bool {
        self.prior_analysis.is_some() || self.context_hint.is_some()
    }
}

/// Canonical, validated classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub category_id: Option<CategoryId>,
    pub confidence: f64,
    pub title: String,
    pub symptoms: Vec<String>,
    pub priority: Priority,
    #[serde(default)]
    pub extracted_info: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub missing_info: Vec<String>,
    #[serde(default)]
    pub clarification_question: Option<String>,
}

impl AnalysisRecord {
    /// Builds the session summary, resolving the category name from `categories`.
    pub fn to_summary(&self, categories: &[Category], original_message: &str) -> AnalysisSummary {
        let category = self.category_id.map(|id| CategorySummary {
            id,
            name: categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.name.clone()),
            confidence: self.confidence,
        });

        AnalysisSummary {
            category,
            priority: Some(self.priority),
            title: Some(self.title.clone()).filter(|t| !t.is_empty()),
            symptoms: self.symptoms.clone(),
            extracted_info: self.extracted_info.clone(),
            missing_info: self.missing_info.clone(),
            clarification_question: self.clarification_question.clone(),
            original_message: original_message.to_string(),
        }
    }
}

/// Classifier errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifierError {
    /// Backend call failed.
    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    /// Backend answered, but not with a valid analysis.
    #[error("malformed classifier output: {0}")]
    Decode(String),

    /// Every attempt failed.
    #[error("classification failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// Nothing to classify against.
    #[error("no candidate categories")]
    NoCategories,
}

impl ClassifierError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// True if another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifierError::Provider(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<ClassifierError> for TriageError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::NoCategories => TriageError::CategoryUnavailable,
            other => TriageError::ClassificationFailure(other.to_string()),
        }
    }
}
