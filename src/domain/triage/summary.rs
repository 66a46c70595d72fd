//! Structured summary of what has been learned about a problem.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{CategoryId, Priority};

/// Suggested category with the confidence it was chosen with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: Option<String>,
    pub confidence: f64,
}

/// What the classifier extracted from the conversation so far.
///
/// `category` is legitimately absent for vague messages and must not be
/// replaced by a default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub category: Option<CategorySummary>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub extracted_info: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub missing_info: Vec<String>,
    #[serde(default)]
    pub clarification_question: Option<String>,
    #[serde(default)]
    pub original_message: String,
}

impl AnalysisSummary {
    /// Confidence of the suggested category, zero when there is none.
    pub fn confidence(&self) -> f64 {
        self.category.as_ref().map(|c| c.confidence).unwrap_or(0.0)
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category.as_ref().map(|c| c.id)
    }

    /// Multi-line rendering used in confirmation prompts.
    pub fn format_display(&self) -> String {
        let mut parts = Vec::new();

        if let Some(name) = self.category.as_ref().and_then(|c| c.name.as_deref()) {
            parts.push(format!("📋 **Catégorie** : {}", name));
        }
        if let Some(priority) = self.priority {
            parts.push(format!("🎯 **Priorité** : {}", priority.label()));
        }
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            parts.push(format!("📝 **Titre** : {}", title));
        }
        if !self.symptoms.is_empty() {
            parts.push("\n**Symptômes identifiés** :".to_string());
            for symptom in &self.symptoms {
                parts.push(format!("  • {}", symptom));
            }
        }

        if parts.is_empty() {
            "Informations en cours d'analyse...".to_string()
        } else {
            parts.join("\n")
        }
    }

    /// Applies user edits. Only the title and the symptom list can change.
    pub fn apply(&mut self, modifications: &SummaryModifications) {
        if let Some(title) = &modifications.title {
            self.title = Some(title.clone());
        }
        if let Some(symptoms) = &modifications.symptoms {
            self.symptoms = symptoms.clone();
        }
    }
}

/// User edits accepted on a summary.
///
/// Unknown keys (priority, category, confidence, ...) are rejected when the
/// payload is decoded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryModifications {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Vec<String>>,
}

impl SummaryModifications {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            symptoms: None,
        }
    }

    pub fn symptoms(symptoms: Vec<String>) -> Self {
        Self {
            title: None,
            symptoms: Some(symptoms),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.symptoms.is_none()
    }

    /// Decodes an untyped payload, rejecting any non-whitelisted key.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Formats an extracted value for display; `None` for empty values.
pub fn display_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(false) => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) if items.is_empty() => None,
        serde_json::Value::Array(items) => Some(
            items
                .iter()
                .filter_map(display_value)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}
