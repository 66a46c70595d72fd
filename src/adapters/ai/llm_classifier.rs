//! LLM-backed implementation of the Classifier port.
//!
//! Builds the prompt, calls the `AIProvider` under a `RetryPolicy`, and
//! decodes the strict JSON answer into an `AnalysisRecord`.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::RetryPolicy;
use crate::domain::catalog::Category;
use crate::domain::foundation::{CategoryId, Priority};
use crate::domain::ticket::UNTITLED_TICKET;
use crate::ports::{
    AIError, AIProvider, AnalysisRecord, ClassificationCache, ClassificationRequest, Classifier,
    ClassifierError, CompletionRequest, MessageRole, RequestMetadata, MAX_RECORD_SYMPTOMS,
    MAX_RECORD_TITLE_LENGTH,
};

const SYSTEM_PROMPT: &str = "Tu es un assistant IT expert qui analyse des demandes de support. \
Réponds UNIQUEMENT avec un objet JSON, sans markdown ni texte autour.\n\n\
Format attendu :\n\
{\n\
  \"category_id\": <ID d'une catégorie listée, ou null si impossible à déterminer>,\n\
  \"confidence_score\": <nombre entre 0.00 et 1.00>,\n\
  \"title\": \"<titre court, 80 caractères max>\",\n\
  \"symptoms\": [\"<2 à 5 symptômes>\"],\n\
  \"priority\": \"<low|medium|high|critical>\",\n\
  \"extracted_info\": {\"<clé>\": \"<valeur>\"},\n\
  \"missing_info\": [\"<information manquante>\"],\n\
  \"clarification_question\": \"<une seule question, ou null>\"\n\
}\n\n\
Barème de confiance :\n\
- 0.98 à 1.00 : problème précis, catégorie évidente, aucune information manquante\n\
- 0.70 à 0.97 : catégorie claire, quelques détails manquants\n\
- 0.40 à 0.69 : plusieurs catégories possibles, poser une question ciblée\n\
- moins de 0.40 : message trop vague, category_id peut être null";

/// Tunables of the LLM classifier.
#[derive(Debug, Clone)]
pub struct LlmClassifierConfig {
    pub retry: RetryPolicy,
    pub temperature: f32,
    pub max_tokens: u32,
    pub cache_ttl: Duration,
}

impl Default for LlmClassifierConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            temperature: 0.3,
            max_tokens: 800,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Classifier that prompts an LLM for a JSON analysis.
pub struct LlmClassifier {
    provider: Arc<dyn AIProvider>,
    cache: Option<Arc<dyn ClassificationCache>>,
    config: LlmClassifierConfig,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn AIProvider>, config: LlmClassifierConfig) -> Self {
        Self {
            provider,
            cache: None,
            config,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ClassificationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Cache key: SHA-256 of the normalised message and the attempt number.
    pub fn cache_key(message: &str, attempt: u32) -> String {
        let normalized = message
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hasher.update(b"\n");
        hasher.update(attempt.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn build_prompt(request: &ClassificationRequest) -> String {
        let categories = request
            .candidates
            .iter()
            .map(|c| {
                format!(
                    "- ID: {}, Nom: {}, Abbr: {}",
                    c.id,
                    c.name,
                    c.abbreviation.as_deref().unwrap_or("-")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut prompt = format!(
            "MESSAGE UTILISATEUR :\n\"{}\"\n\nCATÉGORIES DISPONIBLES :\n{}\n\nTENTATIVE DE CLARIFICATION : {}",
            request.message, categories, request.attempt
        );

        if let Some(domain) = request.context_hint {
            prompt.push_str(&format!(
                "\n\nCONTEXTE DÉTECTÉ : {} (domaine {})",
                domain.topic_label(),
                domain.as_name()
            ));
        }

        if let Some(prior) = &request.prior_analysis {
            if let Ok(json) = serde_json::to_string(prior) {
                prompt.push_str(&format!(
                    "\n\nANALYSE PRÉCÉDENTE (à compléter, ne pas oublier) :\n{}",
                    json
                ));
            }
        }

        prompt
    }

    fn completion_request(&self, request: &ClassificationRequest) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(
            request.parent_session_id,
            request.attempt,
            format!("classify-{}", request.attempt),
        ))
        .with_system_prompt(SYSTEM_PROMPT)
        .with_message(MessageRole::User, Self::build_prompt(request))
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens)
        .with_json_mode()
    }

    async fn call_with_retry(
        &self,
        request: &ClassificationRequest,
    ) -> Result<AnalysisRecord, ClassifierError> {
        let policy = &self.config.retry;
        let completion = self.completion_request(request);
        let mut last_error: Option<ClassifierError> = None;

        for attempt in 1..=policy.max_attempts {
            let outcome = match timeout(
                policy.attempt_timeout,
                self.provider.complete(completion.clone()),
            )
            .await
            {
                Ok(result) => result.map_err(ClassifierError::Provider),
                Err(_) => Err(ClassifierError::Provider(AIError::Timeout {
                    timeout_secs: policy.attempt_timeout.as_secs() as u32,
                })),
            };

            match outcome.and_then(|response| decode_analysis(&response.content, &request.candidates)) {
                Ok(record) => return Ok(record),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    if policy.has_attempts_after(attempt) {
                        let delay = policy.backoff(attempt - 1);
                        warn!(
                            attempt = attempt,
                            max_attempts = policy.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Retrying classification"
                        );
                        sleep(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        Err(ClassifierError::Exhausted {
            attempts: policy.max_attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<AnalysisRecord, ClassifierError> {
        if request.candidates.is_empty() {
            return Err(ClassifierError::NoCategories);
        }

        let cache = self.cache.as_ref().filter(|_| !request.has_context());
        let key = Self::cache_key(&request.message, request.attempt);

        if let Some(cache) = cache {
            match cache.get(&key).await {
                Ok(Some(record)) => {
                    debug!(attempt = request.attempt, "Classification served from cache");
                    return Ok(record);
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "Classification cache read failed"),
            }
        }

        let record = self.call_with_retry(request).await?;

        if let Some(cache) = cache {
            if let Err(err) = cache.put(&key, &record, self.config.cache_ttl).await {
                warn!(error = %err, "Classification cache write failed");
            }
        }

        Ok(record)
    }
}

// ----- Wire format -----

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    category_id: Option<serde_json::Value>,
    #[serde(alias = "confidence")]
    confidence_score: f64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    symptoms: Vec<String>,
    priority: String,
    #[serde(default)]
    extracted_info: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    missing_info: Option<Vec<String>>,
    #[serde(default)]
    clarification_question: Option<String>,
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn parse_category_id(value: &serde_json::Value) -> Result<Option<CategoryId>, ClassifierError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(|id| Some(CategoryId::new(id)))
            .ok_or_else(|| ClassifierError::decode(format!("category_id {} is not an integer", n))),
        serde_json::Value::String(s) if s.trim().is_empty() || s == "null" => Ok(None),
        serde_json::Value::String(s) => s
            .parse::<CategoryId>()
            .map(Some)
            .map_err(|_| ClassifierError::decode(format!("category_id '{}' is not an integer", s))),
        other => Err(ClassifierError::decode(format!(
            "category_id has unexpected type: {}",
            other
        ))),
    }
}

/// Decodes and validates a classifier answer.
///
/// Malformed output is a hard failure: nothing is defaulted except the
/// optional collections and an absent title.
pub(crate) fn decode_analysis(
    content: &str,
    candidates: &[Category],
) -> Result<AnalysisRecord, ClassifierError> {
    let raw: RawAnalysis = serde_json::from_str(strip_code_fences(content))
        .map_err(|e| ClassifierError::decode(format!("invalid JSON: {}", e)))?;

    if !(0.0..=1.0).contains(&raw.confidence_score) || raw.confidence_score.is_nan() {
        return Err(ClassifierError::decode(format!(
            "confidence_score {} outside [0, 1]",
            raw.confidence_score
        )));
    }

    let priority: Priority = raw
        .priority
        .parse()
        .map_err(|e| ClassifierError::decode(format!("{}", e)))?;

    let category_id = match raw.category_id.as_ref() {
        Some(value) => parse_category_id(value)?,
        None => None,
    };
    if let Some(id) = category_id {
        if !candidates.iter().any(|c| c.id == id) {
            return Err(ClassifierError::decode(format!(
                "category_id {} is not a candidate category",
                id
            )));
        }
    }

    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED_TICKET.to_string())
        .chars()
        .take(MAX_RECORD_TITLE_LENGTH)
        .collect();

    let mut symptoms: Vec<String> = raw
        .symptoms
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    symptoms.truncate(MAX_RECORD_SYMPTOMS);

    Ok(AnalysisRecord {
        category_id,
        confidence: raw.confidence_score,
        title,
        symptoms,
        priority,
        extracted_info: raw.extracted_info.unwrap_or_default(),
        missing_info: raw.missing_info.unwrap_or_default(),
        clarification_question: raw
            .clarification_question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty()),
    })
}
