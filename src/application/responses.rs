//! Response payloads returned by the triage workflow.
//!
//! These are the shapes a transport serialises as-is: an analysis still in
//! progress, a created ticket, or an error.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Priority, SessionId, TicketId, Timestamp};
use crate::domain::ticket::{Ticket, TicketStatus};
use crate::domain::triage::{
    AnalysisSummary, GuidedChoice, Suggestions, TriageAction, TriageError, GREETING_MESSAGE,
    NON_IT_MESSAGE,
};

const ANALYSIS_TYPE: &str = "analysis";
const ERROR_TYPE: &str = "error";

/// Why a set of guided choices was offered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionMetadata {
    pub reasoning: String,
    pub should_regenerate: bool,
    pub regeneration_reason: Option<String>,
    pub relevance_score: f64,
}

impl From<&Suggestions> for SuggestionMetadata {
    fn from(suggestions: &Suggestions) -> Self {
        Self {
            reasoning: suggestions.reasoning.clone(),
            should_regenerate: suggestions.should_regenerate,
            regeneration_reason: suggestions.regeneration_reason.clone(),
            relevance_score: suggestions.relevance_score,
        }
    }
}

/// Analysis still in progress: the user has to answer before a ticket exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(rename = "type")]
    pub response_type: String,
    pub action: TriageAction,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<AnalysisSummary>,
    pub clarification_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guided_choices: Option<Vec<GuidedChoice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_metadata: Option<SuggestionMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_examples: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

impl AnalysisResponse {
    /// Bare response for `action`, without session.
    pub fn new(action: TriageAction, message: impl Into<String>) -> Self {
        Self {
            session_id: None,
            response_type: ANALYSIS_TYPE.to_string(),
            action,
            message: message.into(),
            summary: None,
            clarification_attempts: 0,
            guided_choices: None,
            suggestion_metadata: None,
            show_examples: None,
            expires_at: None,
        }
    }

    pub fn greeting() -> Self {
        let mut response = Self::new(TriageAction::Greeting, GREETING_MESSAGE);
        response.show_examples = Some(true);
        response
    }

    pub fn non_it() -> Self {
        Self::new(TriageAction::NonIt, NON_IT_MESSAGE)
    }

    pub fn with_session(
        mut self,
        session_id: SessionId,
        expires_at: Timestamp,
        attempts: u32,
    ) -> Self {
        self.session_id = Some(session_id);
        self.expires_at = Some(expires_at);
        self.clarification_attempts = attempts;
        self
    }

    pub fn with_summary(mut self, summary: Option<AnalysisSummary>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_choices(mut self, choices: Vec<GuidedChoice>) -> Self {
        self.guided_choices = Some(choices);
        self
    }

    pub fn with_suggestions(mut self, suggestions: Suggestions) -> Self {
        self.suggestion_metadata = Some(SuggestionMetadata::from(&suggestions));
        self.guided_choices = Some(suggestions.choices);
        self
    }
}

/// A ticket now exists; the conversation is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCreatedResponse {
    pub ticket_id: TicketId,
    pub ticket_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ticket_id: Option<i64>,
    pub title: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub category_name: Option<String>,
    pub created_at: Timestamp,
    pub ready_for_l1: bool,
    pub synced_to_external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_to_human: Option<bool>,
    pub message: String,
}

impl TicketCreatedResponse {
    pub fn from_ticket(
        ticket: &Ticket,
        category_name: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ticket_id: *ticket.id(),
            ticket_number: ticket.number().to_string(),
            external_ticket_id: ticket.external_id(),
            title: ticket.title().to_string(),
            status: ticket.status(),
            priority: ticket.priority(),
            category_name,
            created_at: *ticket.created_at(),
            ready_for_l1: ticket.ready_for_l1(),
            synced_to_external: ticket.synced_to_external(),
            escalated_to_human: None,
            message: message.into(),
        }
    }

    pub fn escalated(mut self) -> Self {
        self.escalated_to_human = Some(true);
        self
    }
}

/// User-facing rendering of a [`TriageError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    pub message: String,
    pub error_code: String,
}

impl From<&TriageError> for ErrorResponse {
    fn from(err: &TriageError) -> Self {
        Self {
            response_type: ERROR_TYPE.to_string(),
            message: err.message(),
            error_code: err.code().to_string(),
        }
    }
}

/// Successful outcome of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriageResult {
    TicketCreated(TicketCreatedResponse),
    Analysis(AnalysisResponse),
}

impl TriageResult {
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            TriageResult::Analysis(analysis) => analysis.session_id,
            TriageResult::TicketCreated(_) => None,
        }
    }

    pub fn action(&self) -> Option<TriageAction> {
        match self {
            TriageResult::Analysis(analysis) => Some(analysis.action),
            TriageResult::TicketCreated(_) => None,
        }
    }

    pub fn as_analysis(&self) -> Option<&AnalysisResponse> {
        match self {
            TriageResult::Analysis(analysis) => Some(analysis),
            TriageResult::TicketCreated(_) => None,
        }
    }

    pub fn as_ticket(&self) -> Option<&TicketCreatedResponse> {
        match self {
            TriageResult::TicketCreated(ticket) => Some(ticket),
            TriageResult::Analysis(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TriageResult::Analysis(analysis) => &analysis.message,
            TriageResult::TicketCreated(ticket) => &ticket.message,
        }
    }
}

impl From<AnalysisResponse> for TriageResult {
    fn from(response: AnalysisResponse) -> Self {
        TriageResult::Analysis(response)
    }
}

impl From<TicketCreatedResponse> for TriageResult {
    fn from(response: TicketCreatedResponse) -> Self {
        TriageResult::TicketCreated(response)
    }
}

/// Whatever a turn produced, errors included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriageReply {
    Error(ErrorResponse),
    Result(TriageResult),
}

impl TriageReply {
    pub fn is_error(&self) -> bool {
        matches!(self, TriageReply::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            TriageReply::Error(err) => &err.message,
            TriageReply::Result(result) => result.message(),
        }
    }
}
