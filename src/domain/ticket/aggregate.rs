//! Ticket aggregate.
//!
//! A ticket is created exactly once per converted session and is never
//! mutated by the triage workflow afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{TicketNumber, ValidationMethod};
use crate::domain::foundation::{
    CategoryId, DomainError, Priority, TicketId, Timestamp, UserId, ValidationError,
};

/// Maximum stored title length, in characters.
pub const MAX_TICKET_TITLE_LENGTH: usize = 200;

/// Ticket lifecycle status. Only `Open` is produced here; the others come
/// back from the external system's own workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown ticket status '{}'", other),
            )),
        }
    }
}

/// Reference to the copy held by the external ticket-of-record system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub external_id: i64,
    pub synced_at: Timestamp,
}

/// Everything needed to create a ticket, before a number is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub original_message: String,
    pub priority: Priority,
    pub category_id: Option<CategoryId>,
    pub created_by: Option<UserId>,
    pub confidence: f64,
    pub symptoms: Vec<String>,
    pub validation_method: ValidationMethod,
    /// False when the ticket skips first-level support.
    pub ready_for_l1: bool,
    pub external: Option<ExternalLink>,
}

/// Ticket aggregate.
///
/// # Invariants
///
/// - `title` is non-empty and at most 200 characters
/// - `confidence` is within [0, 1]
/// - `synced_to_external` iff `external` is present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    number: TicketNumber,
    title: String,
    description: String,
    original_message: String,
    status: TicketStatus,
    priority: Priority,
    category_id: Option<CategoryId>,
    created_by: Option<UserId>,
    confidence: f64,
    symptoms: Vec<String>,
    validation_method: ValidationMethod,
    ready_for_l1: bool,
    external: Option<ExternalLink>,
    created_at: Timestamp,
}

impl Ticket {
    /// Create an open ticket from a draft.
    ///
    /// The title is truncated to the storage limit; a blank one is rejected.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the title is blank or confidence is out of range
    pub fn create(
        id: TicketId,
        number: TicketNumber,
        draft: NewTicket,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title", "Ticket title cannot be empty"));
        }
        if !(0.0..=1.0).contains(&draft.confidence) {
            return Err(DomainError::validation(
                "confidence",
                format!("Confidence must be within [0, 1], got {}", draft.confidence),
            ));
        }

        Ok(Self {
            id,
            number,
            title: title.chars().take(MAX_TICKET_TITLE_LENGTH).collect(),
            description: draft.description,
            original_message: draft.original_message,
            status: TicketStatus::Open,
            priority: draft.priority,
            category_id: draft.category_id,
            created_by: draft.created_by,
            confidence: draft.confidence,
            symptoms: draft.symptoms,
            validation_method: draft.validation_method,
            ready_for_l1: draft.ready_for_l1,
            external: draft.external,
            created_at,
        })
    }

    /// Reconstitute a ticket from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TicketId,
        number: TicketNumber,
        title: String,
        description: String,
        original_message: String,
        status: TicketStatus,
        priority: Priority,
        category_id: Option<CategoryId>,
        created_by: Option<UserId>,
        confidence: f64,
        symptoms: Vec<String>,
        validation_method: ValidationMethod,
        ready_for_l1: bool,
        external: Option<ExternalLink>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            number,
            title,
            description,
            original_message,
            status,
            priority,
            category_id,
            created_by,
            confidence,
            symptoms,
            validation_method,
            ready_for_l1,
            external,
            created_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the ticket ID.
    pub fn id(&self) -> &TicketId {
        &self.id
    }

    /// Returns the human-facing ticket number.
    pub fn number(&self) -> &TicketNumber {
        &self.number
    }

    /// Returns the ticket title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the generated description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the user's own words.
    pub fn original_message(&self) -> &str {
        &self.original_message
    }

    /// Returns the ticket status.
    pub fn status(&self) -> TicketStatus {
        self.status
    }

    /// Returns the priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the category, if classified.
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    /// Returns the reporting user.
    pub fn created_by(&self) -> Option<&UserId> {
        self.created_by.as_ref()
    }

    /// Returns the classification confidence.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Returns the extracted symptoms.
    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    /// Returns how the ticket was validated.
    pub fn validation_method(&self) -> ValidationMethod {
        self.validation_method
    }

    /// Returns whether first-level support can pick the ticket up.
    pub fn ready_for_l1(&self) -> bool {
        self.ready_for_l1
    }

    /// Returns the external system's ticket id.
    pub fn external_id(&self) -> Option<i64> {
        self.external.as_ref().map(|e| e.external_id)
    }

    /// Returns when the external copy was created.
    pub fn external_synced_at(&self) -> Option<&Timestamp> {
        self.external.as_ref().map(|e| &e.synced_at)
    }

    /// Returns whether the external copy exists.
    pub fn synced_to_external(&self) -> bool {
        self.external.is_some()
    }

    /// Returns when the ticket was created.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewTicket {
        NewTicket {
            title: "Mot de passe oublié".to_string(),
            description: "desc".to_string(),
            original_message: "j'ai oublié mon mot de passe".to_string(),
            priority: Priority::Medium,
            category_id: Some(CategoryId::new(10)),
            created_by: None,
            confidence: 0.99,
            symptoms: vec!["Connexion impossible".to_string()],
            validation_method: ValidationMethod::AutoValidate,
            ready_for_l1: true,
            external: None,
        }
    }

    fn number() -> TicketNumber {
        TicketNumber::next(2025, None)
    }

    #[test]
    fn create_opens_ticket() {
        let ticket = Ticket::create(TicketId::new(), number(), draft(), Timestamp::now()).unwrap();
        assert_eq!(ticket.status(), TicketStatus::Open);
        assert_eq!(ticket.number().to_string(), "TKT-2025-00001");
        assert!(!ticket.synced_to_external());
        assert_eq!(ticket.external_id(), None);
    }

    #[test]
    fn create_truncates_long_titles() {
        let mut d = draft();
        d.title = "x".repeat(300);
        let ticket = Ticket::create(TicketId::new(), number(), d, Timestamp::now()).unwrap();
        assert_eq!(ticket.title().chars().count(), MAX_TICKET_TITLE_LENGTH);
    }

    #[test]
    fn create_rejects_blank_title() {
        let mut d = draft();
        d.title = "  ".to_string();
        assert!(Ticket::create(TicketId::new(), number(), d, Timestamp::now()).is_err());
    }

    #[test]
    fn create_rejects_out_of_range_confidence() {
        let mut d = draft();
        d.confidence = 1.5;
        assert!(Ticket::create(TicketId::new(), number(), d, Timestamp::now()).is_err());
    }

    #[test]
    fn external_link_marks_ticket_synced() {
        let mut d = draft();
        d.external = Some(ExternalLink {
            external_id: 4242,
            synced_at: Timestamp::now(),
        });
        let ticket = Ticket::create(TicketId::new(), number(), d, Timestamp::now()).unwrap();
        assert!(ticket.synced_to_external());
        assert_eq!(ticket.external_id(), Some(4242));
    }

    #[test]
    fn status_parses_storage_names() {
        assert_eq!("open".parse::<TicketStatus>().unwrap(), TicketStatus::Open);
        assert!("nope".parse::<TicketStatus>().is_err());
    }
}
