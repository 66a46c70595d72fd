//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Classification Ports
//!
//! - `AIProvider` - Raw completion call to an LLM backend
//! - `Classifier` - Scored analysis of a problem report
//! - `ClassificationCache` - Short-lived memo of classifier answers
//!
//! ## Persistence Ports
//!
//! - `SessionRepository` - Analysis sessions
//! - `TicketRepository` - Tickets, with atomic session conversion
//! - `CategoryCatalog` - Read-only category tree
//! - `UserDirectory` - User lookup by email
//!
//! ## Integration Ports
//!
//! - `ExternalTicketing` - Helpdesk ticket-of-record system

mod ai_provider;
mod category_catalog;
mod classification_cache;
mod classifier;
mod external_ticketing;
mod session_repository;
mod ticket_repository;
mod user_directory;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use category_catalog::CategoryCatalog;
pub use classification_cache::ClassificationCache;
pub use classifier::{
    AnalysisRecord, ClassificationRequest, Classifier, ClassifierError, MAX_RECORD_SYMPTOMS,
    MAX_RECORD_TITLE_LENGTH,
};
pub use external_ticketing::{ExternalTicket, ExternalTicketing, ExternalTicketingError};
pub use session_repository::SessionRepository;
pub use ticket_repository::TicketRepository;
pub use user_directory::UserDirectory;
